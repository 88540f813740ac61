use std::fs;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::models::WorkflowRunPayload;

/// Event payload delivered by the runner. Only the embedded workflow run is
/// consumed, everything else is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPayload {
    #[serde(default)]
    pub workflow_run: Option<WorkflowRunPayload>,
}

/// Context of the triggering event, read from the runner environment.
#[derive(Debug, Clone)]
pub struct ActionContext {
    pub event_name: String,
    pub owner: String,
    pub repo: String,
    pub payload: EventPayload,
}

impl ActionContext {
    pub fn from_env() -> Result<Self> {
        let event_name =
            std::env::var("GITHUB_EVENT_NAME").context("GITHUB_EVENT_NAME is not set")?;
        let repository =
            std::env::var("GITHUB_REPOSITORY").context("GITHUB_REPOSITORY is not set")?;
        let (owner, repo) = split_repository(&repository)?;
        let payload = match std::env::var("GITHUB_EVENT_PATH") {
            Ok(path) => {
                let data = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read event payload at {path}"))?;
                serde_json::from_str(&data)
                    .with_context(|| format!("Failed to parse event payload at {path}"))?
            }
            Err(_) => EventPayload::default(),
        };
        Ok(Self { event_name, owner, repo, payload })
    }

    /// The `owner/repo` slug of the current repository.
    pub fn repository(&self) -> String { format!("{}/{}", self.owner, self.repo) }
}

fn split_repository(repository: &str) -> Result<(String, String)> {
    let (owner, repo) = repository
        .split_once('/')
        .filter(|(owner, repo)| !owner.is_empty() && !repo.is_empty())
        .with_context(|| format!("Malformed GITHUB_REPOSITORY '{repository}'"))?;
    Ok((owner.to_string(), repo.to_string()))
}
