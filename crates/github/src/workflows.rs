use std::sync::Arc;

use actions_metrics_core::models::{Workflow, WorkflowBilling, WorkflowUsage};
use anyhow::{Context, Result};
use octocrab::Octocrab;
use tokio::{sync::Semaphore, task::JoinSet};

use crate::retry::RetryPolicy;

/// Per-repository fan-out concurrency. GitHub's secondary rate limits start
/// rejecting requests well above this.
const MAX_CONCURRENT_FETCHES: usize = 10;

#[derive(serde::Serialize)]
struct PageParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    per_page: Option<u8>,
}

#[derive(serde::Deserialize)]
struct WorkflowList {
    workflows: Vec<Workflow>,
}

/// Fetch billable time for every active workflow in `owner/repo`. The listing
/// and each timing call retry independently, but a single call that exhausts
/// its retries fails the whole collection.
pub async fn fetch_workflow_billing(
    client: &Octocrab,
    owner: &str,
    repo: &str,
    policy: &RetryPolicy,
) -> Result<Vec<WorkflowBilling>> {
    let workflows = policy
        .run("Workflow listing", || list_workflows(client, owner, repo))
        .await
        .context("Failed to list workflows")?;
    let active = active_workflows(workflows);
    tracing::info!("Found {} active workflows in {}/{}", active.len(), owner, repo);

    let policy = *policy;
    collect_workflow_billing(active, |workflow| {
        let client = client.clone();
        let owner = owner.to_string();
        let repo = repo.to_string();
        let workflow_id = workflow.id;
        let name = workflow.name.clone();
        async move {
            policy
                .run(&format!("Timing for workflow {name}"), || {
                    fetch_workflow_usage(&client, &owner, &repo, workflow_id)
                })
                .await
        }
    })
    .await
}

fn active_workflows(workflows: Vec<Workflow>) -> Vec<Workflow> {
    workflows.into_iter().filter(Workflow::is_active).collect()
}

/// Run one timing fetch per workflow, at most [`MAX_CONCURRENT_FETCHES`] in
/// flight. Every task is drained even after a failure, and the pairs come
/// back in completion order.
async fn collect_workflow_billing<F, Fut>(
    workflows: Vec<Workflow>,
    mut fetch: F,
) -> Result<Vec<WorkflowBilling>>
where
    F: FnMut(&Workflow) -> Fut,
    Fut: Future<Output = Result<WorkflowUsage>> + Send + 'static,
{
    struct TaskResult {
        workflow: Workflow,
        result: Result<WorkflowUsage>,
    }
    let sem = Arc::new(Semaphore::new(MAX_CONCURRENT_FETCHES));
    let mut set = JoinSet::new();
    for workflow in workflows {
        let sem = sem.clone();
        let fut = fetch(&workflow);
        set.spawn(async move {
            let _permit = sem.acquire().await.unwrap();
            TaskResult { workflow, result: fut.await }
        });
    }

    let mut billing = Vec::new();
    let mut failure = None;
    while let Some(join_result) = set.join_next().await {
        match join_result {
            Ok(TaskResult { workflow, result: Ok(usage) }) => {
                tracing::debug!("Fetched timing for workflow {} ({})", workflow.name, workflow.id);
                billing.push(WorkflowBilling { workflow, usage });
            }
            Ok(TaskResult { workflow, result: Err(error) }) => {
                tracing::error!(
                    "Failed to fetch timing for workflow {} ({}): {:?}",
                    workflow.name,
                    workflow.id,
                    error
                );
                failure.get_or_insert(error);
            }
            Err(error) => {
                tracing::error!("Workflow timing task failed: {:?}", error);
                failure.get_or_insert(anyhow::anyhow!(error));
            }
        }
    }
    match failure {
        Some(error) => Err(error).context("Failed to fetch workflow billing"),
        None => Ok(billing),
    }
}

async fn list_workflows(client: &Octocrab, owner: &str, repo: &str) -> Result<Vec<Workflow>> {
    let response: WorkflowList = client
        .get(
            format!("/repos/{owner}/{repo}/actions/workflows"),
            Some(&PageParams { per_page: Some(100) }),
        )
        .await?;
    Ok(response.workflows)
}

async fn fetch_workflow_usage(
    client: &Octocrab,
    owner: &str,
    repo: &str,
    workflow_id: u64,
) -> Result<WorkflowUsage> {
    Ok(client
        .get(format!("/repos/{owner}/{repo}/actions/workflows/{workflow_id}/timing"), None::<&()>)
        .await?)
}
