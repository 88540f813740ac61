pub mod billing;
pub mod retry;
pub mod workflows;

use anyhow::{Context, Result};
use octocrab::Octocrab;

/// Build a GitHub client authenticated with the action's token. The runner
/// points `GITHUB_API_URL` at the API root, which differs on GHES.
pub fn build_client(token: &str) -> Result<Octocrab> {
    let mut builder = Octocrab::builder().personal_token(token.to_string());
    if let Ok(base_uri) = std::env::var("GITHUB_API_URL") {
        builder = builder
            .base_uri(base_uri.as_str())
            .with_context(|| format!("Invalid GITHUB_API_URL '{base_uri}'"))?;
    }
    builder.build().context("Failed to create GitHub client")
}
