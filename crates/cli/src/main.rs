use actions_metrics_core::{config::Config, context::ActionContext, models::WorkflowRun};
use actions_metrics_datadog::{DatadogClient, Series, metrics};
use actions_metrics_github::{billing, retry::RetryPolicy, workflows};
use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::builder()
        // Default to info level
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .init();

    let config = Config::from_env().context("Failed to resolve action inputs")?;
    let context = ActionContext::from_env().context("Failed to read event context")?;
    tracing::info!("Processing {} event for {}", context.event_name, context.repository());

    let policy = RetryPolicy::default();
    let client = actions_metrics_github::build_client(&config.github_token)?;
    let repository = context.repository();

    let run_metrics = async {
        if !config.enable_workflow_metrics {
            return Ok(());
        }
        let Some(payload) = context.payload.workflow_run.as_ref() else {
            tracing::warn!(
                "No workflow run in the {} event payload, skipping run metrics",
                context.event_name
            );
            return Ok(());
        };
        let run = WorkflowRun::from_payload(payload)?;
        tracing::info!(
            "Workflow run {} #{} took {:.1}s ({}, {})",
            run.name,
            run.run_number,
            run.duration_seconds(),
            run.status.as_str(),
            run.conclusion.map_or("no conclusion", |c| c.as_str())
        );
        submit(&config, metrics::workflow_run_series(&run, &repository)).await
    };

    let account_billing = async {
        if !config.enable_billing_metrics {
            return Ok(());
        }
        let billing = billing::fetch_account_billing(&client, &context.owner, &policy).await?;
        tracing::info!(
            "Account {} ({}) has used {} of {} included minutes",
            context.owner,
            billing.account_type(),
            billing.usage().total_minutes_used,
            billing.usage().included_minutes
        );
        let series =
            metrics::account_billing_series(&billing, &context.owner, Utc::now().timestamp());
        submit(&config, series).await
    };

    let workflows_billing = async {
        if !config.enable_repository_workflows_billing_metrics {
            return Ok(());
        }
        let billing =
            workflows::fetch_workflow_billing(&client, &context.owner, &context.repo, &policy)
                .await?;
        let series =
            metrics::workflow_billing_series(&billing, &repository, Utc::now().timestamp());
        submit(&config, series).await
    };

    // The collection paths are independent, so one failing must not keep the
    // others from completing and submitting.
    let (run_result, billing_result, workflows_result) =
        tokio::join!(run_metrics, account_billing, workflows_billing);
    let mut failed = false;
    for (path, result) in [
        ("Workflow run metrics", run_result),
        ("Account billing metrics", billing_result),
        ("Workflow billing metrics", workflows_result),
    ] {
        if let Err(error) = result {
            tracing::error!("{} failed: {:?}", path, error);
            failed = true;
        }
    }
    if failed {
        bail!("One or more collection paths failed");
    }
    Ok(())
}

/// Submit series with the configured API key. The key is only demanded once a
/// path actually has something to send.
async fn submit(config: &Config, series: Vec<Series>) -> Result<()> {
    if series.is_empty() {
        tracing::info!("No series to submit");
        return Ok(());
    }
    let api_key = config
        .datadog_api_key
        .as_ref()
        .context("Input 'datadog-api-key' is required to submit metrics")?;
    DatadogClient::new(api_key.clone()).submit(&series).await
}
