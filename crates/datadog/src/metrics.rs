use actions_metrics_core::models::{AccountBilling, WorkflowBilling, WorkflowRun};

use crate::Series;

/// Series describing one completed workflow run, timestamped at the moment
/// the run last changed state. Runs without a conclusion carry no
/// `conclusion` tag.
pub fn workflow_run_series(run: &WorkflowRun, repository: &str) -> Vec<Series> {
    let timestamp = run.updated_at.timestamp();
    let mut tags = vec![
        format!("repository:{repository}"),
        format!("workflow:{}", run.name),
        format!("event:{}", run.event),
        format!("branch:{}", run.head_branch),
        format!("status:{}", run.status.as_str()),
    ];
    if let Some(conclusion) = run.conclusion {
        tags.push(format!("conclusion:{}", conclusion.as_str()));
    }
    vec![
        Series::gauge(
            "github.actions.workflow_run.duration_seconds",
            timestamp,
            run.duration_seconds(),
            tags.clone(),
        ),
        Series::count("github.actions.workflow_run.total", timestamp, 1.0, tags),
    ]
}

/// Series for the owning account's Actions usage, timestamped at collection
/// time. The per-platform breakdown only emits platforms the account has
/// actually used.
pub fn account_billing_series(
    billing: &AccountBilling,
    owner: &str,
    timestamp: i64,
) -> Vec<Series> {
    let usage = billing.usage();
    let tags =
        vec![format!("account:{owner}"), format!("account_type:{}", billing.account_type())];
    let mut series = vec![
        Series::gauge(
            "github.actions.billing.total_minutes_used",
            timestamp,
            usage.total_minutes_used,
            tags.clone(),
        ),
        Series::gauge(
            "github.actions.billing.total_paid_minutes_used",
            timestamp,
            usage.total_paid_minutes_used,
            tags.clone(),
        ),
        Series::gauge(
            "github.actions.billing.included_minutes",
            timestamp,
            usage.included_minutes,
            tags.clone(),
        ),
    ];
    for (platform, minutes) in usage.minutes_used_breakdown.platforms() {
        let mut tags = tags.clone();
        tags.push(format!("os:{platform}"));
        series.push(Series::gauge("github.actions.billing.minutes_used", timestamp, minutes, tags));
    }
    series
}

/// One gauge per workflow and platform with a reported billable total.
pub fn workflow_billing_series(
    billing: &[WorkflowBilling],
    repository: &str,
    timestamp: i64,
) -> Vec<Series> {
    let mut series = Vec::new();
    for entry in billing {
        for (platform, total_ms) in entry.usage.billable.totals() {
            series.push(Series::gauge(
                "github.actions.workflow.billable_ms",
                timestamp,
                total_ms as f64,
                vec![
                    format!("repository:{repository}"),
                    format!("workflow:{}", entry.workflow.name),
                    format!("os:{platform}"),
                ],
            ));
        }
    }
    series
}
