use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a workflow run as delivered in the event payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    Completed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Completed => "completed",
        }
    }
}

/// Conclusion of a completed workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunConclusion {
    Success,
    Failure,
}

impl RunConclusion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

/// Workflow run object embedded in a `workflow_run` event payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRunPayload {
    pub id: u64,
    pub url: String,
    pub run_number: u64,
    pub workflow_id: u64,
    pub workflow_url: String,
    pub name: String,
    pub event: String,
    pub status: RunStatus,
    #[serde(default)]
    pub conclusion: Option<RunConclusion>,
    pub head_branch: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Workflow run with parsed timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowRun {
    pub id: u64,
    pub url: String,
    pub run_number: u64,
    pub workflow_id: u64,
    pub workflow_url: String,
    pub name: String,
    pub event: String,
    pub status: RunStatus,
    pub conclusion: Option<RunConclusion>,
    pub head_branch: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowRun {
    /// Normalize the wire payload. The only failure mode is a timestamp that
    /// does not parse.
    pub fn from_payload(payload: &WorkflowRunPayload) -> Result<Self> {
        Ok(Self {
            id: payload.id,
            url: payload.url.clone(),
            run_number: payload.run_number,
            workflow_id: payload.workflow_id,
            workflow_url: payload.workflow_url.clone(),
            name: payload.name.clone(),
            event: payload.event.clone(),
            status: payload.status,
            conclusion: payload.conclusion,
            head_branch: payload.head_branch.clone(),
            created_at: parse_timestamp(&payload.created_at, "created_at")?,
            updated_at: parse_timestamp(&payload.updated_at, "updated_at")?,
        })
    }

    /// Wall-clock duration of the run in seconds. Fractional when the
    /// timestamps carry sub-second precision, negative when upstream reports
    /// them out of order.
    pub fn duration_seconds(&self) -> f64 {
        (self.updated_at - self.created_at).num_milliseconds() as f64 / 1000.0
    }
}

fn parse_timestamp(value: &str, field: &str) -> Result<DateTime<Utc>> {
    value.parse().with_context(|| format!("Invalid {field} timestamp '{value}'"))
}

/// Actions usage for an account, as returned by both the organization and the
/// user billing endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionsBilling {
    pub total_minutes_used: f64,
    pub total_paid_minutes_used: f64,
    pub included_minutes: f64,
    #[serde(default)]
    pub minutes_used_breakdown: MinutesBreakdown,
}

/// Minutes used per runner platform. Platforms the account never ran on may
/// be missing entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MinutesBreakdown {
    #[serde(rename = "UBUNTU", skip_serializing_if = "Option::is_none")]
    pub ubuntu: Option<f64>,
    #[serde(rename = "MACOS", skip_serializing_if = "Option::is_none")]
    pub macos: Option<f64>,
    #[serde(rename = "WINDOWS", skip_serializing_if = "Option::is_none")]
    pub windows: Option<f64>,
}

impl MinutesBreakdown {
    /// Platforms with a reported figure, keyed by tag value.
    pub fn platforms(&self) -> impl Iterator<Item = (&'static str, f64)> {
        [("ubuntu", self.ubuntu), ("macos", self.macos), ("windows", self.windows)]
            .into_iter()
            .filter_map(|(platform, minutes)| minutes.map(|minutes| (platform, minutes)))
    }
}

/// Account billing tagged with the endpoint that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum AccountBilling {
    Organization(ActionsBilling),
    User(ActionsBilling),
}

impl AccountBilling {
    pub fn usage(&self) -> &ActionsBilling {
        match self {
            Self::Organization(usage) | Self::User(usage) => usage,
        }
    }

    pub fn account_type(&self) -> &'static str {
        match self {
            Self::Organization(_) => "organization",
            Self::User(_) => "user",
        }
    }
}

/// State of a workflow definition. GitHub occasionally grows new states, so
/// anything unrecognized maps to [`WorkflowState::Unknown`] instead of
/// failing the whole listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Active,
    Deleted,
    DisabledFork,
    DisabledInactivity,
    DisabledManually,
    #[serde(other)]
    Unknown,
}

/// Workflow definition belonging to a repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: u64,
    pub name: String,
    pub path: String,
    pub state: WorkflowState,
}

impl Workflow {
    pub fn is_active(&self) -> bool { self.state == WorkflowState::Active }
}

/// Billable time for one workflow over the current billing cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowUsage {
    #[serde(default)]
    pub billable: BillableBreakdown,
}

/// Billable milliseconds per runner platform. Self-hosted runners report no
/// timing at all, and platforms without runs are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillableBreakdown {
    #[serde(rename = "UBUNTU", skip_serializing_if = "Option::is_none")]
    pub ubuntu: Option<PlatformTiming>,
    #[serde(rename = "MACOS", skip_serializing_if = "Option::is_none")]
    pub macos: Option<PlatformTiming>,
    #[serde(rename = "WINDOWS", skip_serializing_if = "Option::is_none")]
    pub windows: Option<PlatformTiming>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformTiming {
    #[serde(default)]
    pub total_ms: Option<u64>,
}

impl BillableBreakdown {
    /// Platforms with a reported total, keyed by tag value.
    pub fn totals(&self) -> impl Iterator<Item = (&'static str, u64)> {
        [("ubuntu", self.ubuntu), ("macos", self.macos), ("windows", self.windows)]
            .into_iter()
            .filter_map(|(platform, timing)| {
                timing.and_then(|timing| timing.total_ms).map(|ms| (platform, ms))
            })
    }
}

/// One active workflow paired with its billable time breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowBilling {
    pub workflow: Workflow,
    pub usage: WorkflowUsage,
}
