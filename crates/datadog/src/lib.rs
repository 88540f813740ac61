pub mod metrics;

use anyhow::{Context, Result, bail};
use serde::Serialize;

pub const DEFAULT_SITE: &str = "https://api.datadoghq.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Gauge,
    Count,
}

/// One metric series in the v1 submission format. Points serialize as
/// `[timestamp, value]` pairs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub metric: String,
    #[serde(rename = "type")]
    pub kind: MetricKind,
    pub points: Vec<(i64, f64)>,
    pub tags: Vec<String>,
}

impl Series {
    pub fn gauge(metric: impl Into<String>, timestamp: i64, value: f64, tags: Vec<String>) -> Self {
        Self {
            metric: metric.into(),
            kind: MetricKind::Gauge,
            points: vec![(timestamp, value)],
            tags,
        }
    }

    pub fn count(metric: impl Into<String>, timestamp: i64, value: f64, tags: Vec<String>) -> Self {
        Self {
            metric: metric.into(),
            kind: MetricKind::Count,
            points: vec![(timestamp, value)],
            tags,
        }
    }
}

#[derive(Serialize)]
struct SeriesPayload<'a> {
    series: &'a [Series],
}

#[derive(Debug, Clone)]
pub struct DatadogClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl DatadogClient {
    pub fn new(api_key: String) -> Self { Self::with_base_url(api_key, DEFAULT_SITE.to_string()) }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self { client: reqwest::Client::new(), base_url, api_key }
    }

    /// Submit all series in one request. Datadog accepts or rejects the batch
    /// as a whole.
    pub async fn submit(&self, series: &[Series]) -> Result<()> {
        if series.is_empty() {
            tracing::info!("No series to submit");
            return Ok(());
        }
        let response = self
            .client
            .post(format!("{}/api/v1/series", self.base_url))
            .header("DD-API-KEY", &self.api_key)
            .json(&SeriesPayload { series })
            .send()
            .await
            .context("Failed to send metrics to Datadog")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Datadog rejected metrics ({}): {}", status, body);
        }
        tracing::info!("Submitted {} series to Datadog", series.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_serializes_to_the_v1_wire_shape() {
        let series = Series::gauge(
            "github.actions.workflow_run.duration_seconds",
            1_736_537_880,
            300.0,
            vec!["repository:octo-org/octo-repo".to_string(), "workflow:Build".to_string()],
        );
        assert_eq!(serde_json::to_value(&series).unwrap(), serde_json::json!({
            "metric": "github.actions.workflow_run.duration_seconds",
            "type": "gauge",
            "points": [[1_736_537_880, 300.0]],
            "tags": ["repository:octo-org/octo-repo", "workflow:Build"],
        }));
    }

    #[test]
    fn count_series_carries_the_count_type() {
        let series = Series::count("github.actions.workflow_run.total", 1_736_537_880, 1.0, vec![]);
        assert_eq!(serde_json::to_value(&series).unwrap()["type"], "count");
    }

    #[test]
    fn payload_wraps_series_in_a_series_field() {
        let series = vec![Series::count("m", 0, 1.0, vec![])];
        let payload = serde_json::to_value(SeriesPayload { series: &series }).unwrap();
        assert_eq!(payload["series"].as_array().map(Vec::len), Some(1));
    }
}
