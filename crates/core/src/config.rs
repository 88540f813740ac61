use anyhow::{Context, Result};

/// Action inputs, resolved once at startup and shared by all collection paths.
#[derive(Debug, Clone)]
pub struct Config {
    pub github_token: String,
    pub datadog_api_key: Option<String>,
    pub enable_workflow_metrics: bool,
    pub enable_billing_metrics: bool,
    pub enable_repository_workflows_billing_metrics: bool,
}

impl Config {
    /// Resolve inputs from the environment variables set by the Actions runner.
    pub fn from_env() -> Result<Self> {
        Self::resolve(|name| std::env::var(input_var(name)).ok())
    }

    pub fn resolve(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            github_token: required(&get, "github-token")?,
            datadog_api_key: input(&get, "datadog-api-key"),
            enable_workflow_metrics: flag(&get, "enable-workflow-metrics")?,
            enable_billing_metrics: flag(&get, "enable-billing-metrics")?,
            enable_repository_workflows_billing_metrics: flag(
                &get,
                "enable-repository-workflows-billing-metrics",
            )?,
        })
    }
}

/// Environment variable the runner stores an input under. Spaces become
/// underscores, dashes are kept as-is.
fn input_var(name: &str) -> String { format!("INPUT_{}", name.replace(' ', "_").to_uppercase()) }

/// Fetch an input, trimmed. Empty or whitespace-only values count as unset.
fn input(get: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    get(name).map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn required(get: &impl Fn(&str) -> Option<String>, name: &str) -> Result<String> {
    input(get, name).with_context(|| format!("Input '{name}' is required"))
}

/// Boolean inputs are enabled by the exact string "true" and nothing else.
fn flag(get: &impl Fn(&str) -> Option<String>, name: &str) -> Result<bool> {
    Ok(required(get, name)? == "true")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(values: &'static [(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        move |name| {
            values.iter().find(|(key, _)| *key == name).map(|(_, value)| value.to_string())
        }
    }

    #[test]
    fn resolves_all_inputs() {
        let config = Config::resolve(lookup(&[
            ("github-token", "ghp_test"),
            ("datadog-api-key", "dd_test"),
            ("enable-workflow-metrics", "true"),
            ("enable-billing-metrics", "false"),
            ("enable-repository-workflows-billing-metrics", "true"),
        ]))
        .unwrap();
        assert_eq!(config.github_token, "ghp_test");
        assert_eq!(config.datadog_api_key.as_deref(), Some("dd_test"));
        assert!(config.enable_workflow_metrics);
        assert!(!config.enable_billing_metrics);
        assert!(config.enable_repository_workflows_billing_metrics);
    }

    #[test]
    fn flags_accept_only_the_exact_string_true() {
        for (value, expected) in [
            ("true", true),
            ("false", false),
            ("True", false),
            ("TRUE", false),
            ("1", false),
            ("yes", false),
            (" true ", true),
        ] {
            let config = Config::resolve(|name| match name {
                "github-token" => Some("token".to_string()),
                "enable-workflow-metrics" => Some(value.to_string()),
                "enable-billing-metrics" | "enable-repository-workflows-billing-metrics" => {
                    Some("false".to_string())
                }
                _ => None,
            })
            .unwrap();
            assert_eq!(config.enable_workflow_metrics, expected, "input {value:?}");
        }
    }

    #[test]
    fn missing_token_fails() {
        let result = Config::resolve(lookup(&[
            ("enable-workflow-metrics", "true"),
            ("enable-billing-metrics", "true"),
            ("enable-repository-workflows-billing-metrics", "true"),
        ]));
        assert!(result.unwrap_err().to_string().contains("github-token"));
    }

    #[test]
    fn blank_token_counts_as_unset() {
        let result = Config::resolve(lookup(&[
            ("github-token", "   "),
            ("enable-workflow-metrics", "true"),
            ("enable-billing-metrics", "true"),
            ("enable-repository-workflows-billing-metrics", "true"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn missing_flag_fails() {
        let result = Config::resolve(lookup(&[
            ("github-token", "token"),
            ("enable-workflow-metrics", "true"),
            ("enable-billing-metrics", "true"),
        ]));
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("enable-repository-workflows-billing-metrics")
        );
    }

    #[test]
    fn datadog_api_key_is_optional() {
        let config = Config::resolve(lookup(&[
            ("github-token", "token"),
            ("enable-workflow-metrics", "false"),
            ("enable-billing-metrics", "false"),
            ("enable-repository-workflows-billing-metrics", "false"),
        ]))
        .unwrap();
        assert_eq!(config.datadog_api_key, None);
    }

    #[test]
    fn input_variables_follow_the_runner_convention() {
        assert_eq!(input_var("github-token"), "INPUT_GITHUB-TOKEN");
        assert_eq!(input_var("enable workflow metrics"), "INPUT_ENABLE_WORKFLOW_METRICS");
    }
}
