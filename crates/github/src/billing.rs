use actions_metrics_core::models::{AccountBilling, ActionsBilling};
use anyhow::Result;
use octocrab::Octocrab;

use crate::retry::RetryPolicy;

/// Fetch Actions billing for `owner`. The organization endpoint is tried
/// first and any failure there falls back to the user endpoint, so the same
/// step works in both kinds of account. The two-tier lookup retries as a
/// unit, which gives the organization endpoint a fresh chance on every
/// attempt.
pub async fn fetch_account_billing(
    client: &Octocrab,
    owner: &str,
    policy: &RetryPolicy,
) -> Result<AccountBilling> {
    policy
        .run("Account billing lookup", || {
            billing_with_fallback(
                || actions_billing(client, format!("/orgs/{owner}/settings/billing/actions")),
                || actions_billing(client, format!("/users/{owner}/settings/billing/actions")),
            )
        })
        .await
}

async fn billing_with_fallback<Org, User, OrgFut, UserFut>(
    org: Org,
    user: User,
) -> Result<AccountBilling>
where
    Org: FnOnce() -> OrgFut,
    User: FnOnce() -> UserFut,
    OrgFut: Future<Output = Result<ActionsBilling>>,
    UserFut: Future<Output = Result<ActionsBilling>>,
{
    match org().await {
        Ok(usage) => Ok(AccountBilling::Organization(usage)),
        Err(error) => {
            tracing::warn!(
                "Organization billing lookup failed, trying user endpoint: {:?}",
                error
            );
            Ok(AccountBilling::User(user().await?))
        }
    }
}

async fn actions_billing(client: &Octocrab, route: String) -> Result<ActionsBilling> {
    Ok(client.get(route, None::<&()>).await?)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use actions_metrics_core::models::MinutesBreakdown;
    use anyhow::{anyhow, bail};

    use super::*;

    fn usage(total: f64) -> ActionsBilling {
        ActionsBilling {
            total_minutes_used: total,
            total_paid_minutes_used: 0.0,
            included_minutes: 2000.0,
            minutes_used_breakdown: MinutesBreakdown::default(),
        }
    }

    #[tokio::test]
    async fn prefers_the_organization_endpoint() {
        let billing = billing_with_fallback(
            || async { Ok(usage(10.0)) },
            || async { panic!("user endpoint should not be called") },
        )
        .await
        .unwrap();
        assert_eq!(billing, AccountBilling::Organization(usage(10.0)));
        assert_eq!(billing.account_type(), "organization");
    }

    #[tokio::test]
    async fn falls_back_to_the_user_endpoint() {
        let billing =
            billing_with_fallback(|| async { bail!("404") }, || async { Ok(usage(5.0)) })
                .await
                .unwrap();
        assert_eq!(billing, AccountBilling::User(usage(5.0)));
        assert_eq!(billing.account_type(), "user");
    }

    #[tokio::test]
    async fn user_endpoint_failure_is_final() {
        let error =
            billing_with_fallback(|| async { bail!("org down") }, || async { bail!("user down") })
                .await
                .unwrap_err();
        assert_eq!(error.to_string(), "user down");
    }

    #[tokio::test(start_paused = true)]
    async fn fallback_succeeds_without_consuming_retries() {
        let org_calls = AtomicU32::new(0);
        let user_calls = AtomicU32::new(0);
        let (org_calls, user_calls) = (&org_calls, &user_calls);
        let policy = RetryPolicy { jitter: false, ..RetryPolicy::default() };
        let billing = policy
            .run("billing", || {
                billing_with_fallback(
                    move || async move {
                        org_calls.fetch_add(1, Ordering::SeqCst);
                        Err(anyhow!("not an organization"))
                    },
                    move || async move {
                        user_calls.fetch_add(1, Ordering::SeqCst);
                        Ok(usage(7.0))
                    },
                )
            })
            .await
            .unwrap();
        assert_eq!(billing, AccountBilling::User(usage(7.0)));
        assert_eq!(org_calls.load(Ordering::SeqCst), 1);
        assert_eq!(user_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_reattempts_the_organization_endpoint() {
        let org_calls = AtomicU32::new(0);
        let user_calls = AtomicU32::new(0);
        let (org_calls, user_calls) = (&org_calls, &user_calls);
        let policy = RetryPolicy { jitter: false, ..RetryPolicy::default() };
        let billing = policy
            .run("billing", || {
                let org_attempt = org_calls.fetch_add(1, Ordering::SeqCst) + 1;
                billing_with_fallback(
                    move || async move {
                        if org_attempt < 2 {
                            bail!("org flake");
                        }
                        Ok(usage(1.0))
                    },
                    move || async move {
                        user_calls.fetch_add(1, Ordering::SeqCst);
                        Err(anyhow!("user down"))
                    },
                )
            })
            .await
            .unwrap();
        assert_eq!(billing.account_type(), "organization");
        assert_eq!(org_calls.load(Ordering::SeqCst), 2);
        assert_eq!(user_calls.load(Ordering::SeqCst), 1);
    }
}
