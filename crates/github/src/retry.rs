use std::{fmt::Debug, time::Duration};

use anyhow::Result;
use rand::Rng;
use tokio::time::sleep;

/// Retry policy for GitHub API calls. Delays grow exponentially from
/// `min_delay`, with a random jitter multiplier applied before the
/// `max_delay` cap.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the initial attempt.
    pub retries: u32,
    pub factor: f64,
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            factor: 3.0,
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry that follows failed attempt `attempt` (1-based).
    fn delay(&self, attempt: u32) -> Duration {
        let base =
            self.min_delay.as_secs_f64() * self.factor.powi(attempt.saturating_sub(1) as i32);
        let jittered = if self.jitter { base * rand::rng().random_range(1.0..2.0) } else { base };
        Duration::from_secs_f64(jittered).min(self.max_delay)
    }

    /// Run `operation` until it succeeds or the retry budget is exhausted.
    /// Returns the last error once all attempts have failed.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T>
    where
        T: Debug,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => {
                    tracing::info!("{}: {:?}", label, value);
                    return Ok(value);
                }
                Err(error) if attempt <= self.retries => {
                    let delay = self.delay(attempt);
                    tracing::warn!(
                        "{} failed (attempt {}/{}), retrying in {:?}: {:?}",
                        label,
                        attempt,
                        self.retries + 1,
                        delay,
                        error
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => {
                    tracing::error!("{} failed after {} attempts: {:?}", label, attempt, error);
                    return Err(error);
                }
            }
        }
    }
}
