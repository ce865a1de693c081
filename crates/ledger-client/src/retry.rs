//! Exponential-backoff retry for transient ledger failures.

use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::LedgerError;

/// Retry policy configuration.
///
/// Exponential backoff avoids retry storms: the first retry waits
/// `initial_delay`, each subsequent one multiplies the wait until
/// `max_delay` or the retry budget is hit.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum retries, not counting the initial attempt.
    pub max_retries: u32,
    /// Wait before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on any single wait.
    pub max_delay: Duration,
    /// Backoff multiplier per retry.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Returns the wait before retry number `attempt` (counted from 0).
    ///
    /// Computed as `initial_delay * multiplier^attempt`, capped at
    /// `max_delay`. The f64 round-trip loses sub-millisecond precision,
    /// which does not matter at these scales.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_ms = self.initial_delay.as_millis() as f64;
        let delay_ms = base_ms * self.multiplier.powi(attempt as i32);
        let capped_ms = delay_ms.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped_ms as u64)
    }

    /// Returns true if another retry fits the budget. `attempt` is the
    /// number of failures so far.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}

/// Runs an async operation under a retry policy.
///
/// Only transient errors (per `LedgerError::is_transient`) are retried;
/// rejections propagate immediately.
pub async fn retry_with_policy<F, Fut, T>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T, LedgerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LedgerError>>,
{
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    info!(operation = operation_name, attempt, "operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => {
                if !err.is_transient() {
                    return Err(err);
                }

                if !policy.should_retry(attempt) {
                    warn!(
                        operation = operation_name,
                        attempt,
                        max_retries = policy.max_retries,
                        error = %err,
                        "retry budget exhausted"
                    );
                    return Err(err);
                }

                let delay = policy.delay_for_attempt(attempt);
                warn!(
                    operation = operation_name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient failure, backing off before retry"
                );

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
