//! Retry-with-backoff and bounded timeouts for outbound calls.
//!
//! Every network call in ingestion, summarization, and the audio queue
//! routes through these helpers, so retry counts and deadlines are
//! policy, not scattered constants.

use std::future::Future;
use std::time::Duration;

use tracing::{error, warn};

use crate::adapters::AdapterError;

/// How often and how patiently an outbound call is retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, counting the first one
    pub max_attempts: u32,

    /// Sleep before the first retry, in milliseconds
    pub initial_delay_ms: u64,

    /// Ceiling on any single sleep, in milliseconds
    pub max_delay_ms: u64,

    /// Growth factor from one sleep to the next
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1000,
            max_delay_ms: 30000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Sleep before the retry that follows failed attempt number
    /// `attempt` (1-indexed): the initial delay scaled up per attempt,
    /// never above the ceiling.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::from_millis(self.initial_delay_ms);
        }

        let scaled =
            self.initial_delay_ms as f64 * self.backoff_multiplier.powi((attempt - 1) as i32);

        Duration::from_millis(scaled.min(self.max_delay_ms as f64) as u64)
    }

    /// True while the attempt budget is not yet spent.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

/// Run `operation` until it succeeds or the policy is exhausted,
/// sleeping the backoff delay between attempts. The last error is
/// returned unchanged after the final attempt.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    name: &str,
    mut operation: F,
) -> Result<T, AdapterError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AdapterError>>,
{
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if !policy.should_retry(attempt) {
                    error!(call = name, attempt, error = %e, "call failed permanently");
                    return Err(e);
                }

                let delay = policy.delay_for_attempt(attempt);
                warn!(
                    call = name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "call failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Bound a single call by `limit`, converting expiry into the typed
/// [`AdapterError::Timeout`] so callers can tell it apart from other
/// failure kinds.
pub async fn with_timeout<T, Fut>(limit: Duration, future: Fut) -> Result<T, AdapterError>
where
    Fut: Future<Output = Result<T, AdapterError>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => Err(AdapterError::Timeout(limit)),
    }
}
