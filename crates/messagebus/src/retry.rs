//! Retry combinator with exponential backoff.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Retry configuration for event handlers.
///
/// Reads from environment variables via `from_env`:
/// - `BUS_RETRY_MAX_ATTEMPTS`: total attempts per handler (default: `3`)
/// - `BUS_RETRY_BASE_DELAY_MS`: backoff before the second attempt, doubled
///   after each failure (default: `200`)
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy with explicit settings.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Loads the policy from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_attempts: std::env::var("BUS_RETRY_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_attempts),
            base_delay: std::env::var("BUS_RETRY_BASE_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.base_delay),
        }
    }

    /// Returns the backoff to wait after the given failed attempt (1-based):
    /// `base_delay`, `2 * base_delay`, `4 * base_delay`, ...
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

/// Runs an operation up to `policy.max_attempts` times, sleeping with
/// exponential backoff between attempts.
///
/// The wait blocks the calling task, not a background timer: a long backoff
/// chain stalls the worklist it runs on.
pub async fn retry_with_backoff<T, E, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt: u32 = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(error) if attempt < policy.max_attempts => {
                tracing::warn!(attempt, error = %error, "attempt failed, backing off");
                metrics::counter!("bus_handler_retries").increment(1);
                tokio::time::sleep(policy.delay_after(attempt)).await;
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}
