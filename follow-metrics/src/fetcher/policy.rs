//! Retry and backoff configuration for the batch fetcher.

use std::time::Duration;

/// How the fetcher reacts to failed or throttled batches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries per batch for transient failures (after the first attempt).
    pub max_retries: u32,

    /// Fixed delay before each transient retry.
    pub retry_delay: Duration,

    /// Wait used when a 429 response carries no reset hint.
    pub default_rate_limit_wait: Duration,

    /// Rate limit waits allowed per batch before it is abandoned.
    /// These do not count against `max_retries`.
    pub max_rate_limit_waits: u32,

    /// Retry throttled batches immediately instead of waiting (fast mode).
    pub skip_rate_limit_waits: bool,
}

impl RetryPolicy {
    /// Policy for fast mode: identical, except rate limit waits are skipped.
    pub fn fast() -> Self {
        Self {
            skip_rate_limit_waits: true,
            ..Self::default()
        }
    }

    /// Set the transient retry count.
    pub fn with_max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    /// Set the fixed delay between transient retries.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Set the rate limit wait cap.
    pub fn with_max_rate_limit_waits(mut self, n: u32) -> Self {
        self.max_rate_limit_waits = n;
        self
    }

    /// Set the fallback wait for throttled requests without a reset hint.
    pub fn with_default_rate_limit_wait(mut self, wait: Duration) -> Self {
        self.default_rate_limit_wait = wait;
        self
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(5),
            // The lookup endpoint's rate limit window is 15 minutes
            default_rate_limit_wait: Duration::from_secs(900),
            max_rate_limit_waits: 5,
            skip_rate_limit_waits: false,
        }
    }
}
