use std::time::Duration;

/// Configures per-attempt timeout and retry behavior.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum number of retries after the initial attempt.
    pub max_retries: usize,
    /// Base retry delay in milliseconds (exponential strategy, no jitter).
    pub retry_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: 15_000,
            max_retries: 3,
            retry_delay_ms: 1_000,
        }
    }
}

impl RetryPolicy {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Total number of attempts a retrying call may make.
    pub fn max_attempts(&self) -> usize {
        self.max_retries.saturating_add(1)
    }

    /// Delay to wait after the failed attempt at `attempt` (0-based).
    ///
    /// `retry_delay_ms * 2^attempt`, saturating instead of overflowing.
    pub fn backoff_delay(&self, attempt: usize) -> Duration {
        let multiplier = u32::try_from(attempt)
            .ok()
            .and_then(|exp| 1u64.checked_shl(exp))
            .unwrap_or(u64::MAX);
        Duration::from_millis(self.retry_delay_ms.saturating_mul(multiplier))
    }
}
