use std::time::Duration;

use config::ConnectionConfig;

/// Attempt budget and exponential backoff schedule for one request.
///
/// After failed attempt `k` (0-based) the caller waits `base_delay * 2^k`,
/// unless `k` was the last attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay
        }
    }

    pub fn from_config(config: &ConnectionConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_millis(config.retry_delay_ms)
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay to wait after `attempt` failed, or `None` when it was the last.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt + 1 >= self.max_attempts {
            return None;
        }
        Some(self.base_delay.saturating_mul(2u32.saturating_pow(attempt)))
    }

    /// Every delay a fully failing request would sleep through.
    pub fn schedule(&self) -> Vec<Duration> {
        (0..self.max_attempts)
            .filter_map(|attempt| self.delay_for(attempt))
            .collect()
    }
}
