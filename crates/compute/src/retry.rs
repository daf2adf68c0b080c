//! Exponential-backoff retry policy for failed status queries.
//!
//! A status query that cannot complete (network error, non-JSON body) is
//! either surfaced immediately or retried after an increasing delay,
//! depending on [`RetryPolicy::max_retries`]. Job submissions are never
//! retried because the service gives no exactly-once guarantee.

use std::time::Duration;

/// Tunable parameters for retrying transport failures.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Consecutive failed queries tolerated before giving up. `0` fails on
    /// the first transport error.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on the delay between retries.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl RetryPolicy {
    /// Fail on the first transport error.
    pub fn fail_fast() -> Self {
        Self::default()
    }

    /// Retry up to `max_retries` times with the default backoff curve.
    pub fn with_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Delay to wait before retry number `retry` (1-based).
    ///
    /// `initial_delay * multiplier^(retry - 1)`, never above `max_delay`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(i32::MAX as u32) as i32;
        let scaled = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        Duration::try_from_secs_f64(scaled)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Whether another query may follow `failures` consecutive transport
    /// errors.
    pub fn allows_retry(&self, failures: u32) -> bool {
        failures < self.max_retries
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}
