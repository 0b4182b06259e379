//! Bounded retries with exponential backoff.
//!
//! Only errors whose category is retryable (network trouble while talking
//! to mirrors) are attempted again; anything else is returned at once.

use crate::error::{Error, Result};
use std::thread;
use std::time::Duration;

/// Retry policy for transient engine failures.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts, including the first (1 means no retry)
    pub max_attempts: u32,
    /// Delay after the first failure
    pub base_delay: Duration,
    /// Growth of the delay after each further failure
    pub backoff_factor: f64,
    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(5),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(120),
        }
    }
}

impl RetryConfig {
    /// A config that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay to wait after the failed attempt `failed` (0-indexed).
    ///
    /// Saturates at `max_delay`, including when the computation overflows.
    pub fn delay_for_attempt(&self, failed: u32) -> Duration {
        let exponent = i32::try_from(failed).unwrap_or(i32::MAX);
        let secs = self.base_delay.as_secs_f64() * self.backoff_factor.powi(exponent);

        Duration::try_from_secs_f64(secs).map_or(self.max_delay, |d| d.min(self.max_delay))
    }
}

/// A failed attempt that is about to be retried.
#[derive(Debug)]
pub struct Attempt<'a> {
    /// 1-indexed number of the attempt that failed
    pub number: u32,
    /// Attempts allowed in total
    pub of: u32,
    pub error: &'a Error,
    /// Wait before the next attempt
    pub delay: Duration,
}

/// Notified before each retry.
pub trait RetryCallback {
    fn on_retry(&self, attempt: &Attempt<'_>);
}

/// Reports retries through the `log` facade.
pub struct LogCallback;

impl RetryCallback for LogCallback {
    fn on_retry(&self, attempt: &Attempt<'_>) {
        log::warn!(
            "Attempt {}/{} failed: {}. Retrying in {:.1}s",
            attempt.number,
            attempt.of,
            attempt.error,
            attempt.delay.as_secs_f64()
        );
    }
}

/// Run `operation` until it succeeds, fails permanently, or runs out of
/// attempts. The last error is returned.
pub fn with_retry<T>(
    config: &RetryConfig,
    callback: Option<&dyn RetryCallback>,
    mut operation: impl FnMut() -> Result<T>,
) -> Result<T> {
    let allowed = config.max_attempts.max(1);
    let mut number = 1;

    loop {
        let error = match operation() {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if !error.is_retryable() || number >= allowed {
            return Err(error);
        }

        let delay = config.delay_for_attempt(number - 1);
        if let Some(cb) = callback {
            cb.on_retry(&Attempt {
                number,
                of: allowed,
                error: &error,
                delay,
            });
        }

        thread::sleep(delay);
        number += 1;
    }
}
