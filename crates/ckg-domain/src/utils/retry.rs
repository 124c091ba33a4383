//! Retry harness: exponential backoff with optional jitter.
//!
//! Wraps transient failures against the vector and graph stores. Fatal
//! (non-transient) errors propagate immediately; the final failure after
//! exhausting retries propagates the last error unchanged.

use std::future::Future;
use std::time::Duration;

use rand::RngExt;
use tracing::warn;

use crate::error::{Error, Result};

/// Retry policy knobs.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum re-attempts after the initial try
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound on any single delay
    pub max_delay: Duration,
    /// Exponential growth factor
    pub multiplier: f64,
    /// Apply ±25% uniform jitter to each delay
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Delay for the given zero-based attempt, jitter applied.
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = self.initial_delay.as_millis() as f64 * self.multiplier.powi(attempt as i32);
        let capped = exp.min(self.max_delay.as_millis() as f64);
        let with_jitter = if self.jitter {
            capped * rand::rng().random_range(0.75..=1.25)
        } else {
            capped
        };
        Duration::from_millis(with_jitter as u64)
    }
}

/// Run `op`, retrying transient failures per `config`.
///
/// Transience is decided by [`Error::is_transient`]; use [`with_retry_if`]
/// to supply a custom predicate.
///
/// # Errors
///
/// Propagates the first non-transient error immediately, or the last
/// transient error once retries are exhausted.
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    with_retry_if(config, Error::is_transient, op).await
}

/// Run `op`, retrying failures for which `should_retry` returns true.
///
/// # Errors
///
/// Propagates the first non-retryable error immediately, or the last
/// retryable error once retries are exhausted.
pub async fn with_retry_if<T, F, Fut, P>(config: &RetryConfig, should_retry: P, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    P: Fn(&Error) -> bool,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < config.max_retries && should_retry(&err) => {
                let delay = config.delay_for_attempt(attempt);
                warn!(
                    attempt = attempt + 1,
                    max_retries = config.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    code = err.code(),
                    "Transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
