use std::future::Future;
use std::time::Duration;

use crate::{
    config::Config,
    error::{AppError, AppResult},
};

/// Longest backoff step, as a multiple of the base delay
const MAX_BACKOFF_FACTOR: u32 = 16;

/// Deadline and retry budget applied to remote calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first try included
    pub attempts: u32,
    /// Delay before the first retry; doubles on every further retry
    pub base_delay: Duration,
    /// Deadline for each individual attempt
    pub timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            attempts: config.read_retry_attempts.max(1),
            base_delay: Duration::from_millis(config.read_retry_base_delay_ms),
            timeout: config.remote_timeout(),
        }
    }

    /// Single attempt with a deadline; used for writes
    pub fn once(timeout: Duration) -> Self {
        Self {
            attempts: 1,
            base_delay: Duration::ZERO,
            timeout,
        }
    }

    fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u32
            .checked_shl(retry.saturating_sub(1))
            .unwrap_or(MAX_BACKOFF_FACTOR)
            .min(MAX_BACKOFF_FACTOR);
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(250),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Runs `call` under `timeout`, mapping an elapsed deadline to `AppError::Timeout`
pub async fn with_deadline<T, F>(timeout: Duration, call: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Timeout(timeout.as_millis() as u64)),
    }
}

/// Runs a read with a per-attempt deadline, retrying retryable failures
/// with exponential backoff until the policy's attempts are used up
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, operation: &str, mut call: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt = 1;

    loop {
        match with_deadline(policy.timeout, call()).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < policy.attempts => {
                let delay = policy.backoff(attempt);
                tracing::warn!(
                    operation,
                    attempt,
                    max_attempts = policy.attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Remote read failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                if attempt > 1 {
                    tracing::error!(operation, attempt, error = %e, "Remote read gave up");
                }
                return Err(e);
            }
        }
    }
}
