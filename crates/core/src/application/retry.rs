// Retry logic for transient store conflicts
use crate::error::{AppError, Result};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Default number of attempts per operation (first try included)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 8;

/// Default delay before the first retry
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(10);

/// Upper bound for a single backoff delay
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(500);

/// Retry decision result
#[derive(Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Run the operation again after the delay
    Retry(Duration),
    /// Surface the error
    GiveUp,
}

/// Bounded exponential backoff for retryable store errors
///
/// delay = base_delay * (backoff_factor ^ (attempt - 1)) * (1.0 ± 0.1), capped at max_delay
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    backoff_factor: f64,
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            backoff_factor: 2.0,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            ..Self::default()
        }
    }

    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor.max(1.0);
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Backoff before retry number `attempt` (1-based), with ±10% jitter
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(30) as i32;
        let base_ms = self.base_delay.as_secs_f64() * 1000.0 * self.backoff_factor.powi(exponent);
        // Jitter keeps contending writers from waking in lockstep
        let jitter: f64 = rand::thread_rng().gen_range(0.9..=1.1);
        let secs = (base_ms * jitter).max(0.0) / 1000.0;
        // Overflowed or non-finite products land on the cap
        Duration::try_from_secs_f64(secs)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Decide whether to retry after `attempt` failed with `err`
    pub fn should_retry(&self, err: &AppError, attempt: u32) -> RetryDecision {
        if !err.is_retryable() || attempt >= self.max_attempts {
            return RetryDecision::GiveUp;
        }
        RetryDecision::Retry(self.delay_for(attempt))
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    ///
    /// Exhausting the attempts on a retryable error yields `Conflict`;
    /// non-retryable errors are returned unchanged on first occurrence.
    pub async fn run<T, F, Fut>(&self, operation: &'static str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            match self.should_retry(&err, attempt) {
                RetryDecision::Retry(delay) => {
                    warn!(
                        operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Store busy, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::GiveUp if err.is_retryable() => {
                    warn!(operation, attempts = attempt, error = %err, "Retries exhausted");
                    return Err(AppError::Conflict(format!(
                        "{} failed after {} attempts: {}",
                        operation, attempt, err
                    )));
                }
                RetryDecision::GiveUp => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(1))
    }

    #[test]
    fn test_delay_grows_and_is_capped() {
        let policy = RetryPolicy::new(10, Duration::from_millis(10))
            .with_max_delay(Duration::from_millis(100));

        let first = policy.delay_for(1);
        assert!(first >= Duration::from_millis(9) && first <= Duration::from_millis(11));

        let third = policy.delay_for(3);
        assert!(third >= Duration::from_millis(36) && third <= Duration::from_millis(44));

        assert!(policy.delay_for(20) <= Duration::from_millis(100));
    }

    #[test]
    fn test_extreme_settings_fall_back_to_the_cap() {
        let cap = Duration::from_millis(250);

        let steep = RetryPolicy::new(10, Duration::from_millis(10))
            .with_backoff_factor(f64::MAX)
            .with_max_delay(cap);
        assert_eq!(steep.delay_for(9), cap);

        let huge_base = RetryPolicy::new(40, Duration::from_secs(u64::MAX)).with_max_delay(cap);
        assert_eq!(huge_base.delay_for(1), cap);
        assert_eq!(huge_base.delay_for(40), cap);
    }

    #[test]
    fn test_non_retryable_gives_up() {
        let policy = fast_policy(5);
        let err = AppError::IndexOutOfRange { index: 1, len: 0 };
        assert_eq!(policy.should_retry(&err, 1), RetryDecision::GiveUp);
    }

    #[tokio::test]
    async fn test_retries_busy_until_success() {
        let policy = fast_policy(5);
        let calls = AtomicU32::new(0);

        let result = policy
            .run("test", || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(AppError::Busy("locked".into()))
                } else {
                    Ok(42)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_become_conflict() {
        let policy = fast_policy(3);
        let calls = AtomicU32::new(0);

        let result: Result<()> = policy
            .run("push", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::Busy("locked".into()))
            })
            .await;

        assert!(matches!(result, Err(AppError::Conflict(msg)) if msg.contains("push")));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_permanent_error_is_not_retried() {
        let policy = fast_policy(5);
        let calls = AtomicU32::new(0);

        let result: Result<()> = tokio_test::block_on(policy.run("pop", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::IndexOutOfRange { index: 0, len: 0 })
        }));

        let err = tokio_test::assert_err!(result);
        assert!(matches!(err, AppError::IndexOutOfRange { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_first_success_returns_without_sleeping() {
        let policy = RetryPolicy::new(5, Duration::from_secs(60));
        let value = tokio_test::block_on(policy.run("len", || async { Ok::<_, AppError>(7) }));
        assert_eq!(tokio_test::assert_ok!(value), 7);
    }
}
