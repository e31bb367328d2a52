//! Bounded retry with linear backoff.

use std::future::Future;
use std::time::Duration;

use tracing::{error, warn};

use crate::error::FetchError;

/// Retries a fallible async operation a bounded number of times.
///
/// The delay before retry `n + 1` is `base_delay * n`. There is no jitter
/// and no state carried between calls to [`run`](Self::run).
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay unit multiplied by the failed attempt number.
    pub base_delay: Duration,
}

impl RetryExecutor {
    /// Creates an executor with a one second base delay.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::from_secs(1),
        }
    }

    /// Sets the base delay.
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Calculates the delay after the given failed attempt.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Runs `operation` until it succeeds, the attempts run out, or it fails
    /// with an error that is not [transient](FetchError::is_transient).
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::RetriesExhausted`] carrying `label`, the number
    /// of attempts made and the error from the final attempt.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < max_attempts && err.is_transient() => {
                    let delay = self.delay_for_attempt(attempt);
                    warn!(
                        label,
                        attempt,
                        max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "Operation failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    if err.is_transient() {
                        error!(label, attempts = attempt, error = %err, "Operation failed after all attempts");
                    } else {
                        error!(label, attempts = attempt, error = %err, "Operation failed, not retryable");
                    }
                    return Err(FetchError::RetriesExhausted {
                        label: label.to_string(),
                        attempts: attempt,
                        source: Box::new(err),
                    });
                }
            }
        }
    }
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_attempts: u32) -> RetryExecutor {
        RetryExecutor::new(max_attempts).with_base_delay(Duration::from_millis(1))
    }

    #[test]
    fn test_linear_backoff() {
        let retry = RetryExecutor::new(5).with_base_delay(Duration::from_millis(2000));

        assert_eq!(retry.delay_for_attempt(1), Duration::from_millis(2000));
        assert_eq!(retry.delay_for_attempt(2), Duration::from_millis(4000));
        assert_eq!(retry.delay_for_attempt(3), Duration::from_millis(6000));
    }

    #[tokio::test]
    async fn test_succeeds_first_time() {
        let calls = &AtomicU32::new(0);
        let result = fast(3)
            .run("test", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, FetchError>("ok")
            })
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_succeeds_after_failures() {
        let calls = &AtomicU32::new(0);
        let result = fast(3)
            .run("test", || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(FetchError::Navigation {
                        url: "https://example.com".to_string(),
                        reason: "reset".to_string(),
                    })
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_always_failing_is_bounded() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), _> = fast(2)
            .run("flaky op", || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Err(FetchError::Navigation {
                    url: "https://example.com".to_string(),
                    reason: format!("fail {n}"),
                })
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        match result {
            Err(FetchError::RetriesExhausted {
                label,
                attempts,
                source,
            }) => {
                assert_eq!(label, "flaky op");
                assert_eq!(attempts, 2);
                assert!(matches!(
                    *source,
                    FetchError::Navigation { ref reason, .. } if reason == "fail 2"
                ));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_zero_attempts_still_runs_once() {
        let calls = &AtomicU32::new(0);
        let _ = RetryExecutor::new(0)
            .run("once", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(FetchError::NoPage)
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), _> = fast(3)
            .run("missing page", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(FetchError::Status {
                    url: "https://example.com/gone".to_string(),
                    status: 404,
                })
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        match result {
            Err(FetchError::RetriesExhausted { attempts, source, .. }) => {
                assert_eq!(attempts, 1);
                assert!(matches!(*source, FetchError::Status { status: 404, .. }));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
