//! Retry with capped exponential back-off and jitter for API requests.
//!
//! Transient failures (timeouts, connection errors, 5xx, 429) are retried up
//! to the configured budget. Everything else, including other 4xx statuses
//! and malformed bodies, is returned on the first attempt.

use std::future::Future;
use std::time::Duration;

use compwatch_core::ApiSettings;

use crate::error::CollectionError;

/// Retry budget and back-off schedule for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
}

impl RetryPolicy {
    #[must_use]
    pub fn from_settings(settings: &ApiSettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            backoff_base_ms: settings.retry_backoff_base_ms,
            backoff_max_ms: settings.retry_backoff_max_ms,
        }
    }

    /// Delay before retry number `attempt` (1-based), before jitter.
    #[must_use]
    pub fn base_delay_ms(&self, attempt: u32) -> u64 {
        let shift = attempt.saturating_sub(1).min(20);
        self.backoff_base_ms
            .saturating_mul(1u64 << shift)
            .min(self.backoff_max_ms)
    }

    /// Delay with ±25 % jitter applied.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn jittered_delay_ms(&self, attempt: u32) -> u64 {
        let capped = self.base_delay_ms(attempt);
        (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64
    }
}

pub(crate) fn is_transient(err: &CollectionError) -> bool {
    match err {
        CollectionError::Http(e) => e.is_timeout() || e.is_connect(),
        CollectionError::ServerError { .. } | CollectionError::RateLimited { .. } => true,
        _ => false,
    }
}

/// Runs `operation` until it succeeds, fails permanently, or the retry budget
/// runs out. Returns the value together with the number of retries spent.
///
/// # Errors
///
/// Non-transient errors are returned unchanged. A transient error on the last
/// allowed attempt is wrapped in [`CollectionError::RetriesExhausted`].
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    mut operation: F,
) -> Result<(T, u32), CollectionError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CollectionError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    tracing::info!(attempts = attempt + 1, "request succeeded after retrying");
                }
                return Ok((value, attempt));
            }
            Err(err) if !is_transient(&err) => return Err(err),
            Err(err) if attempt >= policy.max_retries => {
                return Err(CollectionError::RetriesExhausted {
                    attempts: attempt + 1,
                    last: Box::new(err),
                });
            }
            Err(err) => {
                attempt += 1;
                let delay_ms = policy.jittered_delay_ms(attempt);
                tracing::warn!(
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms,
                    error = %err,
                    "transient API error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    fn no_wait(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            backoff_base_ms: 0,
            backoff_max_ms: 0,
        }
    }

    fn server_error() -> CollectionError {
        CollectionError::ServerError {
            status: 503,
            url: "http://api.test/products".to_owned(),
        }
    }

    #[test]
    fn delay_doubles_and_is_capped() {
        let policy = RetryPolicy {
            max_retries: 10,
            backoff_base_ms: 500,
            backoff_max_ms: 3_000,
        };
        assert_eq!(policy.base_delay_ms(1), 500);
        assert_eq!(policy.base_delay_ms(2), 1_000);
        assert_eq!(policy.base_delay_ms(3), 2_000);
        assert_eq!(policy.base_delay_ms(4), 3_000);
        assert_eq!(policy.base_delay_ms(40), 3_000);
    }

    #[test]
    fn jitter_stays_within_quarter_of_base() {
        let policy = RetryPolicy {
            max_retries: 3,
            backoff_base_ms: 1_000,
            backoff_max_ms: 60_000,
        };
        for _ in 0..100 {
            let d = policy.jittered_delay_ms(1);
            assert!((750..=1_250).contains(&d), "delay {d} outside jitter band");
        }
    }

    #[test]
    fn rejected_and_invalid_response_are_not_transient() {
        assert!(!is_transient(&CollectionError::Rejected {
            status: 401,
            url: String::new()
        }));
        assert!(!is_transient(&CollectionError::InvalidResponse {
            url: String::new(),
            reason: "x".to_owned()
        }));
        assert!(is_transient(&CollectionError::RateLimited { url: String::new() }));
        assert!(is_transient(&server_error()));
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let (value, retries) = retry_with_backoff(no_wait(3), || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, CollectionError>(42)
            }
        })
        .await
        .unwrap();
        assert_eq!(value, 42);
        assert_eq!(retries, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_transient_errors_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let (value, retries) = retry_with_backoff(no_wait(3), || {
            let c = Arc::clone(&c);
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 3 {
                    Err(server_error())
                } else {
                    Ok::<u32, CollectionError>(7)
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(value, 7);
        assert_eq!(retries, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn exhausting_budget_wraps_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(no_wait(2), || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, CollectionError>(server_error())
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(CollectionError::RetriesExhausted { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert!(matches!(*last, CollectionError::ServerError { status: 503, .. }));
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(no_wait(5), || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, CollectionError>(CollectionError::Rejected {
                    status: 403,
                    url: "http://api.test".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(CollectionError::Rejected { status: 403, .. })));
    }
}
