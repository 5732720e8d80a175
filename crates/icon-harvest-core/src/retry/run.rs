//! Retry loop with capped exponential backoff.

use std::future::Future;
use std::time::Duration;

use super::classify::is_transient;
use crate::error::HarvestError;

/// How often, and how patiently, a transient fetch failure is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per fetch, the first included.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Every fetch is attempted exactly once.
    pub fn single_attempt() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay after failed attempt number `attempt` (1-based): `base_delay`
    /// doubled per earlier failure, capped at `max_delay`. `None` once the
    /// attempts are used up.
    pub fn backoff(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        Some(self.base_delay.saturating_mul(factor).min(self.max_delay))
    }
}

/// Awaits `f` until it succeeds, fails with a non-transient error, or the
/// policy runs out of attempts. `what` names the operation in log lines.
pub async fn run_with_retry<F, Fut, T>(
    policy: &RetryPolicy,
    what: &str,
    mut f: F,
) -> Result<T, HarvestError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, HarvestError>>,
{
    let mut attempt = 1u32;
    loop {
        let err = match f().await {
            Ok(v) => return Ok(v),
            Err(e) => e,
        };
        let delay = match policy.backoff(attempt) {
            Some(d) if is_transient(&err) => d,
            _ => return Err(err),
        };
        tracing::warn!(
            attempt,
            delay_ms = delay.as_millis() as u64,
            "{} failed: {}; retrying",
            what,
            err
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        }
    }

    fn unavailable(context: &str) -> HarvestError {
        HarvestError::FetchStatus {
            context: context.to_string(),
            status: 503,
        }
    }

    #[test]
    fn backoff_doubles_up_to_the_cap() {
        let p = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
        };
        assert_eq!(p.backoff(1), Some(Duration::from_millis(100)));
        assert_eq!(p.backoff(2), Some(Duration::from_millis(200)));
        assert_eq!(p.backoff(3), Some(Duration::from_millis(350)));
        assert_eq!(p.backoff(9), Some(Duration::from_millis(350)));
        assert_eq!(p.backoff(10), None);
    }

    #[test]
    fn single_attempt_has_no_backoff() {
        assert_eq!(RetryPolicy::single_attempt().backoff(1), None);
    }

    #[tokio::test]
    async fn retries_throttled_then_succeeds() {
        let calls = AtomicU32::new(0);
        let out = run_with_retry(&fast_policy(3), "tags page", || async {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(unavailable("tags page"))
            } else {
                Ok(42)
            }
        })
        .await
        .unwrap();
        assert_eq!(out, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let err = run_with_retry(&fast_policy(3), "archive", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(unavailable("archive"))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, HarvestError::FetchStatus { status: 503, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_not_found() {
        let calls = AtomicU32::new(0);
        let err = run_with_retry(&fast_policy(5), "tag page", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(HarvestError::FetchStatus {
                context: "tag page".to_string(),
                status: 404,
            })
        })
        .await
        .unwrap_err();
        assert!(matches!(err, HarvestError::FetchStatus { status: 404, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn single_attempt_policy_never_retries() {
        let calls = AtomicU32::new(0);
        let _ = run_with_retry(&RetryPolicy::single_attempt(), "archive", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(unavailable("archive"))
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
