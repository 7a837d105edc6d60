//! Fixed-delay retry for transient daemon failures.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{BackendError, BackendResult};

/// Number of attempts and delay between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Pause between consecutive attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Policy with a custom delay and the default attempt count.
    #[must_use]
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }
}

/// Run `operation` until it succeeds, fails permanently, or the policy is
/// exhausted.
///
/// Only [`BackendError::is_transient`] failures are retried. The wait between
/// attempts ends early when `cancel` fires, yielding
/// [`BackendError::Cancelled`].
///
/// # Errors
///
/// Returns the last failure produced by `operation`, or
/// [`BackendError::Cancelled`].
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut operation: F,
) -> BackendResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = BackendResult<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        if cancel.is_cancelled() {
            return Err(BackendError::Cancelled);
        }

        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !err.is_transient() || attempt >= max_attempts {
            debug!(attempt, error = %err, "giving up");
            return Err(err);
        }

        warn!(
            attempt,
            max_attempts,
            delay_ms = u64::try_from(policy.delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "transient daemon failure; retrying"
        );

        tokio::select! {
            () = cancel.cancelled() => return Err(BackendError::Cancelled),
            () = tokio::time::sleep(policy.delay) => {}
        }
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportKind;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn fast() -> RetryPolicy {
        RetryPolicy::with_delay(Duration::from_millis(10))
    }

    #[test]
    fn default_policy_is_three_attempts_one_second_apart() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn transient_failures_use_every_attempt() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&attempts);
        let result: BackendResult<()> = with_retry(&fast(), &CancellationToken::new(), || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(BackendError::transport(TransportKind::CannotConnect, "refused"))
            }
        })
        .await;

        assert!(matches!(result, Err(BackendError::Transport(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_failures_are_not_retried() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&attempts);
        let result: BackendResult<()> = with_retry(&fast(), &CancellationToken::new(), || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(BackendError::AuthenticationFailed)
            }
        })
        .await;

        assert_eq!(result, Err(BackendError::AuthenticationFailed));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn recovers_after_a_transient_failure() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&attempts);
        let result = with_retry(&fast(), &CancellationToken::new(), || {
            let counter = Arc::clone(&counter);
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(BackendError::Timeout)
                } else {
                    Ok("sent")
                }
            }
        })
        .await;

        assert_eq!(result, Ok("sent"));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn attempts_are_spaced_by_the_delay() {
        let started = Instant::now();
        let result: BackendResult<()> =
            with_retry(&RetryPolicy::default(), &CancellationToken::new(), || async {
                Err(BackendError::Timeout)
            })
            .await;

        assert_eq!(result, Err(BackendError::Timeout));
        // Two waits between three attempts, none after the last.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(2), "waited {elapsed:?}");
        assert!(elapsed < Duration::from_secs(3), "waited {elapsed:?}");
    }

    #[tokio::test]
    async fn cancellation_interrupts_the_wait() {
        let cancel = CancellationToken::new();
        let policy = RetryPolicy::with_delay(Duration::from_secs(60));
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&attempts);
        let trigger = cancel.clone();

        let result: BackendResult<()> = with_retry(&policy, &cancel, || {
            let counter = Arc::clone(&counter);
            let trigger = trigger.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                trigger.cancel();
                Err(BackendError::ConnectionFailed("reset".into()))
            }
        })
        .await;

        assert_eq!(result, Err(BackendError::Cancelled));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancelled_token_skips_the_operation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result: BackendResult<()> =
            with_retry(&fast(), &cancel, || async { Ok(()) }).await;
        assert_eq!(result, Err(BackendError::Cancelled));
    }
}
