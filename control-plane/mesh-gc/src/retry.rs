//! Bounded retry for read-check-write operations that can lose an
//! optimistic-concurrency race.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::debug;

use crate::error::Error;

/// Backoff schedule: `steps` attempts, sleeping `duration` (grown by
/// `factor`, spread by up to `jitter * duration`) between them.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    pub steps: u32,
    pub duration: Duration,
    pub factor: f64,
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            steps: 5,
            duration: Duration::from_millis(10),
            factor: 1.0,
            jitter: 0.1,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based), without jitter.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1) as i32;
        self.duration.mul_f64(self.factor.powi(exp))
    }

    fn delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        if self.jitter <= 0.0 {
            return base;
        }
        let spread = rand::rng().random_range(0.0..=self.jitter);
        base + base.mul_f64(spread)
    }
}

/// Run `op` until it succeeds, fails with an error `retryable` rejects, or
/// `policy.steps` attempts are used up. Exhaustion wraps the last error in
/// [`Error::RetryExhausted`].
pub async fn retry_on<T, F, Fut, P>(
    policy: &RetryPolicy,
    retryable: P,
    mut op: F,
) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
    P: Fn(&Error) -> bool,
{
    let steps = policy.steps.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if retryable(&e) => {
                if attempt >= steps {
                    return Err(Error::RetryExhausted {
                        attempts: attempt,
                        source: Box::new(e),
                    });
                }
                let delay = policy.delay(attempt);
                debug!(attempt, ?delay, error = %e, "retrying after conflict");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// [`retry_on`] with [`Error::is_conflict`] as the predicate.
pub async fn retry_on_conflict<T, F, Fut>(
    policy: &RetryPolicy,
    op: F,
) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    retry_on(policy, Error::is_conflict, op).await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::store::{ObjectKey, ResourceKind};

    fn conflict() -> Error {
        Error::Conflict {
            kind: ResourceKind::CustomResourceDefinition,
            key: ObjectKey::cluster("servicemeshcontrolplanes.maistra.io"),
        }
    }

    fn quick(steps: u32) -> RetryPolicy {
        RetryPolicy {
            steps,
            duration: Duration::from_millis(1),
            factor: 1.0,
            jitter: 0.0,
        }
    }

    #[tokio::test]
    async fn succeeds_after_transient_conflicts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let out = retry_on_conflict(&quick(5), || async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(conflict())
            } else {
                Ok("updated")
            }
        })
        .await
        .unwrap();
        assert_eq!(out, "updated");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhaustion_reports_attempts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let err = retry_on_conflict(&quick(3), || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(conflict())
        })
        .await
        .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match err {
            Error::RetryExhausted { attempts, source } => {
                assert_eq!(attempts, 3);
                assert!(source.is_conflict());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let err = retry_on_conflict(&quick(5), || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(Error::Store("connection refused".into()))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Store(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn base_delay_grows_by_factor() {
        let policy = RetryPolicy {
            steps: 4,
            duration: Duration::from_millis(10),
            factor: 2.0,
            jitter: 0.0,
        };
        assert_eq!(policy.base_delay(1), Duration::from_millis(10));
        assert_eq!(policy.base_delay(3), Duration::from_millis(40));
        assert_eq!(policy.delay(2), Duration::from_millis(20));
    }
}
