//! Bounded, retrying execution of one kind of external call.
//!
//! A [`StageExecutor`] owns the permit pool for a single dependency. Every
//! attempt holds one permit for the duration of the call and releases it
//! before sleeping, so a job waiting out its backoff never blocks another
//! job's call.

use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use llmvis_core::StageConfig;
use tokio::sync::Semaphore;

/// Result of running one job through a stage, after all retries.
///
/// Failures from error returns and from panics look the same here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome<T> {
    Succeeded { payload: T, attempts: u32 },
    Failed { error: String, attempts: u32 },
}

impl<T> StageOutcome<T> {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, StageOutcome::Succeeded { .. })
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            StageOutcome::Succeeded { attempts, .. } | StageOutcome::Failed { attempts, .. } => {
                *attempts
            }
        }
    }

    #[must_use]
    pub fn payload(&self) -> Option<&T> {
        match self {
            StageOutcome::Succeeded { payload, .. } => Some(payload),
            StageOutcome::Failed { .. } => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            StageOutcome::Succeeded { .. } => None,
            StageOutcome::Failed { error, .. } => Some(error),
        }
    }

    pub fn into_payload(self) -> Option<T> {
        match self {
            StageOutcome::Succeeded { payload, .. } => Some(payload),
            StageOutcome::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first; at least 1.
    pub max_attempts: u32,
    pub backoff_base: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn from_stage_config(config: &StageConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff_base: config.backoff_base(),
        }
    }
}

/// Sleep before retry number `retry` (1-based): `base × 2^(retry-1)`.
///
/// | Retry | base = 1 s |
/// |-------|------------|
/// | 1     | 1 s        |
/// | 2     | 2 s        |
/// | 3     | 4 s        |
#[must_use]
pub fn backoff_delay(base: Duration, retry: u32) -> Duration {
    let exponent = retry.saturating_sub(1).min(16);
    base.saturating_mul(1u32 << exponent)
}

/// Runs calls against one dependency with a shared concurrency cap and a
/// retry policy. Clones share the same permit pool.
#[derive(Debug, Clone)]
pub struct StageExecutor {
    name: &'static str,
    permits: Arc<Semaphore>,
    width: usize,
    policy: RetryPolicy,
}

impl StageExecutor {
    #[must_use]
    pub fn new(name: &'static str, config: StageConfig) -> Self {
        let width = config.max_concurrency.max(1);
        Self {
            name,
            permits: Arc::new(Semaphore::new(width)),
            width,
            policy: RetryPolicy::from_stage_config(&config),
        }
    }

    /// Maximum number of calls this stage runs at once.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Calls `operation` until it succeeds or the attempt budget runs out.
    ///
    /// Never fails: errors and panics are folded into
    /// [`StageOutcome::Failed`] carrying the last cause.
    pub async fn execute<T, E, F, Fut>(&self, job_index: usize, mut operation: F) -> StageOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let max_attempts = self.policy.max_attempts;
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let error = {
                let Ok(_permit) = self.permits.acquire().await else {
                    return StageOutcome::Failed {
                        error: format!("{} stage is shut down", self.name),
                        attempts: attempt - 1,
                    };
                };
                match AssertUnwindSafe(operation()).catch_unwind().await {
                    Ok(Ok(payload)) => {
                        return StageOutcome::Succeeded {
                            payload,
                            attempts: attempt,
                        }
                    }
                    Ok(Err(err)) => err.to_string(),
                    Err(panic) => panic_message(panic.as_ref()),
                }
            };

            if attempt >= max_attempts {
                tracing::warn!(
                    stage = self.name,
                    job_index,
                    attempt,
                    max_attempts,
                    error = %error,
                    "stage attempt failed, no attempts left"
                );
                return StageOutcome::Failed {
                    error,
                    attempts: attempt,
                };
            }

            let delay = backoff_delay(self.policy.backoff_base, attempt);
            tracing::warn!(
                stage = self.name,
                job_index,
                attempt,
                max_attempts,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %error,
                "stage attempt failed, retrying after backoff"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn config(max_attempts: u32) -> StageConfig {
        StageConfig {
            max_concurrency: 2,
            max_attempts,
            backoff_base_ms: 0,
        }
    }

    #[test]
    fn backoff_doubles_from_base() {
        let base = Duration::from_secs(1);
        assert_eq!(backoff_delay(base, 1), Duration::from_secs(1));
        assert_eq!(backoff_delay(base, 2), Duration::from_secs(2));
        assert_eq!(backoff_delay(base, 3), Duration::from_secs(4));
    }

    #[test]
    fn backoff_saturates_instead_of_overflowing() {
        let delay = backoff_delay(Duration::from_secs(u64::MAX / 2), 40);
        assert_eq!(delay, Duration::MAX);
    }

    #[test]
    fn zero_settings_are_clamped() {
        let executor = StageExecutor::new(
            "query",
            StageConfig {
                max_concurrency: 0,
                max_attempts: 0,
                backoff_base_ms: 0,
            },
        );
        assert_eq!(executor.width(), 1);
        assert_eq!(executor.policy().max_attempts, 1);
    }

    #[tokio::test]
    async fn succeeds_on_first_attempt() {
        let executor = StageExecutor::new("query", config(3));
        let outcome = executor
            .execute(0, || async { Ok::<_, String>("hello".to_string()) })
            .await;
        assert_eq!(
            outcome,
            StageOutcome::Succeeded {
                payload: "hello".to_string(),
                attempts: 1
            }
        );
    }

    #[tokio::test]
    async fn retries_until_success() {
        let executor = StageExecutor::new("query", config(3));
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let outcome = executor
            .execute(0, move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(format!("attempt {n} failed"))
                } else {
                    Ok(n)
                }
            })
            .await;
        assert_eq!(outcome.payload(), Some(&3));
        assert_eq!(outcome.attempts(), 3);
    }

    #[tokio::test]
    async fn stops_after_max_attempts_with_last_error() {
        let executor = StageExecutor::new("translation", config(3));
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let outcome: StageOutcome<()> = executor
            .execute(7, move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Err(format!("boom {n}"))
            })
            .await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(outcome.error(), Some("boom 3"));
        assert_eq!(outcome.attempts(), 3);
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn panics_become_failures() {
        let executor = StageExecutor::new("query", config(2));
        let outcome: StageOutcome<String> = executor
            .execute(0, || async {
                if true {
                    panic!("backend exploded");
                }
                Ok::<_, String>(String::new())
            })
            .await;
        assert_eq!(outcome.attempts(), 2);
        assert_eq!(outcome.error(), Some("panicked: backend exploded"));
    }
}
