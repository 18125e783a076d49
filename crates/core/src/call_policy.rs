use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::config::CollaboratorsConfig;
use crate::errors::CollaboratorError;

/// Timeout plus a single bounded retry around every collaborator call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    /// Pause before the retry attempt.
    pub backoff: Duration,
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 1,
            backoff: Duration::from_millis(250),
        }
    }
}

impl From<&CollaboratorsConfig> for CallPolicy {
    fn from(config: &CollaboratorsConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
            max_retries: config.max_retries.min(1),
            ..Self::default()
        }
    }
}

impl CallPolicy {
    /// Reads: timeouts and transport failures are retried once.
    pub async fn run<T, F, Fut>(
        &self,
        operation: &'static str,
        call: F,
    ) -> Result<T, CollaboratorError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CollaboratorError>>,
    {
        self.execute(operation, true, call).await
    }

    /// Non-idempotent writes: a timed-out attempt may already have landed, so
    /// only transport failures are retried.
    pub async fn run_write<T, F, Fut>(
        &self,
        operation: &'static str,
        call: F,
    ) -> Result<T, CollaboratorError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CollaboratorError>>,
    {
        self.execute(operation, false, call).await
    }

    async fn execute<T, F, Fut>(
        &self,
        operation: &'static str,
        retry_timeouts: bool,
        mut call: F,
    ) -> Result<T, CollaboratorError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CollaboratorError>>,
    {
        let mut attempt = 0_u32;
        loop {
            let outcome = match tokio::time::timeout(self.timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(CollaboratorError::Timeout {
                    operation,
                    timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                }),
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(error) if self.should_retry(&error, retry_timeouts, attempt) => {
                    warn!(
                        event_name = "collaborator.call.retry",
                        operation,
                        attempt,
                        backoff_ms = u64::try_from(self.backoff.as_millis()).unwrap_or(u64::MAX),
                        error = %error,
                        "collaborator call failed; retrying once"
                    );
                    tokio::time::sleep(self.backoff).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }

    fn should_retry(&self, error: &CollaboratorError, retry_timeouts: bool, attempt: u32) -> bool {
        if attempt >= self.max_retries || !error.is_retryable() {
            return false;
        }
        retry_timeouts || !matches!(error, CollaboratorError::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::{Duration, Instant};

    use super::CallPolicy;
    use crate::errors::CollaboratorError;

    #[tokio::test]
    async fn retries_a_transport_failure_exactly_once() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = CallPolicy {
            timeout: Duration::from_secs(1),
            max_retries: 1,
            backoff: Duration::ZERO,
        };

        let result = policy
            .run("users.list", move || async move {
                let attempt = counter.fetch_add(1, Ordering::SeqCst);
                if attempt == 0 {
                    Err(CollaboratorError::Transport("reset".to_owned()))
                } else {
                    Ok(attempt)
                }
            })
            .await;

        assert_eq!(result, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn gives_up_after_the_bounded_retry() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = CallPolicy {
            timeout: Duration::from_secs(1),
            max_retries: 1,
            backoff: Duration::ZERO,
        };

        let result: Result<(), _> = policy
            .run("chat.postMessage", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(CollaboratorError::Transport("down".to_owned()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn api_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = CallPolicy { backoff: Duration::ZERO, ..CallPolicy::default() };

        let result: Result<(), _> = policy
            .run("conversations.history", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(CollaboratorError::Api("channel_not_found".to_owned()))
            })
            .await;

        assert_eq!(result, Err(CollaboratorError::Api("channel_not_found".to_owned())));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stalled_calls_time_out() {
        let policy = CallPolicy {
            timeout: Duration::from_millis(10),
            max_retries: 0,
            backoff: Duration::ZERO,
        };

        let result: Result<(), _> = policy
            .run("users.list", || async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;

        assert!(matches!(
            result,
            Err(CollaboratorError::Timeout { operation: "users.list", timeout_ms: 10 })
        ));
    }

    #[tokio::test]
    async fn retry_waits_for_the_backoff() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = CallPolicy {
            timeout: Duration::from_secs(1),
            max_retries: 1,
            backoff: Duration::from_millis(40),
        };
        let started = Instant::now();

        let result = policy
            .run("users.list", move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(CollaboratorError::Transport("reset".to_owned()))
                } else {
                    Ok(())
                }
            })
            .await;

        assert_eq!(result, Ok(()));
        assert!(started.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn timed_out_writes_are_not_repeated() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = CallPolicy {
            timeout: Duration::from_millis(10),
            max_retries: 1,
            backoff: Duration::ZERO,
        };

        let result: Result<(), _> = policy
            .run_write("ledger.append", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;

        assert!(matches!(
            result,
            Err(CollaboratorError::Timeout { operation: "ledger.append", .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn writes_still_retry_transport_failures() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = CallPolicy {
            timeout: Duration::from_secs(1),
            max_retries: 1,
            backoff: Duration::ZERO,
        };

        let result = policy
            .run_write("chat.postMessage", move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(CollaboratorError::Transport("connection refused".to_owned()))
                } else {
                    Ok("ts-1")
                }
            })
            .await;

        assert_eq!(result, Ok("ts-1"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
