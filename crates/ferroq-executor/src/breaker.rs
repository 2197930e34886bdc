//! Circuit breaker wrapper around an executor transport.

use crate::error::{ExecutorError, ExecutorResult};
use crate::Executor;
use async_trait::async_trait;
use ferroq_core::{ExecutionResult, JobRecord};
use ferroq_resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitState};

/// Wraps a transport with a circuit breaker.
///
/// Only transport-level errors count toward opening the circuit; a
/// completed round-trip whose body reports job failure is a healthy
/// dependency and records success. While the circuit is open, `execute`
/// fails fast with [`ExecutorError::CircuitOpen`] without touching the
/// sidecar. Health probes bypass the breaker so operators can watch a
/// sick sidecar recover.
pub struct CircuitExecutor<E> {
    inner: E,
    breaker: CircuitBreaker,
}

impl<E> CircuitExecutor<E> {
    /// Wraps the given transport.
    pub fn new(inner: E, config: CircuitBreakerConfig) -> Self {
        Self {
            inner,
            breaker: CircuitBreaker::new("executor", config),
        }
    }

    /// Current breaker state.
    pub fn breaker_state(&self) -> CircuitState {
        self.breaker.state()
    }
}

#[async_trait]
impl<E: Executor> Executor for CircuitExecutor<E> {
    async fn execute(&self, job: &JobRecord) -> ExecutorResult<ExecutionResult> {
        if !self.breaker.allow_request() {
            return Err(ExecutorError::CircuitOpen);
        }

        match self.inner.execute(job).await {
            Ok(result) => {
                self.breaker.record_success();
                Ok(result)
            }
            Err(e) => {
                self.breaker.record_failure();
                Err(e)
            }
        }
    }

    async fn health(&self) -> ExecutorResult<()> {
        self.inner.health().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Transport double that fails a fixed number of times, then succeeds.
    struct FlakyExecutor {
        calls: AtomicU32,
        failures: u32,
    }

    impl FlakyExecutor {
        fn failing(failures: u32) -> Self {
            Self {
                calls: AtomicU32::new(0),
                failures,
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Executor for FlakyExecutor {
        async fn execute(&self, _job: &JobRecord) -> ExecutorResult<ExecutionResult> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(ExecutorError::Status {
                    status: 500,
                    message: "boom".to_string(),
                })
            } else {
                Ok(ExecutionResult::success(0.01))
            }
        }

        async fn health(&self) -> ExecutorResult<()> {
            Ok(())
        }
    }

    fn config(max_failures: u64, reset_timeout: Duration) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            max_failures,
            reset_timeout,
        }
    }

    fn job() -> JobRecord {
        JobRecord::new("X", vec![], "default")
    }

    #[tokio::test]
    async fn test_opens_after_max_failures_and_fails_fast() {
        let executor = CircuitExecutor::new(
            FlakyExecutor::failing(u32::MAX),
            config(2, Duration::from_secs(30)),
        );

        let _ = executor.execute(&job()).await;
        let _ = executor.execute(&job()).await;
        assert_eq!(executor.breaker_state(), CircuitState::Open);
        assert_eq!(executor.inner.calls(), 2);

        // Third call fails fast without reaching the transport.
        let err = executor.execute(&job()).await.unwrap_err();
        assert!(matches!(err, ExecutorError::CircuitOpen));
        assert_eq!(executor.inner.calls(), 2);
    }

    #[tokio::test]
    async fn test_half_open_probe_closes_on_success() {
        let executor = CircuitExecutor::new(
            FlakyExecutor::failing(1),
            config(1, Duration::from_millis(20)),
        );

        let _ = executor.execute(&job()).await;
        assert_eq!(executor.breaker_state(), CircuitState::Open);

        tokio::time::sleep(Duration::from_millis(30)).await;
        let result = executor.execute(&job()).await.unwrap();
        assert!(result.is_success());
        assert_eq!(executor.breaker_state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_reported_job_failure_records_breaker_success() {
        struct AlwaysJobFailure;

        #[async_trait]
        impl Executor for AlwaysJobFailure {
            async fn execute(&self, _job: &JobRecord) -> ExecutorResult<ExecutionResult> {
                Ok(ExecutionResult::failure("user logic raised", 0.1))
            }

            async fn health(&self) -> ExecutorResult<()> {
                Ok(())
            }
        }

        let executor = CircuitExecutor::new(AlwaysJobFailure, config(1, Duration::from_secs(30)));
        for _ in 0..5 {
            let result = executor.execute(&job()).await.unwrap();
            assert!(!result.is_success());
        }
        assert_eq!(executor.breaker_state(), CircuitState::Closed);
    }
}
