//! Poll loop and scheduled-set sweep.

use crate::metrics::names;
use crate::processor::Processor;
use ferroq_config::{SchedulerConfig, WorkerConfig};
use ferroq_store::JobStore;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Backoff after a failed poll, so a sick store is not hot-looped.
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Owns the long-running poll loop and the periodic promotion sweep.
///
/// The loop pulls one job at a time and hands it to the processor;
/// `submit` blocks on the semaphore, which is what stops the supervisor
/// from overfetching when the executor is saturated.
pub struct Supervisor {
    store: Arc<dyn JobStore>,
    processor: Arc<Processor>,
    queues: Vec<String>,
    poll_interval: Duration,
    promote_interval: Duration,
}

impl Supervisor {
    /// Creates a supervisor from configuration.
    pub fn new(
        store: Arc<dyn JobStore>,
        processor: Arc<Processor>,
        worker: &WorkerConfig,
        scheduler: &SchedulerConfig,
    ) -> Self {
        Self {
            store,
            processor,
            queues: worker.queues.clone(),
            poll_interval: worker.poll_interval(),
            promote_interval: scheduler.promote_interval(),
        }
    }

    /// Runs until the token is cancelled. In-flight work is drained by the
    /// caller via [`Processor::shutdown`] afterwards.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            queues = ?self.queues,
            concurrency = self.processor.capacity(),
            "Supervisor started"
        );

        let sweeper = tokio::spawn(promote_loop(
            self.store.clone(),
            self.promote_interval,
            shutdown.clone(),
        ));

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            match self.store.poll(&self.queues).await {
                Err(e) => {
                    counter!(names::POLL_ERRORS_TOTAL).increment(1);
                    warn!(error = %e, "Poll failed; backing off");
                    sleep_or_cancel(POLL_ERROR_BACKOFF, &shutdown).await;
                }
                Ok(None) => {
                    sleep_or_cancel(self.poll_interval, &shutdown).await;
                }
                Ok(Some(job)) => {
                    // Keep a copy so a refused submission can be pushed
                    // back; the record would otherwise be lost in flight.
                    let retained = job.clone();
                    if let Err(e) = self.processor.submit(job).await {
                        warn!(jid = %retained.jid, error = %e, "Submit refused; returning job to queue");
                        if let Err(e) = self.store.enqueue(&retained).await {
                            error!(jid = %retained.jid, error = %e, "Failed to return job to queue");
                        }
                    }
                }
            }
        }

        let _ = sweeper.await;
        info!("Supervisor stopped");
    }
}

/// Periodically promotes due scheduled entries back onto their queues.
async fn promote_loop(
    store: Arc<dyn JobStore>,
    interval: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await; // Skip first immediate tick

    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                match store.promote_scheduled().await {
                    Ok(0) => {}
                    Ok(promoted) => {
                        counter!(names::SCHEDULER_PROMOTED_TOTAL).increment(promoted);
                        debug!(count = promoted, "Promoted scheduled jobs");
                    }
                    Err(e) => {
                        warn!(error = %e, "Scheduled sweep failed");
                    }
                }
            }
        }
    }
}

async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) {
    tokio::select! {
        () = cancel.cancelled() => {}
        () = tokio::time::sleep(duration) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryPolicy;
    use async_trait::async_trait;
    use ferroq_core::{ExecutionResult, JobRecord};
    use ferroq_executor::{Executor, ExecutorResult};
    use ferroq_store::StoreResult;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Store double that serves a fixed backlog, then idles.
    #[derive(Default)]
    struct BacklogStore {
        backlog: Mutex<VecDeque<JobRecord>>,
        returned: Mutex<Vec<JobRecord>>,
        promote_calls: AtomicU32,
    }

    #[async_trait]
    impl JobStore for BacklogStore {
        async fn poll(&self, _queues: &[String]) -> StoreResult<Option<JobRecord>> {
            Ok(self.backlog.lock().pop_front())
        }

        async fn enqueue(&self, job: &JobRecord) -> StoreResult<()> {
            self.returned.lock().push(job.clone());
            Ok(())
        }

        async fn schedule_retry(
            &self,
            _job: &mut JobRecord,
            _delay: Duration,
        ) -> StoreResult<()> {
            Ok(())
        }

        async fn move_to_dead(&self, _job: &mut JobRecord) -> StoreResult<()> {
            Ok(())
        }

        async fn promote_scheduled(&self) -> StoreResult<u64> {
            self.promote_calls.fetch_add(1, Ordering::SeqCst);
            Ok(0)
        }

        async fn queue_size(&self, _queue: &str) -> StoreResult<u64> {
            Ok(self.backlog.lock().len() as u64)
        }

        async fn close(&self) {}
    }

    struct CountingExecutor {
        calls: AtomicU32,
    }

    #[async_trait]
    impl Executor for CountingExecutor {
        async fn execute(&self, _job: &JobRecord) -> ExecutorResult<ExecutionResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ExecutionResult::success(0.001))
        }

        async fn health(&self) -> ExecutorResult<()> {
            Ok(())
        }
    }

    fn worker_config() -> WorkerConfig {
        WorkerConfig {
            concurrency: 2,
            queues: vec!["default".to_string()],
            poll_interval_ms: 10,
            shutdown_timeout_secs: 1,
        }
    }

    fn scheduler_config(secs: u64) -> SchedulerConfig {
        SchedulerConfig {
            promote_interval_secs: secs,
        }
    }

    #[tokio::test]
    async fn test_drains_backlog_and_stops_on_cancel() {
        let store = Arc::new(BacklogStore::default());
        for i in 0..3 {
            store
                .backlog
                .lock()
                .push_back(JobRecord::new(format!("W{i}"), vec![], "default"));
        }

        let executor = Arc::new(CountingExecutor {
            calls: AtomicU32::new(0),
        });
        let processor = Arc::new(Processor::new(
            store.clone(),
            executor.clone(),
            RetryPolicy::default(),
            2,
        ));
        let supervisor = Supervisor::new(
            store.clone(),
            processor.clone(),
            &worker_config(),
            &scheduler_config(60),
        );

        let shutdown = CancellationToken::new();
        let handle = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { supervisor.run(shutdown).await })
        };

        tokio::time::sleep(Duration::from_millis(200)).await;
        shutdown.cancel();
        handle.await.unwrap();
        processor.shutdown(Duration::from_secs(1)).await.unwrap();

        assert_eq!(executor.calls.load(Ordering::SeqCst), 3);
        assert!(store.backlog.lock().is_empty());
    }

    #[tokio::test]
    async fn test_refused_submit_returns_job_to_queue() {
        let store = Arc::new(BacklogStore::default());
        let job = JobRecord::new("W", vec![], "default");
        let jid = job.jid.clone();
        store.backlog.lock().push_back(job);

        let executor = Arc::new(CountingExecutor {
            calls: AtomicU32::new(0),
        });
        let processor = Arc::new(Processor::new(
            store.clone(),
            executor,
            RetryPolicy::default(),
            1,
        ));
        // Shut the processor down first so the submit is refused.
        processor.shutdown(Duration::from_millis(10)).await.unwrap();

        let supervisor = Supervisor::new(
            store.clone(),
            processor,
            &worker_config(),
            &scheduler_config(60),
        );

        let shutdown = CancellationToken::new();
        let handle = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { supervisor.run(shutdown).await })
        };

        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown.cancel();
        handle.await.unwrap();

        let returned = store.returned.lock();
        assert!(returned.iter().any(|j| j.jid == jid));
    }

    #[tokio::test]
    async fn test_promotion_sweep_runs_periodically() {
        let store = Arc::new(BacklogStore::default());
        let executor = Arc::new(CountingExecutor {
            calls: AtomicU32::new(0),
        });
        let processor = Arc::new(Processor::new(
            store.clone(),
            executor,
            RetryPolicy::default(),
            1,
        ));
        let supervisor = Supervisor::new(
            store.clone(),
            processor,
            &worker_config(),
            &scheduler_config(1),
        );

        let shutdown = CancellationToken::new();
        let handle = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { supervisor.run(shutdown).await })
        };

        tokio::time::sleep(Duration::from_millis(2200)).await;
        shutdown.cancel();
        handle.await.unwrap();

        assert!(store.promote_calls.load(Ordering::SeqCst) >= 2);
    }
}
