//! Concurrent job processor.

use crate::error::{ShutdownError, SubmitError};
use crate::metrics::names;
use crate::retry::{Disposition, Outcome, RetryPolicy};
use crate::semaphore::Semaphore;
use ferroq_core::JobRecord;
use ferroq_executor::Executor;
use ferroq_store::JobStore;
use metrics::{counter, gauge, histogram};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument};

/// Accepts jobs, runs each in its own task against the executor, and
/// applies the retry decision to the store.
///
/// Admission is bounded by the semaphore: `submit` returns as soon as a
/// token is acquired, never waiting for execution. Shutdown is
/// cooperative - in-flight tasks are drained, not aborted.
pub struct Processor {
    store: Arc<dyn JobStore>,
    executor: Arc<dyn Executor>,
    semaphore: Arc<Semaphore>,
    retry_policy: RetryPolicy,
    running: AtomicBool,
    admission: CancellationToken,
}

impl Processor {
    /// Creates a processor with the given concurrency cap.
    pub fn new(
        store: Arc<dyn JobStore>,
        executor: Arc<dyn Executor>,
        retry_policy: RetryPolicy,
        concurrency: usize,
    ) -> Self {
        Self {
            store,
            executor,
            semaphore: Arc::new(Semaphore::new(concurrency)),
            retry_policy,
            running: AtomicBool::new(true),
            admission: CancellationToken::new(),
        }
    }

    /// Submits a job for execution.
    ///
    /// Blocks until the semaphore admits the job, then spawns the task and
    /// returns. The only errors are lifecycle ones; job-content problems
    /// flow through the task as execution outcomes.
    pub async fn submit(&self, job: JobRecord) -> Result<(), SubmitError> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(SubmitError::ShuttingDown);
        }

        if !self.semaphore.acquire(&self.admission).await {
            return if self.running.load(Ordering::SeqCst) {
                Err(SubmitError::Cancelled)
            } else {
                Err(SubmitError::ShuttingDown)
            };
        }

        counter!(names::JOBS_SUBMITTED_TOTAL).increment(1);
        gauge!(names::JOBS_ACTIVE).set(self.semaphore.active() as f64);

        let store = self.store.clone();
        let executor = self.executor.clone();
        let semaphore = self.semaphore.clone();
        let retry_policy = self.retry_policy.clone();

        let _: JoinHandle<()> = tokio::spawn(
            async move {
                process_job(job, store, executor, retry_policy).await;
                semaphore.release();
                gauge!(names::JOBS_ACTIVE).set(semaphore.active() as f64);
            }
            .instrument(tracing::info_span!("job")),
        );

        Ok(())
    }

    /// Number of jobs currently in flight.
    #[must_use]
    pub fn active(&self) -> usize {
        self.semaphore.active()
    }

    /// Concurrency cap.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.semaphore.capacity()
    }

    /// Whether the processor still accepts submissions.
    #[must_use]
    pub fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stops accepting work, cancels blocked admissions, and waits for
    /// in-flight jobs to drain.
    ///
    /// On deadline the remaining tasks are left to complete on their own;
    /// they are cooperative and are not aborted.
    pub async fn shutdown(&self, deadline: Duration) -> Result<(), ShutdownError> {
        info!("Processor shutting down...");
        self.running.store(false, Ordering::SeqCst);
        self.admission.cancel();

        if self.semaphore.wait_with_timeout(deadline).await {
            info!("Processor drained");
            Ok(())
        } else {
            let active = self.semaphore.active();
            warn!(active, "Shutdown deadline exceeded; leaving in-flight jobs to finish");
            Err(ShutdownError::DeadlineExceeded { active })
        }
    }
}

/// Runs one job to a terminal outcome and applies the retry decision.
async fn process_job(
    mut job: JobRecord,
    store: Arc<dyn JobStore>,
    executor: Arc<dyn Executor>,
    retry_policy: RetryPolicy,
) {
    let started = Instant::now();

    let outcome = match executor.execute(&job).await {
        Ok(result) if result.is_success() => {
            debug!(
                jid = %job.jid,
                class = %job.class,
                execution_time = result.execution_time,
                "Job succeeded"
            );
            Outcome::Success
        }
        Ok(result) => {
            let message = result
                .error_message
                .unwrap_or_else(|| "execution failed".to_string());
            warn!(
                jid = %job.jid,
                class = %job.class,
                attempt = job.retry + 1,
                error = %message,
                "Job execution failed"
            );
            job.set_error(message, "ExecutionError");
            Outcome::ExecutorFailure
        }
        Err(e) => {
            warn!(
                jid = %job.jid,
                class = %job.class,
                attempt = job.retry + 1,
                error = %e,
                "Executor unreachable"
            );
            job.set_error(e.to_string(), "TransportError");
            Outcome::TransportError
        }
    };

    histogram!(names::JOB_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

    match retry_policy.decide(&job, outcome) {
        Disposition::Drop => {
            counter!(names::JOBS_SUCCEEDED_TOTAL).increment(1);
        }
        Disposition::Schedule(delay) => {
            counter!(names::JOBS_FAILED_TOTAL).increment(1);
            counter!(names::JOBS_RETRIED_TOTAL).increment(1);
            if let Err(e) = store.schedule_retry(&mut job, delay).await {
                error!(jid = %job.jid, error = %e, "Failed to schedule retry");
            }
        }
        Disposition::Dead => {
            counter!(names::JOBS_FAILED_TOTAL).increment(1);
            counter!(names::JOBS_DEAD_LETTERED_TOTAL).increment(1);
            if let Err(e) = store.move_to_dead(&mut job).await {
                error!(jid = %job.jid, error = %e, "Failed to move job to dead set");
            }
        }
    }
}
