//! Metric names for the orchestrator.
//!
//! Only the `metrics` facade is used; wiring an exporter is left to the
//! deployment.

use metrics::{describe_counter, describe_gauge, describe_histogram};

/// Metric names.
pub mod names {
    /// Total jobs pulled from the store and submitted.
    pub const JOBS_SUBMITTED_TOTAL: &str = "ferroq_jobs_submitted_total";
    /// Total jobs that completed successfully.
    pub const JOBS_SUCCEEDED_TOTAL: &str = "ferroq_jobs_succeeded_total";
    /// Total job attempts that failed (executor-reported or transport).
    pub const JOBS_FAILED_TOTAL: &str = "ferroq_jobs_failed_total";
    /// Total jobs scheduled for retry.
    pub const JOBS_RETRIED_TOTAL: &str = "ferroq_jobs_retried_total";
    /// Total jobs moved to the dead set.
    pub const JOBS_DEAD_LETTERED_TOTAL: &str = "ferroq_jobs_dead_lettered_total";

    /// Jobs currently in flight.
    pub const JOBS_ACTIVE: &str = "ferroq_jobs_active";

    /// Wall-clock job duration in seconds, as measured by the processor.
    pub const JOB_DURATION_SECONDS: &str = "ferroq_job_duration_seconds";

    /// Scheduled entries promoted back to their queues.
    pub const SCHEDULER_PROMOTED_TOTAL: &str = "ferroq_scheduler_promoted_total";
    /// Poll loop errors against the store.
    pub const POLL_ERRORS_TOTAL: &str = "ferroq_poll_errors_total";
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(names::JOBS_SUBMITTED_TOTAL, "Jobs pulled and submitted");
    describe_counter!(names::JOBS_SUCCEEDED_TOTAL, "Jobs completed successfully");
    describe_counter!(names::JOBS_FAILED_TOTAL, "Job attempts that failed");
    describe_counter!(names::JOBS_RETRIED_TOTAL, "Jobs scheduled for retry");
    describe_counter!(
        names::JOBS_DEAD_LETTERED_TOTAL,
        "Jobs moved to the dead set"
    );
    describe_gauge!(names::JOBS_ACTIVE, "Jobs currently in flight");
    describe_histogram!(
        names::JOB_DURATION_SECONDS,
        "Wall-clock job duration in seconds"
    );
    describe_counter!(
        names::SCHEDULER_PROMOTED_TOTAL,
        "Scheduled entries promoted back to their queues"
    );
    describe_counter!(names::POLL_ERRORS_TOTAL, "Poll loop errors against the store");
}
