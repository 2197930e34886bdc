//! Transport-level retry backoff schedule.

use std::time::Duration;

/// Quadratic backoff schedule for transport retries against the executor.
///
/// Attempt `n` (1-based) sleeps `n^2 x unit` before retrying: with the
/// default unit that is 100ms, 400ms, 900ms. This is distinct from the
/// job-level retry policy, which operates on whole jobs.
#[derive(Debug, Clone)]
pub struct BackoffSchedule {
    /// Additional attempts after the initial request.
    pub max_retries: u32,
    /// Base unit multiplied by the squared attempt number.
    pub unit: Duration,
}

impl Default for BackoffSchedule {
    fn default() -> Self {
        Self {
            max_retries: 3,
            unit: Duration::from_millis(100),
        }
    }
}

impl BackoffSchedule {
    /// Delay before the given retry attempt (1-based).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        self.unit.saturating_mul(attempt.saturating_mul(attempt))
    }

    /// Whether the given retry attempt exceeds the budget.
    #[must_use]
    pub fn is_exhausted(&self, attempt: u32) -> bool {
        attempt > self.max_retries
    }
}
