//! Job-level retry policy.

use ferroq_config::RetryConfig;
use ferroq_core::JobRecord;
use std::time::Duration;

/// How a job's attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The executor reported success.
    Success,
    /// The executor ran the job and reported failure.
    ExecutorFailure,
    /// The executor could not be reached (includes an open circuit).
    TransportError,
}

/// What to do with a completed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Success: the record is dropped (at-least-once, no explicit ack).
    Drop,
    /// Failure under the attempt cap: schedule a retry after the delay.
    Schedule(Duration),
    /// Attempt cap exhausted: move to the dead set.
    Dead,
}

/// Exponential backoff policy deciding retry vs. dead-letter.
///
/// Failure attempt `n` (1-based) waits `base_delay x 2^(n-1)`, clamped to
/// `max_delay`, plus a uniform jitter of 0-25% of the clamped value added
/// on top. A non-negative `max_retries` on the record overrides the
/// configured attempt cap for that job.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy from configuration.
    #[must_use]
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: Duration::from_secs(config.base_delay_secs),
            max_delay: Duration::from_secs(config.max_delay_secs),
        }
    }

    /// Decides the disposition for a completed job.
    #[must_use]
    pub fn decide(&self, job: &JobRecord, outcome: Outcome) -> Disposition {
        if outcome == Outcome::Success {
            return Disposition::Drop;
        }

        let cap = job.max_retries.unwrap_or(self.max_attempts);
        let attempt = job.retry + 1;

        if attempt > cap {
            Disposition::Dead
        } else {
            Disposition::Schedule(self.delay_with_jitter(attempt, jitter_unit()))
        }
    }

    /// Backoff delay for the given attempt with an explicit jitter unit in
    /// `[0, 1)`. Deterministic, which is what the tests use.
    #[must_use]
    pub fn delay_with_jitter(&self, attempt: u32, jitter_unit: f64) -> Duration {
        let base = self.base_delay_for_attempt(attempt);
        let jitter = base.as_secs_f64() * 0.25 * jitter_unit.clamp(0.0, 1.0);
        base + Duration::from_secs_f64(jitter)
    }

    fn base_delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(63);
        let raw = self.base_delay.as_secs_f64() * 2f64.powi(exp as i32);
        Duration::from_secs_f64(raw.min(self.max_delay.as_secs_f64()))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(&RetryConfig::default())
    }
}

/// Time-seeded jitter unit in `[0, 1)` using a simple LCG.
fn jitter_unit() -> f64 {
    use std::time::SystemTime;

    let seed = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64;

    // LCG parameters
    let a: u64 = 6364136223846793005;
    let c: u64 = 1442695040888963407;

    let random = seed.wrapping_mul(a).wrapping_add(c);
    (random % 1_000) as f64 / 1_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy::default()
    }

    fn job_with_retry(retry: u32) -> JobRecord {
        let mut job = JobRecord::new("X", vec![], "default");
        job.retry = retry;
        job
    }

    #[test]
    fn test_success_drops() {
        assert_eq!(
            policy().decide(&job_with_retry(0), Outcome::Success),
            Disposition::Drop
        );
        // Even a job at the cap is dropped on success.
        assert_eq!(
            policy().decide(&job_with_retry(30), Outcome::Success),
            Disposition::Drop
        );
    }

    #[test]
    fn test_first_failure_schedules_within_jitter_band() {
        let disposition = policy().decide(&job_with_retry(0), Outcome::ExecutorFailure);
        match disposition {
            Disposition::Schedule(delay) => {
                assert!(delay >= Duration::from_secs(15));
                assert!(delay <= Duration::from_secs_f64(18.75));
            }
            other => panic!("expected Schedule, got {other:?}"),
        }
    }

    #[test]
    fn test_transport_error_counts_like_failure() {
        assert!(matches!(
            policy().decide(&job_with_retry(0), Outcome::TransportError),
            Disposition::Schedule(_)
        ));
    }

    #[test]
    fn test_exhausted_job_goes_dead() {
        // retry = 25 means the 26th attempt would exceed the default cap.
        assert_eq!(
            policy().decide(&job_with_retry(25), Outcome::ExecutorFailure),
            Disposition::Dead
        );
        // One under the cap still schedules.
        assert!(matches!(
            policy().decide(&job_with_retry(24), Outcome::ExecutorFailure),
            Disposition::Schedule(_)
        ));
    }

    #[test]
    fn test_record_override_caps_attempts() {
        let mut job = job_with_retry(2);
        job.max_retries = Some(2);
        assert_eq!(
            policy().decide(&job, Outcome::ExecutorFailure),
            Disposition::Dead
        );

        job.max_retries = Some(10);
        assert!(matches!(
            policy().decide(&job, Outcome::ExecutorFailure),
            Disposition::Schedule(_)
        ));
    }

    #[test]
    fn test_delay_doubles_per_attempt() {
        let policy = policy();
        assert_eq!(
            policy.delay_with_jitter(1, 0.0),
            Duration::from_secs(15)
        );
        assert_eq!(
            policy.delay_with_jitter(2, 0.0),
            Duration::from_secs(30)
        );
        assert_eq!(
            policy.delay_with_jitter(3, 0.0),
            Duration::from_secs(60)
        );
    }

    #[test]
    fn test_delay_clamped_to_max() {
        let policy = policy();
        // 15s x 2^29 is far past 24h.
        assert_eq!(
            policy.delay_with_jitter(30, 0.0),
            Duration::from_secs(86_400)
        );
        // Jitter applies on top of the clamped value.
        assert_eq!(
            policy.delay_with_jitter(30, 1.0),
            Duration::from_secs(108_000)
        );
    }

    #[test]
    fn test_jitter_is_additive() {
        let policy = policy();
        let low = policy.delay_with_jitter(1, 0.0);
        let high = policy.delay_with_jitter(1, 1.0);
        assert_eq!(low, Duration::from_secs(15));
        assert_eq!(high, Duration::from_secs_f64(18.75));
    }

    #[test]
    fn test_jitter_unit_in_range() {
        for _ in 0..100 {
            let unit = jitter_unit();
            assert!((0.0..1.0).contains(&unit));
        }
    }
}
