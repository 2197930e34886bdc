//! Store abstraction.

use crate::error::StoreResult;
use async_trait::async_trait;
use ferroq_core::JobRecord;
use std::time::Duration;

/// Newest entries retained in the dead set.
pub const DEAD_CAP: usize = 10_000;

/// Typed operations over the shared store.
///
/// The Redis implementation is the production backend; the worker crate
/// tests substitute an in-memory implementation.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Blocking multi-queue pop with a server-side wait of at most one
    /// second. Queue priority follows slice order: the first non-empty
    /// queue wins. Returns `Ok(None)` when no job arrived within the wait.
    async fn poll(&self, queues: &[String]) -> StoreResult<Option<JobRecord>>;

    /// Pushes an encoded record onto the left of its queue, the way the
    /// producer does.
    async fn enqueue(&self, job: &JobRecord) -> StoreResult<()>;

    /// Records the failed attempt on the job (incrementing `retry` and
    /// stamping `failed_at`), then inserts it into the scheduled set at
    /// `now + delay` - or straight back onto its queue when `delay` is
    /// zero.
    async fn schedule_retry(&self, job: &mut JobRecord, delay: Duration) -> StoreResult<()>;

    /// Stamps `failed_at`, inserts the record into the dead set scored by
    /// the failure time, and trims the set to the newest [`DEAD_CAP`]
    /// entries.
    async fn move_to_dead(&self, job: &mut JobRecord) -> StoreResult<()>;

    /// Moves every scheduled entry whose score is due back onto its
    /// originating queue. Returns the number promoted.
    async fn promote_scheduled(&self) -> StoreResult<u64>;

    /// Length of the named queue.
    async fn queue_size(&self, queue: &str) -> StoreResult<u64>;

    /// Releases the underlying connections.
    async fn close(&self);
}
