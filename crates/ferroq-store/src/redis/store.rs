//! Redis store operations.

use crate::error::{StoreError, StoreResult};
use crate::redis::{create_pool, RedisKeys};
use crate::store::{JobStore, DEAD_CAP};
use async_trait::async_trait;
use deadpool_redis::Pool;
use ferroq_config::RedisConfig;
use ferroq_core::{epoch_seconds, JobRecord};
use redis::AsyncCommands;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Server-side wait of the blocking pop.
const POLL_BLOCK: Duration = Duration::from_secs(1);

/// Delay between connection acquisition retries.
const CONN_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Rank argument that trims a sorted set to its newest [`DEAD_CAP`] entries.
const fn dead_trim_stop() -> isize {
    -(DEAD_CAP as isize) - 1
}

/// Redis-backed [`JobStore`].
pub struct RedisStore {
    pool: Pool,
    config: RedisConfig,
}

impl RedisStore {
    /// Connects to Redis and verifies the connection with a PING.
    pub async fn connect(config: &RedisConfig) -> StoreResult<Self> {
        let pool = create_pool(config).await?;
        Ok(Self {
            pool,
            config: config.clone(),
        })
    }

    /// Gets a connection from the pool, retrying transient failures.
    async fn conn(&self) -> StoreResult<deadpool_redis::Connection> {
        let mut last_err = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tokio::time::sleep(CONN_RETRY_DELAY).await;
            }
            match self.pool.get().await {
                Ok(conn) => return Ok(conn),
                Err(e) => {
                    debug!(attempt, error = %e, "Failed to acquire Redis connection");
                    last_err = Some(e);
                }
            }
        }

        Err(StoreError::Pool(
            last_err.expect("at least one acquisition attempt was made"),
        ))
    }

    /// Bounds a Redis command by the given budget.
    async fn timed<T, F>(&self, budget: Duration, fut: F) -> StoreResult<T>
    where
        F: Future<Output = Result<T, redis::RedisError>>,
    {
        match tokio::time::timeout(budget, fut).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(StoreError::Timeout(budget)),
        }
    }
}

#[async_trait]
impl JobStore for RedisStore {
    async fn poll(&self, queues: &[String]) -> StoreResult<Option<JobRecord>> {
        let keys: Vec<String> = queues.iter().map(|q| RedisKeys::queue(q)).collect();
        let mut conn = self.conn().await?;

        // The pop blocks server-side for up to POLL_BLOCK; the client
        // budget has to cover that on top of the usual operation timeout.
        let budget = self.config.op_timeout() + POLL_BLOCK;
        let popped: Option<(String, String)> = self
            .timed(budget, async {
                redis::cmd("BRPOP")
                    .arg(&keys)
                    .arg(POLL_BLOCK.as_secs())
                    .query_async(&mut *conn)
                    .await
            })
            .await?;

        match popped {
            None => Ok(None),
            Some((key, payload)) => {
                let job = JobRecord::from_json(&payload)?;
                debug!(jid = %job.jid, queue = %job.queue, key = %key, "Popped job");
                Ok(Some(job))
            }
        }
    }

    async fn enqueue(&self, job: &JobRecord) -> StoreResult<()> {
        let payload = job.to_json()?;
        let key = RedisKeys::queue(&job.queue);
        let mut conn = self.conn().await?;

        let _: () = self
            .timed(self.config.op_timeout(), async {
                conn.lpush(&key, &payload).await
            })
            .await?;

        debug!(jid = %job.jid, queue = %job.queue, "Enqueued job");
        Ok(())
    }

    async fn schedule_retry(&self, job: &mut JobRecord, delay: Duration) -> StoreResult<()> {
        let now = epoch_seconds();
        job.record_attempt_failure(now);
        let payload = job.to_json()?;
        let mut conn = self.conn().await?;

        if delay.is_zero() {
            let key = RedisKeys::queue(&job.queue);
            let _: () = self
                .timed(self.config.op_timeout(), async {
                    conn.lpush(&key, &payload).await
                })
                .await?;
            debug!(jid = %job.jid, retry = job.retry, "Requeued job for immediate retry");
        } else {
            let score = now + delay.as_secs_f64();
            let _: () = self
                .timed(self.config.op_timeout(), async {
                    conn.zadd(RedisKeys::schedule(), &payload, score).await
                })
                .await?;
            debug!(jid = %job.jid, retry = job.retry, score, "Scheduled job retry");
        }

        Ok(())
    }

    async fn move_to_dead(&self, job: &mut JobRecord) -> StoreResult<()> {
        let now = epoch_seconds();
        job.failed_at = Some(now);
        let payload = job.to_json()?;
        let mut conn = self.conn().await?;

        let _: () = self
            .timed(self.config.op_timeout(), async {
                redis::pipe()
                    .zadd(RedisKeys::dead(), &payload, now)
                    .zremrangebyrank(RedisKeys::dead(), 0, dead_trim_stop())
                    .query_async(&mut *conn)
                    .await
            })
            .await?;

        warn!(jid = %job.jid, retry = job.retry, "Moved job to dead set");
        Ok(())
    }

    async fn promote_scheduled(&self) -> StoreResult<u64> {
        let now = epoch_seconds();
        let mut conn = self.conn().await?;

        let due: Vec<String> = self
            .timed(self.config.op_timeout(), async {
                conn.zrangebyscore(RedisKeys::schedule(), "-inf", now).await
            })
            .await?;

        let mut promoted = 0u64;
        let mut failed = 0u64;

        for payload in due {
            match JobRecord::from_json(&payload) {
                Ok(job) => {
                    let queue_key = RedisKeys::queue(&job.queue);
                    let moved: StoreResult<()> = self
                        .timed(self.config.op_timeout(), async {
                            redis::pipe()
                                .zrem(RedisKeys::schedule(), &payload)
                                .lpush(&queue_key, &payload)
                                .query_async(&mut *conn)
                                .await
                        })
                        .await;

                    match moved {
                        Ok(()) => {
                            promoted += 1;
                            debug!(jid = %job.jid, queue = %job.queue, "Promoted scheduled job");
                        }
                        Err(e) => {
                            warn!(jid = %job.jid, error = %e, "Failed to promote scheduled job");
                            failed += 1;
                        }
                    }
                }
                Err(e) => {
                    // An undecodable entry has no queue to return to and
                    // would wedge every future sweep; remove it.
                    error!(error = %e, "Dropping malformed scheduled entry");
                    let removed: StoreResult<()> = self
                        .timed(self.config.op_timeout(), async {
                            conn.zrem(RedisKeys::schedule(), &payload).await
                        })
                        .await;
                    if removed.is_err() {
                        failed += 1;
                    }
                }
            }
        }

        if promoted > 0 {
            debug!(count = promoted, "Promoted scheduled jobs");
        }

        if failed > 0 {
            return Err(StoreError::PartialPromotion { promoted, failed });
        }

        Ok(promoted)
    }

    async fn queue_size(&self, queue: &str) -> StoreResult<u64> {
        let key = RedisKeys::queue(queue);
        let mut conn = self.conn().await?;
        let size: u64 = self
            .timed(self.config.op_timeout(), async { conn.llen(&key).await })
            .await?;
        Ok(size)
    }

    async fn close(&self) {
        self.pool.close();
    }
}
