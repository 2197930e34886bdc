//! Redis-backed store implementation.

mod store;

pub use store::RedisStore;

use crate::error::{StoreError, StoreResult};
use deadpool_redis::{Config, Pool, Runtime};
use ferroq_config::RedisConfig;
use tracing::info;

/// Create a Redis connection pool.
pub async fn create_pool(config: &RedisConfig) -> StoreResult<Pool> {
    info!("Creating Redis connection pool...");

    let cfg = Config::from_url(config.effective_url());

    let pool = cfg
        .builder()
        .map_err(|e| StoreError::Configuration(format!("Invalid Redis config: {e}")))?
        .max_size(config.pool_size)
        .create_timeout(Some(config.connect_timeout()))
        .wait_timeout(Some(config.connect_timeout()))
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| StoreError::Configuration(format!("Failed to create pool: {e}")))?;

    // Test connection
    let mut conn = pool.get().await?;
    redis::cmd("PING").query_async::<String>(&mut *conn).await?;

    info!("Redis connection pool created successfully");

    Ok(pool)
}

/// Key layout shared with the job producer.
///
/// Keys carry no prefix: the producer left-pushes onto `queue:<name>` and
/// reads nothing else, so any rename here breaks wire compatibility.
pub struct RedisKeys;

impl RedisKeys {
    /// Fully-qualified list key for a queue.
    #[must_use]
    pub fn queue(name: &str) -> String {
        format!("queue:{name}")
    }

    /// Sorted set of pending retries, scored by earliest-eligible time.
    #[must_use]
    pub const fn schedule() -> &'static str {
        "schedule"
    }

    /// Sorted set of terminal failures, scored by failure time.
    #[must_use]
    pub const fn dead() -> &'static str {
        "dead"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys() {
        assert_eq!(RedisKeys::queue("default"), "queue:default");
        assert_eq!(RedisKeys::queue("critical"), "queue:critical");
        assert_eq!(RedisKeys::schedule(), "schedule");
        assert_eq!(RedisKeys::dead(), "dead");
    }
}
