//! Store error types.

use ferroq_core::FerroqError;
use std::time::Duration;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by the shared store adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Redis command error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Connection pool error.
    #[error("Redis pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    /// Per-operation timeout elapsed.
    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    /// Payload in the store is not a valid job record.
    #[error("Malformed job payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// Store construction failed.
    #[error("Store configuration error: {0}")]
    Configuration(String),

    /// Some scheduled entries could not be promoted.
    #[error("Promotion sweep incomplete: {promoted} promoted, {failed} failed")]
    PartialPromotion { promoted: u64, failed: u64 },
}

impl StoreError {
    /// True for transport-level failures worth backing off and retrying.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Redis(_) | Self::Pool(_) | Self::Timeout(_) | Self::PartialPromotion { .. }
        )
    }
}

impl From<StoreError> for FerroqError {
    fn from(err: StoreError) -> Self {
        FerroqError::Store(err.to_string())
    }
}
