//! # Ferroq Store
//!
//! Typed operations over the shared Redis store: blocking multi-queue pop,
//! scheduled-set insert and promotion, dead-set insert with trimming.
//!
//! Keys are unprefixed (`queue:<name>`, `schedule`, `dead`) for wire
//! compatibility with the existing job producer.

pub mod error;
pub mod redis;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use redis::{create_pool, RedisKeys, RedisStore};
pub use store::{JobStore, DEAD_CAP};
