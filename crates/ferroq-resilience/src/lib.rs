//! # Ferroq Resilience
//!
//! Resilience primitives guarding the executor transport: a three-state
//! circuit breaker and the quadratic backoff schedule used between
//! transport-level retries.

pub mod backoff;
pub mod circuit_breaker;

pub use backoff::BackoffSchedule;
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
