//! # Ferroq Executor
//!
//! Clients for the remote execution sidecar. Two interchangeable
//! transports - JSON over HTTP and protobuf over gRPC - sit behind the
//! [`Executor`] trait, and [`CircuitExecutor`] wraps either with a circuit
//! breaker so a dead sidecar fails fast instead of piling up requests.

pub mod breaker;
pub mod error;
pub mod grpc;
pub mod http;
pub mod proto;

pub use breaker::CircuitExecutor;
pub use error::{ExecutorError, ExecutorResult};
pub use grpc::GrpcExecutor;
pub use http::HttpExecutor;

use async_trait::async_trait;
use ferroq_config::{BreakerConfig, SidecarConfig, SidecarProtocol};
use ferroq_core::{ExecutionResult, JobRecord};
use ferroq_resilience::CircuitBreakerConfig;
use std::sync::Arc;

/// Request/response interface to the execution sidecar.
///
/// An `Err` from `execute` is always a transport-level problem; a job whose
/// user logic raised comes back as `Ok` with a `failure` status.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Runs the job remotely and returns the executor's verdict.
    async fn execute(&self, job: &JobRecord) -> ExecutorResult<ExecutionResult>;

    /// Probes the sidecar's health endpoint.
    async fn health(&self) -> ExecutorResult<()>;
}

/// Builds the configured transport wrapped in a circuit breaker.
pub async fn build_executor(
    sidecar: &SidecarConfig,
    breaker: &BreakerConfig,
) -> ExecutorResult<Arc<dyn Executor>> {
    let breaker_config = CircuitBreakerConfig {
        max_failures: breaker.max_failures,
        reset_timeout: breaker.reset_timeout(),
    };

    match sidecar.protocol {
        SidecarProtocol::Http => {
            let inner = HttpExecutor::new(sidecar)?;
            Ok(Arc::new(CircuitExecutor::new(inner, breaker_config)))
        }
        SidecarProtocol::Grpc => {
            let inner = GrpcExecutor::connect(sidecar).await?;
            Ok(Arc::new(CircuitExecutor::new(inner, breaker_config)))
        }
    }
}
