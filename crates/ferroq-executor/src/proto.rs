//! Generated protobuf types for the executor service.

pub mod executor {
    tonic::include_proto!("ferroq.executor.v1");
}

pub use executor::{
    executor_service_client::ExecutorServiceClient, HealthRequest, HealthResponse, JobRequest,
    JobResponse,
};
