//! gRPC executor client.

use crate::error::{ExecutorError, ExecutorResult};
use crate::proto::{ExecutorServiceClient, HealthRequest, JobRequest};
use crate::Executor;
use async_trait::async_trait;
use ferroq_config::SidecarConfig;
use ferroq_core::{ExecutionResult, ExecutionStatus, JobRecord};
use serde_json::Value;
use std::time::Duration;
use tonic::transport::Channel;
use tracing::debug;

/// Deadline for the health probe.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Protobuf-over-gRPC executor client.
///
/// The wire `args` field is a sequence of strings, so heterogeneous
/// arguments go through [`project_arg`] - a documented lossy projection.
/// Callers needing full argument fidelity use the HTTP transport.
pub struct GrpcExecutor {
    client: ExecutorServiceClient<Channel>,
    timeout: Duration,
}

impl GrpcExecutor {
    /// Connects to the sidecar's gRPC endpoint.
    pub async fn connect(config: &SidecarConfig) -> ExecutorResult<Self> {
        let client = ExecutorServiceClient::connect(config.url.clone()).await?;
        Ok(Self {
            client,
            timeout: config.timeout(),
        })
    }

    /// Creates a client from an existing channel.
    pub fn from_channel(channel: Channel, timeout: Duration) -> Self {
        Self {
            client: ExecutorServiceClient::new(channel),
            timeout,
        }
    }
}

#[async_trait]
impl Executor for GrpcExecutor {
    async fn execute(&self, job: &JobRecord) -> ExecutorResult<ExecutionResult> {
        debug!(jid = %job.jid, class = %job.class, "Dispatching job over gRPC");

        let mut request = tonic::Request::new(JobRequest {
            class: job.class.clone(),
            jid: job.jid.clone(),
            queue: job.queue.clone(),
            args: job.args.iter().map(project_arg).collect(),
            created_at: job.created_at,
            enqueued_at: job.enqueued_at,
        });
        request.set_timeout(self.timeout);

        let response = self.client.clone().execute_job(request).await?.into_inner();

        let status = if response.status == "success" {
            ExecutionStatus::Success
        } else {
            ExecutionStatus::Failure
        };

        Ok(ExecutionResult {
            status,
            execution_time: response.execution_time,
            error_message: if response.error_message.is_empty() {
                None
            } else {
                Some(response.error_message)
            },
            result: None,
        })
    }

    async fn health(&self) -> ExecutorResult<()> {
        let mut request = tonic::Request::new(HealthRequest {});
        request.set_timeout(HEALTH_TIMEOUT);

        let response = self.client.clone().health_check(request).await?.into_inner();
        if response.status == "ok" && response.rails_loaded {
            Ok(())
        } else {
            Err(ExecutorError::Unhealthy(format!(
                "status={}, rails_loaded={}",
                response.status, response.rails_loaded
            )))
        }
    }
}

/// Canonical value-to-string projection for the gRPC `args` field.
///
/// Numbers use the shortest round-trippable decimal, booleans render as
/// `true`/`false`, null becomes the empty string, strings pass through,
/// and composite values are carried as compact JSON.
fn project_arg(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        composite => composite.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_projection() {
        assert_eq!(project_arg(&json!("plain")), "plain");
        assert_eq!(project_arg(&json!(42)), "42");
        assert_eq!(project_arg(&json!(1.5)), "1.5");
        assert_eq!(project_arg(&json!(true)), "true");
        assert_eq!(project_arg(&json!(false)), "false");
        assert_eq!(project_arg(&Value::Null), "");
    }

    #[test]
    fn test_composite_projection_is_compact_json() {
        assert_eq!(project_arg(&json!([1, "a"])), r#"[1,"a"]"#);
        assert_eq!(project_arg(&json!({"k": 1})), r#"{"k":1}"#);
    }

    #[test]
    fn test_number_projection_round_trips() {
        for raw in ["0.1", "1e20", "-3.25", "123456789012345"] {
            let value: Value = serde_json::from_str(raw).unwrap();
            let projected = project_arg(&value);
            let reparsed: Value = serde_json::from_str(&projected).unwrap();
            assert_eq!(reparsed, value);
        }
    }
}
