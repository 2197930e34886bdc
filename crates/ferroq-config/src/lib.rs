//! # Ferroq Config
//!
//! Layered configuration for the orchestrator. Values come from, in order:
//! `config/default.toml`, `config/{FERROQ_ENVIRONMENT}.toml`,
//! `config/local.toml`, environment variables with the `FERROQ` prefix, and
//! finally the producer-compatible bare overrides `REDIS_URL`,
//! `SIDECAR_URL` and `SIDECAR_PROTOCOL`.

pub mod app_config;
pub mod loader;

pub use app_config::{
    AppConfig, BreakerConfig, RedisConfig, RetryConfig, SchedulerConfig, SidecarConfig,
    SidecarProtocol, WorkerConfig,
};
pub use loader::{load, load_from};
