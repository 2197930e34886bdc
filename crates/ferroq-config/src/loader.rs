//! Configuration loader with layered sources.

use crate::{AppConfig, SidecarProtocol};
use config::{Config, Environment, File};
use ferroq_core::FerroqError;
use std::path::Path;
use tracing::{debug, info};

/// Loads configuration from the default location (`./config`).
pub fn load() -> Result<AppConfig, FerroqError> {
    load_from("./config")
}

/// Loads configuration from the specified directory.
///
/// Sources are applied in order:
/// 1. `{dir}/default.toml` - defaults
/// 2. `{dir}/{FERROQ_ENVIRONMENT}.toml` - environment overrides
/// 3. `{dir}/local.toml` - local overrides (not committed)
/// 4. Environment variables with the `FERROQ` prefix (`__` separator)
/// 5. Bare `REDIS_URL`, `SIDECAR_URL`, `SIDECAR_PROTOCOL` overrides
pub fn load_from(config_dir: &str) -> Result<AppConfig, FerroqError> {
    // Load .env file if present
    if let Err(e) = dotenvy::dotenv() {
        debug!("No .env file found or error loading it: {}", e);
    }

    let environment =
        std::env::var("FERROQ_ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
    info!("Loading configuration for environment: {}", environment);

    let mut builder = Config::builder();

    for name in ["default", environment.as_str(), "local"] {
        let path = format!("{config_dir}/{name}.toml");
        if Path::new(&path).exists() {
            debug!("Loading config from: {}", path);
            builder = builder.add_source(File::with_name(&path).required(false));
        }
    }

    builder = builder.add_source(
        Environment::with_prefix("FERROQ")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| FerroqError::Configuration(e.to_string()))?;

    let mut app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| FerroqError::Configuration(e.to_string()))?;

    apply_env_overrides(&mut app_config)?;
    validate(&app_config)?;

    Ok(app_config)
}

/// Applies the producer-compatible bare environment overrides.
fn apply_env_overrides(config: &mut AppConfig) -> Result<(), FerroqError> {
    if let Ok(url) = std::env::var("REDIS_URL") {
        if !url.is_empty() {
            config.redis.url = url;
        }
    }

    if let Ok(url) = std::env::var("SIDECAR_URL") {
        if !url.is_empty() {
            config.sidecar.url = url;
        }
    }

    if let Ok(protocol) = std::env::var("SIDECAR_PROTOCOL") {
        if !protocol.is_empty() {
            config.sidecar.protocol = protocol
                .parse::<SidecarProtocol>()
                .map_err(FerroqError::Configuration)?;
        }
    }

    Ok(())
}

/// Validates the configuration. Failures here are fatal at startup.
fn validate(config: &AppConfig) -> Result<(), FerroqError> {
    if config.redis.url.is_empty() {
        return Err(FerroqError::Configuration(
            "redis.url is required".to_string(),
        ));
    }

    if config.sidecar.url.is_empty() {
        return Err(FerroqError::Configuration(
            "sidecar.url is required".to_string(),
        ));
    }

    if config.worker.queues.is_empty() {
        return Err(FerroqError::Configuration(
            "worker.queues must name at least one queue".to_string(),
        ));
    }

    if config.retry.base_delay_secs > config.retry.max_delay_secs {
        return Err(FerroqError::Configuration(
            "retry.base_delay_secs must not exceed retry.max_delay_secs".to_string(),
        ));
    }

    Ok(())
}
