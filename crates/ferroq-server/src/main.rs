//! # Ferroq Orchestrator Daemon
//!
//! Entry point wiring the pipeline together: configuration, the Redis
//! store, the executor client behind its circuit breaker, the concurrent
//! processor, and the supervisor loop. SIGINT/SIGTERM trigger cooperative
//! shutdown with a bounded drain.

use ferroq_core::FerroqResult;
use ferroq_executor::build_executor;
use ferroq_store::{JobStore, RedisStore};
use ferroq_worker::{metrics, Processor, RetryPolicy, Supervisor};
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    init_logging();

    info!("Starting Ferroq orchestrator...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run().await {
        error!("Application error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> FerroqResult<()> {
    let config = ferroq_config::load()?;
    metrics::register_metrics();

    info!(
        queues = ?config.worker.queues,
        concurrency = config.worker.concurrency,
        protocol = %config.sidecar.protocol,
        "Configuration loaded"
    );

    // Store construction is the only fatal runtime dependency.
    let store: Arc<dyn JobStore> = Arc::new(RedisStore::connect(&config.redis).await?);

    let executor = build_executor(&config.sidecar, &config.breaker).await?;
    match executor.health().await {
        Ok(()) => info!("Executor healthy"),
        Err(e) => warn!(error = %e, "Executor health probe failed at startup"),
    }

    let processor = Arc::new(Processor::new(
        store.clone(),
        executor,
        RetryPolicy::new(&config.retry),
        config.worker.concurrency,
    ));

    let supervisor = Supervisor::new(
        store.clone(),
        processor.clone(),
        &config.worker,
        &config.scheduler,
    );

    let shutdown = CancellationToken::new();
    let supervisor_handle = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { supervisor.run(shutdown).await })
    };

    shutdown_signal().await;

    shutdown.cancel();
    let _ = supervisor_handle.await;

    if let Err(e) = processor
        .shutdown(config.worker.shutdown_timeout())
        .await
    {
        warn!(error = %e, "Drain incomplete; remaining jobs finish on their own");
    }

    store.close().await;
    info!("Shutdown complete");
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,ferroq=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        }
    }
}
