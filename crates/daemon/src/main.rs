//! csvjob worker - polls the job queue and processes uploads

use anyhow::{Context, Result};
use csvjob_core::application::worker::{shutdown_channel, Worker};
use csvjob_core::config::AppConfig;
use csvjob_core::port::time_provider::SystemTimeProvider;
use csvjob_core::port::TimeProvider;
use csvjob_daemon::{telemetry, wiring};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging
    let _log_guard = telemetry::init_logging()?;
    info!("csvjob worker v{} starting...", VERSION);

    // 2. Load configuration
    let config = AppConfig::from_env().context("Invalid configuration")?;
    config.validate().context("Invalid configuration")?;
    info!(
        idp_mode = %config.idempotency_backend,
        storage_backend = %config.storage_backend,
        exclude_header = config.exclude_header,
        "Configuration loaded"
    );

    // 3. Setup dependencies (DI wiring)
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let queue = wiring::build_queue(&config, time_provider.clone()).await?;
    let processor = Arc::new(wiring::build_processor(&config, time_provider).await?);

    // 4. Start worker
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let worker = Worker::new(queue, processor);
    let worker_handle = tokio::spawn(async move {
        if let Err(e) = worker.run(shutdown_rx).await {
            error!(error = ?e, "Worker failed");
        }
    });

    info!("Ready. Press Ctrl+C to shutdown");

    // 5. Wait for shutdown signal, then let the in-flight batch finish
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting gracefully...");
    shutdown_tx.shutdown();

    if tokio::time::timeout(SHUTDOWN_TIMEOUT, worker_handle)
        .await
        .is_err()
    {
        warn!("Worker did not stop in time; unacked messages will be redelivered");
    }

    info!("Shutdown complete.");
    Ok(())
}
