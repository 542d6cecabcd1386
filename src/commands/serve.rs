use anyhow::{Context, Result};
use std::sync::Arc;

use uptime_monitor::config::Config;
use uptime_monitor::metrics::MonitorMetrics;
use uptime_monitor::prober::HttpProber;
use uptime_monitor::recorder::ResultRecorder;
use uptime_monitor::scheduler::Scheduler;
use uptime_monitor::server::{self, AppState};
use uptime_monitor::storage::open_sqlite_store;
use uptime_monitor::utils::retry::RetryConfig;

/// Run the scheduler and the API server until Ctrl+C
pub async fn serve(config: Config) -> Result<()> {
    // The only fatal startup failure: without a store nothing can be recorded
    let store = open_sqlite_store(&config.storage.db_path).with_context(|| {
        format!(
            "Failed to open target store at {}",
            config.storage.db_path.display()
        )
    })?;

    let metrics = Arc::new(
        MonitorMetrics::new().map_err(|e| anyhow::anyhow!("Failed to register metrics: {e}"))?,
    );

    let prober = HttpProber::new(config.http_timeout(), &config.scheduler.user_agent)
        .context("Failed to build HTTP client")?;

    let recorder = ResultRecorder::new(
        Arc::clone(&store),
        Arc::clone(&metrics),
        RetryConfig::new(config.scheduler.persist_retries),
    );

    let scheduler = Scheduler::from_config(
        &config.scheduler,
        Arc::clone(&store),
        Arc::new(prober),
        recorder,
        Arc::clone(&metrics),
    );

    tracing::info!(
        db_path = %config.storage.db_path.display(),
        scan_interval_secs = config.scheduler.scan_interval_secs,
        http_timeout_secs = config.scheduler.http_timeout_secs,
        max_concurrent_probes = config.scheduler.max_concurrent_probes,
        "Starting uptime monitor"
    );

    let handle = scheduler.start();

    let state = AppState::new(store, metrics, config.server.clone())?;
    let served = server::serve_with_shutdown(state, shutdown_signal()).await;

    handle.shutdown().await;
    served.context("API server failed")?;

    println!("Uptime monitor stopped.");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Shutdown signal received");
        }
        Err(e) => {
            tracing::error!("Failed to wait for Ctrl+C: {}", e);
        }
    }
}
