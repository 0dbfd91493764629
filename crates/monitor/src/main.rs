use std::sync::Arc;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{info, warn};

use ifence_monitor::config::{Config, StorageBackend};
use ifence_monitor::jobs::{GeofenceMonitorJob, JobScheduler, TrailRetentionJob};
use ifence_monitor::logging::init_logging;
use ifence_monitor::provider::{LocationProvider, ReplayLocationProvider};
use ifence_monitor::{Monitor, Repositories};
use persistence::{FileStore, KeyValueStore, MemoryStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    init_logging(&config.logging)?;

    info!("Starting iFence monitor v{}", env!("CARGO_PKG_VERSION"));

    if let Some(addr) = config.metrics.socket_addr() {
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("Failed to install Prometheus exporter")?;
        info!("Prometheus metrics exposed on {}", addr);
    }

    let store: Arc<dyn KeyValueStore> = match config.storage.backend {
        StorageBackend::Memory => {
            warn!("Using in-memory storage; nothing survives a restart");
            Arc::new(MemoryStore::new())
        }
        StorageBackend::File => {
            let path = config.storage.path.as_deref().unwrap_or_default();
            info!("Opening file storage at {}", path);
            Arc::new(FileStore::open(path).await?)
        }
    };

    let provider: Arc<dyn LocationProvider> = match config.replay.path.as_deref() {
        Some(path) => Arc::new(ReplayLocationProvider::from_file(path).await?),
        None => {
            warn!("No replay file configured; every location poll will be unavailable");
            Arc::new(ReplayLocationProvider::empty())
        }
    };

    let repos = Repositories::new(
        store,
        config.alarms.dedup_policy,
        config.trail.max_samples_per_zone,
    );
    info!(
        dedup_policy = %config.alarms.dedup_policy,
        on_location_error = config.monitor.on_location_error.as_str(),
        interval_ms = config.monitor.interval_ms,
        "Monitor configured"
    );

    let mut scheduler = JobScheduler::new();
    if let Some(days) = config.trail.retention() {
        scheduler.register(TrailRetentionJob::new(
            repos.zones.clone(),
            repos.trails.clone(),
            days,
        ));
    }
    let monitor = Arc::new(Monitor::new(repos, provider, config.monitor_settings()));
    scheduler.register(GeofenceMonitorJob::new(monitor));
    scheduler.start();

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    info!("Shutdown signal received");

    scheduler.stop(config.shutdown_timeout()).await;
    info!("iFence monitor stopped");

    Ok(())
}
