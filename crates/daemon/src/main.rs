//! Centroid job engine daemon
//!
//! Accepts video-processing jobs over JSON-RPC, runs one worker process per
//! job and records outcomes in `{results}/jobs.json`.

mod config;
mod logging;

use anyhow::{Context, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use centroid_api_rpc::{server::RpcServerConfig, RpcServer};
use centroid_core::application::{
    JobIdentity, JobLayout, JobLedger, JobOrchestrator, StatusQueryService,
};
use centroid_core::domain::JobStatus;
use centroid_core::port::id_provider::UuidProvider;
use centroid_core::port::time_provider::SystemTimeProvider;
use centroid_core::port::TimeProvider;
use centroid_infra_fs::{DirectoryVideoCatalog, JsonFileJobStore};
use centroid_infra_system::ProcessWorkerLauncher;

use crate::config::DaemonConfig;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration
    let config = DaemonConfig::from_env()?;

    // 2. Initialize logging
    let _log_guard = logging::init(&config)?;

    info!("Centroid job engine v{} starting...", centroid_core::VERSION);

    let layout = JobLayout::new(config.video_root(), config.results_root());
    info!(
        video_root = %layout.video_root.display(),
        results_root = %layout.results_root.display(),
        worker = %config.worker_program,
        worker_args = ?config.worker_prefix_args(),
        worker_timeout = ?config.worker_timeout(),
        "Configuration loaded"
    );

    // 3. Setup dependencies (DI wiring)
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let store = Arc::new(JsonFileJobStore::new(&layout.results_root));
    let ledger = Arc::new(JobLedger::new(store));
    let identity = Arc::new(JobIdentity::new(Arc::new(UuidProvider), layout.clone()));

    let mut launcher = ProcessWorkerLauncher::new(
        config.worker_program.clone(),
        config.worker_prefix_args(),
        time_provider.clone(),
    );
    if let Some(limit) = config.worker_timeout() {
        launcher = launcher.with_timeout(limit);
    }

    let orchestrator = Arc::new(JobOrchestrator::new(
        ledger.clone(),
        identity,
        Arc::new(launcher),
        time_provider.clone(),
    ));
    let status = Arc::new(StatusQueryService::new(
        ledger.clone(),
        layout.clone(),
        config.results_url_prefix.clone(),
    ));
    let videos = Arc::new(DirectoryVideoCatalog::new(&layout.video_root));

    // 4. Report jobs left by a previous run. They are not resumed.
    match ledger.snapshot().await {
        Ok(jobs) => {
            let stale = jobs
                .values()
                .filter(|job| job.status == JobStatus::Processing)
                .count();
            info!(jobs = jobs.len(), "Job store opened");
            if stale > 0 {
                warn!(
                    stale,
                    "Jobs from a previous run are still marked processing and will stay so"
                );
            }
        }
        Err(e) => warn!(error = %e, "Job store is unreadable; requests will fail until fixed"),
    }

    // 5. Start JSON-RPC server
    info!("Starting JSON-RPC server...");
    let rpc_config = RpcServerConfig {
        host: config.rpc_host.clone(),
        port: config.rpc_port,
    };
    let rpc_server = RpcServer::new(rpc_config, orchestrator.clone(), status, videos);
    let (addr, rpc_handle) = rpc_server
        .start()
        .await
        .context("RPC server start failed")?;

    info!(addr = %addr, "System ready. Waiting for jobs...");
    info!("Press Ctrl+C to shutdown");

    // 6. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 7. Graceful shutdown
    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    if !stopped_within(rpc_handle.stopped(), SHUTDOWN_TIMEOUT).await {
        warn!(
            timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
            "RPC server did not stop in time; exiting anyway"
        );
    }

    let in_flight = orchestrator.in_flight();
    if in_flight > 0 {
        warn!(
            in_flight,
            "Workers still running at shutdown; their jobs stay processing"
        );
    }

    info!("Shutdown complete.");

    Ok(())
}

/// Wait for a shutdown future; false if it did not finish within `limit`
async fn stopped_within(stopped: impl Future<Output = ()>, limit: Duration) -> bool {
    tokio::time::timeout(limit, stopped).await.is_ok()
}
