//! Futon Daemon - Main Entry Point
//!
//! Wires the SQLite stores, notifier, sweep engine and lifecycle service,
//! then serves JSON-RPC and runs the interval sweeps until Ctrl+C.

mod config;
mod telemetry;

use anyhow::{Context, Result};
use config::DaemonConfig;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use futon_api_rpc::{RpcHandler, RpcServer};
use futon_core::application::{
    shutdown_channel, DryingStores, LifecycleService, OwnerNotifier, ReconcileGate, SweepConfig,
    SweepEngine, SweepScheduler,
};
use futon_core::port::id_provider::UuidProvider;
use futon_core::port::time_provider::SystemTimeProvider;
use futon_core::port::{Notifier, TimeProvider};
use futon_infra_notify::{webhook::DEFAULT_WEBHOOK_TIMEOUT, LogNotifier, WebhookNotifier};
use futon_infra_sqlite::{create_pool, run_migrations, SqliteDryingStore, SqliteUserDirectory};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Configuration and logging
    let config = DaemonConfig::from_env()?;
    let _telemetry = telemetry::init(&config.log)?;

    info!("Futon daemon v{} starting...", VERSION);

    // 2. Database
    if let Some(parent) = Path::new(&config.db_path).parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    info!(db_path = %config.db_path, "Initializing database...");

    let pool = create_pool(&config.database_url())
        .await
        .context("DB pool creation failed")?;
    run_migrations(&pool).await.context("Migration failed")?;

    // 3. Dependencies
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let store = Arc::new(SqliteDryingStore::new(pool.clone(), time_provider.clone()));
    let stores = DryingStores::from_backend(store);

    let notifier: Arc<dyn Notifier> = match &config.webhook_url {
        Some(url) => {
            info!(url = %url, "Notifications go to webhook");
            Arc::new(WebhookNotifier::new(url.clone(), DEFAULT_WEBHOOK_TIMEOUT)?)
        }
        None => {
            info!("No webhook configured, notifications are logged only");
            Arc::new(LogNotifier)
        }
    };
    let owner_notifier = OwnerNotifier::new(Arc::new(SqliteUserDirectory::new(pool)), notifier);

    let gate = ReconcileGate::new(config.reconcile_api_key.clone());
    if !gate.is_configured() {
        tracing::warn!("FUTON_RECONCILE_API_KEY not set, reconcile sweep will refuse to run");
    }

    let engine = Arc::new(SweepEngine::new(
        stores.clone(),
        owner_notifier.clone(),
        time_provider.clone(),
        SweepConfig {
            pickup_grace_ms: config.pickup_grace_ms(),
        },
    ));
    let lifecycle = Arc::new(LifecycleService::new(
        stores.clone(),
        Arc::new(UuidProvider),
        time_provider,
        owner_notifier,
    ));

    // 4. JSON-RPC server
    let handler = Arc::new(RpcHandler::new(
        engine.clone(),
        lifecycle,
        gate,
        stores.items,
        stores.orders,
    ));
    let (rpc_addr, rpc_handle) = RpcServer::new(config.rpc.clone(), handler)
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    // 5. Interval sweeps
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let scheduler_handle = match config.sweep_interval {
        Some(period) => {
            let scheduler = SweepScheduler::new(engine, period);
            Some(tokio::spawn(scheduler.run(shutdown_rx)))
        }
        None => {
            info!("FUTON_SWEEP_INTERVAL_SECS=0, sweeps run only on RPC request");
            None
        }
    };

    info!(rpc_addr = %rpc_addr, "System ready");
    info!("Press Ctrl+C to shutdown");

    // 6. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    shutdown_tx.shutdown();
    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    if let Some(handle) = scheduler_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }

    info!("Shutdown complete.");

    Ok(())
}
