//! CrashNet Live Runtime
//!
//! Orchestrates the live view engine:
//! - Connects to the detection stream (reconnects with backoff)
//! - Polls the summary and health endpoints on a fixed interval
//! - Runs the engine loop that owns all window / heat / series / status state
//! - Logs a console view of each published snapshot
//!
//! Usage:
//!   cargo run --release --bin crashnet_live
//!
//! Environment variables: see `PipelineConfig::from_env`.

use crashnet_live::pipeline::{
    run_engine_loop,
    status_scheduler_task,
    DashboardSnapshot,
    EngineMessage,
    HttpSnapshotSource,
    LiveEngine,
    PipelineConfig,
    SnapshotSource,
    SourceKind,
};
use crashnet_live::streamer_core::run_stream_with_reconnect;
use crashnet_live::ui::run_console;
use dotenv::dotenv;
use log::{error, info};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize environment and logging
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    info!("🚀 CrashNet Live Runtime");

    let config = PipelineConfig::from_env();
    config.validate()?;

    info!("📊 Configuration:");
    info!("   ├─ Stream: {}", config.stream_url);
    info!("   ├─ Summary: {}", config.summary_url);
    info!("   ├─ Health: {}", config.health_url);
    info!(
        "   ├─ Poll: every {}ms (timeout {}ms)",
        config.poll_interval_ms, config.poll_timeout_ms
    );
    info!(
        "   ├─ Window: {} events, series: {} samples",
        config.window_capacity, config.series_capacity
    );
    info!("   └─ Reconnect: {}", config.reconnect);

    let summary: Arc<dyn SnapshotSource> = Arc::new(HttpSnapshotSource::new(
        SourceKind::Summary,
        config.summary_url.clone(),
        config.poll_timeout(),
    )?);
    let health: Arc<dyn SnapshotSource> = Arc::new(HttpSnapshotSource::new(
        SourceKind::Health,
        config.health_url.clone(),
        config.poll_timeout(),
    )?);

    let (tx, rx) = mpsc::channel::<EngineMessage>(config.channel_buffer);
    let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(DashboardSnapshot::default()));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let engine = LiveEngine::new(config.window_capacity, config.series_capacity);
    let engine_handle = tokio::spawn(run_engine_loop(engine, rx, snapshot_tx, shutdown_rx.clone()));
    info!("✅ Engine loop spawned");

    tokio::spawn(status_scheduler_task(
        summary,
        health,
        config.poll_interval_ms,
        config.poll_timeout_ms,
        tx.clone(),
        shutdown_rx.clone(),
    ));
    info!("✅ Status reconciler spawned");

    let stream_config = config.stream_client();
    let stream_tx = tx.clone();
    let stream_shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        if let Err(e) = run_stream_with_reconnect(stream_config, stream_tx, stream_shutdown).await {
            error!("❌ Detection stream gave up: {}", e);
        }
    });
    info!("✅ Stream client spawned");

    let console_handle = tokio::spawn(run_console(snapshot_rx, config.console_refresh_ms, shutdown_rx));

    // Engine loop only needs the producers' senders
    drop(tx);

    info!("🔄 Press CTRL+C to shutdown gracefully");

    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("");
            info!("⚠️  Received CTRL+C, shutting down...");
        }
        Err(err) => {
            error!("❌ Failed to listen for CTRL+C: {}", err);
        }
    }

    shutdown_tx.send_replace(true);

    let engine = engine_handle.await?;
    let _ = console_handle.await;

    let stats = engine.stats();
    info!(
        "✅ CrashNet live runtime stopped (accepted: {}, malformed: {}, disconnects: {})",
        stats.accepted, stats.malformed, stats.disconnects
    );
    Ok(())
}
