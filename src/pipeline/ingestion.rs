//! Engine loop - the single place where engine state is mutated
//!
//! Stream frames, connection events, and status ticks all arrive on one mpsc
//! channel and are applied in arrival order. Message N is fully applied
//! (window, heat, series) before message N+1 is read. After each change an
//! immutable `DashboardSnapshot` is published on a watch channel for
//! readers.

use super::engine::LiveEngine;
use super::types::{DashboardSnapshot, EngineMessage};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};

/// Interval between throughput log lines
const THROUGHPUT_LOG_SECS: u64 = 10;

/// Run the engine loop until shutdown or until every sender is gone.
///
/// Arguments:
/// - `engine`: engine instance, owned by this loop for its whole life
/// - `rx`: receiver for stream frames and status ticks
/// - `snapshot_tx`: where published snapshots go
/// - `shutdown`: flips to `true` (or closes) when the runtime stops
///
/// Returns the engine so callers can inspect final state.
pub async fn run_engine_loop(
    mut engine: LiveEngine,
    mut rx: mpsc::Receiver<EngineMessage>,
    snapshot_tx: watch::Sender<Arc<DashboardSnapshot>>,
    mut shutdown: watch::Receiver<bool>,
) -> LiveEngine {
    log::info!("🚀 Starting engine loop");
    log::info!("   └─ Waiting for stream messages...");

    let mut accepted_at_last_log = 0u64;
    let mut last_log_time = Instant::now();

    loop {
        tokio::select! {
            biased;

            _ = shutdown.changed() => {
                if *shutdown.borrow() || shutdown.has_changed().is_err() {
                    log::info!("⚠️  Shutdown signaled, engine stops accepting updates");
                    engine.shutdown();
                    publish(&engine, &snapshot_tx);
                    break;
                }
            }

            message = rx.recv() => {
                let Some(message) = message else {
                    log::warn!("⚠️  Engine channel closed, stopping engine loop");
                    break;
                };

                let is_shutdown = matches!(message, EngineMessage::Shutdown);
                if engine.handle(message) {
                    publish(&engine, &snapshot_tx);
                }
                if is_shutdown {
                    log::info!("Engine received shutdown message");
                    break;
                }

                if last_log_time.elapsed().as_secs() >= THROUGHPUT_LOG_SECS {
                    let stats = engine.stats();
                    let rate = (stats.accepted - accepted_at_last_log) as f64
                        / last_log_time.elapsed().as_secs_f64();
                    log::info!(
                        "📊 Ingestion rate: {:.1} events/sec (accepted: {}, malformed: {}, window: {})",
                        rate,
                        stats.accepted,
                        stats.malformed,
                        engine.window().len()
                    );
                    accepted_at_last_log = stats.accepted;
                    last_log_time = Instant::now();
                }
            }
        }
    }

    log::info!("✅ Engine loop stopped");
    engine
}

fn publish(engine: &LiveEngine, snapshot_tx: &watch::Sender<Arc<DashboardSnapshot>>) {
    // No receivers is fine: nothing is watching yet
    snapshot_tx.send_replace(Arc::new(engine.snapshot()));
}
