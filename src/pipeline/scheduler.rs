//! Status reconciler tick loop
//!
//! Every tick polls the summary and health sources concurrently, each under
//! its own timeout, and forwards both results to the engine loop as one
//! `EngineMessage::Status`. The loop awaits a tick's polls before waiting
//! for the next tick, so polls never overlap; ticks missed while a slow
//! poll was in flight are skipped rather than replayed.

use super::sources::SnapshotSource;
use super::status::{Record, TickOutcome};
use super::types::EngineMessage;
use crate::error::LiveError;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Poll both sources once, concurrently.
///
/// Neither result waits on, cancels, or alters the other.
pub async fn poll_once(
    summary: &dyn SnapshotSource,
    health: &dyn SnapshotSource,
    timeout: Duration,
) -> TickOutcome {
    let (summary, health) = tokio::join!(
        fetch_with_timeout(summary, timeout),
        fetch_with_timeout(health, timeout),
    );

    TickOutcome {
        at: Utc::now(),
        summary,
        health,
    }
}

async fn fetch_with_timeout(source: &dyn SnapshotSource, limit: Duration) -> Result<Record, LiveError> {
    match tokio::time::timeout(limit, source.fetch()).await {
        Ok(result) => result,
        Err(_) => Err(LiveError::source_unavailable(
            source.kind(),
            format!("timed out after {}ms", limit.as_millis()),
        )),
    }
}

/// Status scheduler task - periodically poll both sources
///
/// Arguments:
/// - `summary`, `health`: the two snapshot sources
/// - `interval_ms`: tick interval in milliseconds
/// - `timeout_ms`: per-request timeout, expected to be shorter than the interval
/// - `tx`: engine loop channel
/// - `shutdown`: flips to `true` (or closes) when the runtime stops
///
/// Runs until shutdown or until the engine channel closes. A poll already
/// in flight at shutdown runs to completion but its result is dropped.
pub async fn status_scheduler_task(
    summary: Arc<dyn SnapshotSource>,
    health: Arc<dyn SnapshotSource>,
    interval_ms: u64,
    timeout_ms: u64,
    tx: mpsc::Sender<EngineMessage>,
    mut shutdown: watch::Receiver<bool>,
) {
    log::info!(
        "⏰ Starting status reconciler (interval: {}ms, timeout: {}ms)",
        interval_ms,
        timeout_ms
    );

    let mut timer = interval(Duration::from_millis(interval_ms));
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let timeout = Duration::from_millis(timeout_ms);

    loop {
        tokio::select! {
            _ = timer.tick() => {}
            _ = shutdown.changed() => break,
        }
        if *shutdown.borrow() {
            break;
        }

        let outcome = poll_once(summary.as_ref(), health.as_ref(), timeout).await;

        if *shutdown.borrow() {
            log::debug!("Discarding status poll that finished after shutdown");
            break;
        }

        if tx.send(EngineMessage::Status(outcome)).await.is_err() {
            log::warn!("⚠️  Engine channel closed, stopping status reconciler");
            break;
        }
    }

    log::info!("✅ Status reconciler stopped");
}
