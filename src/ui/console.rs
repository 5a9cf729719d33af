use crate::pipeline::types::DEFAULT_RECENT_LIMIT;
use crate::pipeline::DashboardSnapshot;
use crate::ui::renderer::{format_alert, format_latest_sample, format_status_line};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Run the console presenter
///
/// Logs a status line whenever a new snapshot has been published since the
/// last refresh, plus one alert line per newly accepted accident.
pub async fn run_console(
    mut snapshots: watch::Receiver<Arc<DashboardSnapshot>>,
    refresh_ms: u64,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut timer = interval(Duration::from_millis(refresh_ms));
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_accepted = 0u64;

    loop {
        tokio::select! {
            _ = timer.tick() => {}
            _ = shutdown.changed() => break,
        }

        match snapshots.has_changed() {
            Ok(true) => {}
            Ok(false) => continue,
            Err(_) => break, // engine loop is gone
        }

        let snapshot = snapshots.borrow_and_update().clone();
        for line in new_alerts(&snapshot, last_accepted) {
            log::warn!("🚨 {}", line);
        }
        last_accepted = snapshot.stats.accepted;

        log::info!("📊 {}", format_status_line(&snapshot));
        if let Some(sample) = format_latest_sample(&snapshot) {
            log::debug!("   └─ {}", sample);
        }
    }

    log::info!("Console presenter stopped");
}

/// Alert lines for accidents accepted since `last_accepted`
fn new_alerts(snapshot: &DashboardSnapshot, last_accepted: u64) -> Vec<String> {
    let fresh = snapshot.stats.accepted.saturating_sub(last_accepted) as usize;
    snapshot
        .recent(fresh.min(DEFAULT_RECENT_LIMIT))
        .iter()
        .filter(|e| e.accident)
        .map(format_alert)
        .collect()
}
