// Renderer module - formatting utilities for snapshot views

use crate::aggregator_core::{series::time_label, Event};
use crate::pipeline::DashboardSnapshot;

/// One-line header: model state, window size, accidents
pub fn format_status_line(snapshot: &DashboardSnapshot) -> String {
    let model = match snapshot.status.model_loaded() {
        Some(loaded) => loaded.to_string(),
        None => "unknown".to_string(),
    };
    let stream = if snapshot.stream_connected { "up" } else { "down" };

    format!(
        "stream={} model_loaded={} window={} accidents_in_window={} recent_accidents={} total={} avg_speed={:.1}",
        stream,
        model,
        snapshot.window_len(),
        snapshot.accident_count(),
        snapshot.status.recent_accidents(),
        snapshot.status.total(),
        snapshot.status.avg_speed(),
    )
}

/// Alert list entry, e.g. `⚠ Accident — dev-3 | score: 2.1 • 14:03:22 • 28.6139,77.2090`
pub fn format_alert(event: &Event) -> String {
    let kind = if event.accident { "⚠ Accident" } else { "Normal" };
    format!(
        "{} — {} | score: {} • {} • {:.4},{:.4}",
        kind,
        event.id,
        event.score,
        time_label(event.timestamp),
        event.lat,
        event.lon
    )
}

/// Latest confidence sample, if any
pub fn format_latest_sample(snapshot: &DashboardSnapshot) -> Option<String> {
    snapshot
        .series
        .last()
        .map(|s| format!("confidence @ {}: {:.2}", s.label, s.score))
}
