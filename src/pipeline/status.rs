//! Status model: last-known-good snapshots from the summary and health sources
//!
//! Each source is folded independently. A failed poll records the error and
//! leaves that source's record untouched; it never reaches the other source.

use crate::error::LiveError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Opaque key-value record as returned by a source
pub type Record = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Summary,
    Health,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Summary => "summary",
            SourceKind::Health => "health",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-source state: the preserved record plus poll diagnostics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SourceState {
    pub record: Record,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
}

impl SourceState {
    /// Fold one poll result. Only a success replaces the record.
    pub fn apply(&mut self, kind: SourceKind, result: Result<Record, LiveError>, at: DateTime<Utc>) {
        match result {
            Ok(record) => {
                if self.consecutive_failures > 0 {
                    log::info!(
                        "✅ {} source recovered after {} failed polls",
                        kind,
                        self.consecutive_failures
                    );
                }
                self.record = record;
                self.last_success = Some(at);
                self.last_error = None;
                self.consecutive_failures = 0;
            }
            Err(e) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                log::warn!(
                    "⚠️  {} (failure #{}, keeping last good value)",
                    e,
                    self.consecutive_failures
                );
                self.last_error = Some(e.to_string());
            }
        }
    }
}

/// Results of one reconciler tick, one per source
#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub at: DateTime<Utc>,
    pub summary: Result<Record, LiveError>,
    pub health: Result<Record, LiveError>,
}

/// Merged view of both sources
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusModel {
    pub summary: SourceState,
    pub health: SourceState,
}

impl StatusModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a tick outcome into the model, each source on its own
    pub fn reconcile(&mut self, outcome: TickOutcome) {
        let TickOutcome { at, summary, health } = outcome;
        self.summary.apply(SourceKind::Summary, summary, at);
        self.health.apply(SourceKind::Health, health, at);
    }

    pub fn source(&self, kind: SourceKind) -> &SourceState {
        match kind {
            SourceKind::Summary => &self.summary,
            SourceKind::Health => &self.health,
        }
    }

    /// `summary.total`, 0 if absent
    pub fn total(&self) -> u64 {
        count_field(&self.summary.record, "total")
    }

    /// `summary.avg_speed`, 0.0 if absent
    pub fn avg_speed(&self) -> f64 {
        self.summary
            .record
            .get("avg_speed")
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    }

    /// `summary.recent_accidents`, 0 if absent
    pub fn recent_accidents(&self) -> u64 {
        count_field(&self.summary.record, "recent_accidents")
    }

    /// `health.model_loaded`; `None` until the health source has reported it
    pub fn model_loaded(&self) -> Option<bool> {
        self.health.record.get("model_loaded").and_then(Value::as_bool)
    }

    pub fn health_status(&self) -> Option<&str> {
        self.health.record.get("status").and_then(Value::as_str)
    }
}

fn count_field(record: &Record, key: &str) -> u64 {
    match record.get(key) {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        _ => 0,
    }
}
