//! Messages into the engine loop and snapshots out of it

use super::status::{StatusModel, TickOutcome};
use crate::aggregator_core::{Event, HeatPoint, SeriesSample};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Default number of events shown as markers / alerts
pub const DEFAULT_RECENT_LIMIT: usize = 200;

/// Everything that can mutate engine state arrives as one of these,
/// so mutations are serialized on the single engine loop.
#[derive(Debug, Clone)]
pub enum EngineMessage {
    /// One raw frame from the stream
    Stream {
        payload: Vec<u8>,
        received_at: DateTime<Utc>,
    },
    StreamConnected,
    /// The stream connection ended; carries the reason
    StreamClosed(String),
    /// Results of one reconciler tick
    Status(TickOutcome),
    Shutdown,
}

impl EngineMessage {
    /// Wrap a frame received now
    pub fn frame(payload: impl Into<Vec<u8>>) -> Self {
        EngineMessage::Stream {
            payload: payload.into(),
            received_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub accepted: u64,
    pub malformed: u64,
    pub disconnects: u64,
    pub status_ticks: u64,
}

/// Read-only view published after every engine mutation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    /// Newest first
    pub window: Vec<Event>,
    /// Same order as `window`
    pub heat: Vec<HeatPoint>,
    /// Oldest first
    pub series: Vec<SeriesSample>,
    pub status: StatusModel,
    pub stats: EngineStats,
    pub stream_connected: bool,
}

impl DashboardSnapshot {
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    pub fn recent(&self, limit: usize) -> &[Event] {
        &self.window[..limit.min(self.window.len())]
    }

    pub fn accident_count(&self) -> usize {
        self.window.iter().filter(|e| e.accident).count()
    }
}
