//! Live engine - owns the window and every structure derived from it
//!
//! One engine instance holds the event window, heat points, confidence
//! series, and status model. Each stream message is applied as one
//! synchronous step:
//!
//! ```text
//! normalize → window.insert → recompute heat → append sample
//! ```
//!
//! so a reader never observes a window that disagrees with its heat points
//! or series. Status ticks are folded by `apply_status` without touching
//! the window side.

use super::status::{StatusModel, TickOutcome};
use super::types::{DashboardSnapshot, EngineMessage, EngineStats};
use crate::aggregator_core::{
    heat_points,
    series::DEFAULT_SERIES_CAPACITY,
    window::DEFAULT_WINDOW_CAPACITY,
    Event,
    EventWindow,
    HeatPoint,
    SeriesSample,
    TimeSeries,
};
use crate::error::LiveError;
use chrono::{DateTime, Utc};

pub struct LiveEngine {
    window: EventWindow,
    heat: Vec<HeatPoint>,
    series: TimeSeries,
    status: StatusModel,
    stats: EngineStats,
    stream_connected: bool,
    shut_down: bool,
}

impl LiveEngine {
    pub fn new(window_capacity: usize, series_capacity: usize) -> Self {
        Self {
            window: EventWindow::new(window_capacity),
            heat: Vec::with_capacity(window_capacity),
            series: TimeSeries::new(series_capacity),
            status: StatusModel::new(),
            stats: EngineStats::default(),
            stream_connected: false,
            shut_down: false,
        }
    }

    /// Dispatch one engine message. Returns true if observable state changed.
    pub fn handle(&mut self, message: EngineMessage) -> bool {
        if self.shut_down {
            log::debug!("Engine shut down, discarding {:?}", message_kind(&message));
            return false;
        }

        match message {
            EngineMessage::Stream { payload, received_at } => {
                match self.ingest(&payload, received_at) {
                    Ok(_) => true,
                    Err(e) => {
                        log::warn!("⚠️  Dropping stream message: {}", e);
                        log::debug!("   └─ payload: {}", String::from_utf8_lossy(&payload));
                        true
                    }
                }
            }
            EngineMessage::StreamConnected => {
                self.stream_connected = true;
                true
            }
            EngineMessage::StreamClosed(reason) => {
                self.stream_closed(&reason);
                true
            }
            EngineMessage::Status(outcome) => self.apply_status(outcome),
            EngineMessage::Shutdown => {
                self.shutdown();
                true
            }
        }
    }

    /// Normalize a raw payload and apply it.
    ///
    /// A malformed payload leaves window, heat, and series untouched.
    pub fn ingest(&mut self, payload: &[u8], received_at: DateTime<Utc>) -> Result<&[Event], LiveError> {
        if self.shut_down {
            return Ok(self.window.snapshot());
        }

        match Event::from_payload(payload, received_at) {
            Ok(event) => Ok(self.insert_event(event)),
            Err(e) => {
                self.stats.malformed += 1;
                Err(e)
            }
        }
    }

    /// Insert a canonical event and refresh the derived views.
    ///
    /// Returns the new window snapshot.
    pub fn insert_event(&mut self, event: Event) -> &[Event] {
        if self.shut_down {
            return self.window.snapshot();
        }

        self.series.append(&event);
        if let Some(evicted) = self.window.insert(event) {
            log::trace!("Evicted {} from window", evicted.id);
        }
        self.heat = heat_points(self.window.snapshot());
        self.stats.accepted += 1;

        self.window.snapshot()
    }

    /// Fold one reconciler tick into the status model
    pub fn apply_status(&mut self, outcome: TickOutcome) -> bool {
        if self.shut_down {
            return false;
        }
        self.status.reconcile(outcome);
        self.stats.status_ticks += 1;
        true
    }

    /// Record a lost stream. Window, heat, and series stay as they are.
    pub fn stream_closed(&mut self, reason: &str) {
        if self.stream_connected {
            self.stats.disconnects += 1;
        }
        self.stream_connected = false;
        log::warn!("⚠️  {}", LiveError::ConnectionClosed(reason.to_string()));
        log::info!(
            "   └─ Keeping {} events, {} samples",
            self.window.len(),
            self.series.len()
        );
    }

    /// Stop accepting mutations. Later messages are discarded.
    pub fn shutdown(&mut self) {
        self.shut_down = true;
        self.stream_connected = false;
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    pub fn window(&self) -> &[Event] {
        self.window.snapshot()
    }

    pub fn heat(&self) -> &[HeatPoint] {
        &self.heat
    }

    pub fn series(&self) -> &[SeriesSample] {
        self.series.samples()
    }

    pub fn status(&self) -> &StatusModel {
        &self.status
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Owned copy of all derived state
    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            window: self.window.snapshot().to_vec(),
            heat: self.heat.clone(),
            series: self.series.samples().to_vec(),
            status: self.status.clone(),
            stats: self.stats,
            stream_connected: self.stream_connected,
        }
    }
}

impl Default for LiveEngine {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY, DEFAULT_SERIES_CAPACITY)
    }
}

fn message_kind(message: &EngineMessage) -> &'static str {
    match message {
        EngineMessage::Stream { .. } => "stream frame",
        EngineMessage::StreamConnected => "stream connected",
        EngineMessage::StreamClosed(_) => "stream closed",
        EngineMessage::Status(_) => "status tick",
        EngineMessage::Shutdown => "shutdown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::status::{Record, SourceKind};
    use serde_json::json;

    fn frame(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_accident_event_lands_in_window_and_heat() {
        let mut engine = LiveEngine::default();
        let payload = frame(json!({"id": "x1", "lat": 1.0, "lon": 2.0, "accident": true, "score": 5}));

        let window = engine.ingest(&payload, Utc::now()).unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].id, "x1");
        assert_eq!((window[0].lat, window[0].lon), (1.0, 2.0));
        assert!(window[0].accident);

        assert_eq!(engine.heat(), &[HeatPoint { lat: 1.0, lon: 2.0, intensity: 1.5 }]);
        assert_eq!(engine.series().len(), 1);
        assert_eq!(engine.series()[0].score, 5.0);
    }

    #[test]
    fn test_normal_event_intensity() {
        let mut engine = LiveEngine::default();
        engine
            .ingest(&frame(json!({"accident": false, "score": 4})), Utc::now())
            .unwrap();
        assert!((engine.heat()[0].intensity - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_malformed_payload_leaves_state_unchanged() {
        let mut engine = LiveEngine::default();
        engine.ingest(&frame(json!({"id": "a"})), Utc::now()).unwrap();
        let before = engine.snapshot();

        let changed = engine.handle(EngineMessage::Stream {
            payload: b"{not json".to_vec(),
            received_at: Utc::now(),
        });
        assert!(changed);
        assert_eq!(engine.window(), before.window.as_slice());
        assert_eq!(engine.heat(), before.heat.as_slice());
        assert_eq!(engine.series(), before.series.as_slice());
        assert_eq!(engine.stats().malformed, 1);
        assert_eq!(engine.stats().accepted, 1);
    }

    #[test]
    fn test_heat_tracks_window_after_eviction() {
        let mut engine = LiveEngine::new(5, 3);
        for i in 0..12 {
            engine.insert_event(Event {
                id: format!("ev-{}", i),
                lat: i as f64,
                lon: 0.0,
                accident: false,
                score: i as f64,
                timestamp: Utc::now(),
            });
        }

        assert_eq!(engine.window().len(), 5);
        assert_eq!(engine.heat().len(), 5);
        for (event, point) in engine.window().iter().zip(engine.heat()) {
            assert_eq!(event.lat, point.lat);
        }
        // series is capped independently of the window
        let scores: Vec<f64> = engine.series().iter().map(|s| s.score).collect();
        assert_eq!(scores, vec![9.0, 10.0, 11.0]);
    }

    #[test]
    fn test_series_sampled_even_when_window_holds_nothing() {
        let mut engine = LiveEngine::new(0, 3);
        for i in 0..4 {
            engine.insert_event(Event {
                id: format!("ev-{}", i),
                lat: 0.0,
                lon: 0.0,
                accident: false,
                score: i as f64,
                timestamp: Utc::now(),
            });
        }

        assert!(engine.window().is_empty());
        assert!(engine.heat().is_empty());
        let scores: Vec<f64> = engine.series().iter().map(|s| s.score).collect();
        assert_eq!(scores, vec![1.0, 2.0, 3.0]);
        assert_eq!(engine.stats().accepted, 4);
    }

    #[test]
    fn test_status_updates_do_not_touch_window() {
        let mut engine = LiveEngine::default();
        engine.ingest(&frame(json!({"id": "a"})), Utc::now()).unwrap();

        engine.handle(EngineMessage::Status(TickOutcome {
            at: Utc::now(),
            summary: Ok(record(json!({"total": 3}))),
            health: Err(LiveError::source_unavailable(SourceKind::Health, "timeout")),
        }));

        assert_eq!(engine.window().len(), 1);
        assert_eq!(engine.status().total(), 3);
        assert_eq!(engine.stats().status_ticks, 1);
    }

    #[test]
    fn test_stream_closed_keeps_state() {
        let mut engine = LiveEngine::default();
        engine.handle(EngineMessage::StreamConnected);
        engine.ingest(&frame(json!({"id": "a"})), Utc::now()).unwrap();

        engine.handle(EngineMessage::StreamClosed("server went away".to_string()));

        let snapshot = engine.snapshot();
        assert!(!snapshot.stream_connected);
        assert_eq!(snapshot.stats.disconnects, 1);
        assert_eq!(snapshot.window_len(), 1);
        assert_eq!(snapshot.heat.len(), 1);
    }

    #[test]
    fn test_messages_after_shutdown_are_discarded() {
        let mut engine = LiveEngine::default();
        engine.ingest(&frame(json!({"id": "a"})), Utc::now()).unwrap();
        assert!(engine.handle(EngineMessage::Shutdown));

        assert!(!engine.handle(EngineMessage::frame(frame(json!({"id": "b"})))));
        assert!(!engine.handle(EngineMessage::Status(TickOutcome {
            at: Utc::now(),
            summary: Ok(record(json!({"total": 99}))),
            health: Ok(record(json!({"model_loaded": true}))),
        })));

        assert_eq!(engine.window().len(), 1);
        assert_eq!(engine.status().total(), 0);
        assert!(engine.is_shut_down());
    }
}
