//! Confidence time series sampled once per accepted event

use super::normalizer::Event;
use chrono::{DateTime, Local, Utc};
use serde::Serialize;

/// Default number of retained samples
pub const DEFAULT_SERIES_CAPACITY: usize = 100;

/// Label format for the time axis (local wall clock)
const TIME_LABEL_FORMAT: &str = "%H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSample {
    pub label: String,
    pub score: f64,
}

impl SeriesSample {
    pub fn from_event(event: &Event) -> Self {
        Self {
            label: time_label(event.timestamp),
            score: round_score(event.score),
        }
    }
}

/// Append-only series in arrival order, truncated from the oldest end.
///
/// Independent of window eviction: samples are never recomputed from
/// the window and never reordered.
#[derive(Debug, Clone)]
pub struct TimeSeries {
    samples: Vec<SeriesSample>,
    capacity: usize,
}

impl TimeSeries {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn append(&mut self, event: &Event) {
        self.samples.push(SeriesSample::from_event(event));

        if self.samples.len() > self.capacity {
            let overflow = self.samples.len() - self.capacity;
            self.samples.drain(..overflow);
        }
    }

    /// Samples in append order, oldest first
    pub fn samples(&self) -> &[SeriesSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl Default for TimeSeries {
    fn default() -> Self {
        Self::new(DEFAULT_SERIES_CAPACITY)
    }
}

pub fn time_label(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format(TIME_LABEL_FORMAT).to_string()
}

/// Round to two decimal places, halves toward positive infinity
pub fn round_score(score: f64) -> f64 {
    (score * 100.0 + 0.5).floor() / 100.0
}
