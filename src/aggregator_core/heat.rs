//! Heat point derivation from the event window

use super::normalizer::Event;
use serde::Serialize;

/// Weight given to every accident regardless of score
pub const ACCIDENT_INTENSITY: f64 = 1.5;
pub const MIN_INTENSITY: f64 = 0.2;
pub const MAX_NORMAL_INTENSITY: f64 = 1.0;

/// Weighted point for a spatial density layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatPoint {
    pub lat: f64,
    pub lon: f64,
    pub intensity: f64,
}

impl From<&Event> for HeatPoint {
    fn from(event: &Event) -> Self {
        Self {
            lat: event.lat,
            lon: event.lon,
            intensity: intensity(event),
        }
    }
}

/// Heat weight of a single event.
///
/// Accidents are pinned to 1.5. Other events scale with score magnitude,
/// `(|score| + 1) / 10` clamped to `[0.2, 1.0]`.
pub fn intensity(event: &Event) -> f64 {
    if event.accident {
        return ACCIDENT_INTENSITY;
    }

    let scaled = (event.score.abs() + 1.0) / 10.0;
    if scaled.is_nan() {
        return MIN_INTENSITY;
    }
    scaled.clamp(MIN_INTENSITY, MAX_NORMAL_INTENSITY)
}

/// Recompute the full point set from a window snapshot, preserving its order
pub fn heat_points(window: &[Event]) -> Vec<HeatPoint> {
    window.iter().map(HeatPoint::from).collect()
}
