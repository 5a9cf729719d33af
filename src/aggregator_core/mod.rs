//! Aggregator Core - bounded window and derived views
//!
//! Pure, synchronous building blocks of the live engine. Nothing in here
//! touches the network or the clock except `normalizer`, which stamps
//! receipt time supplied by the caller.
//!
//! # Architecture
//!
//! ```text
//! raw frame → Event::from_payload
//!     ↓
//! EventWindow::insert (newest-first, capacity-bounded)
//!     ↓
//! heat_points(window)        ← full recompute per insert
//! TimeSeries::append(event)  ← incremental, capped
//! ```

pub mod heat;
pub mod normalizer;
pub mod series;
pub mod window;

pub use heat::{heat_points, HeatPoint};
pub use normalizer::Event;
pub use series::{SeriesSample, TimeSeries};
pub use window::EventWindow;
