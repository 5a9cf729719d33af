//! CrashNet live view engine
//!
//! Ingests the live detection stream and two polled snapshot endpoints and
//! keeps a bounded, render-ready view: a newest-first event window, heat
//! points derived from it, a capped confidence series, and a merged status
//! model that survives partial source failures.

pub mod aggregator_core;
pub mod error;
pub mod pipeline;
pub mod streamer_core;
pub mod ui;

pub use aggregator_core::{Event, EventWindow, HeatPoint, SeriesSample, TimeSeries};
pub use error::{ConfigError, LiveError};
pub use pipeline::{DashboardSnapshot, EngineMessage, LiveEngine, PipelineConfig, StatusModel};
