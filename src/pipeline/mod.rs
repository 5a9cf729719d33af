//! # Live Pipeline
//!
//! Wires the aggregator core into a running system:
//!
//! - `engine` - owns window, heat points, series, and status model
//! - `ingestion` - the single engine loop that serializes every mutation
//! - `scheduler` - status reconciler tick loop
//! - `sources` - summary and health snapshot endpoints
//! - `status` - per-source last-known-good fold
//! - `types` - engine messages and published snapshots
//! - `config` - runtime configuration from environment variables
//!
//! ## Data flow
//!
//! ```text
//! stream client ──frames──┐
//!                         ├──> mpsc ──> run_engine_loop ──watch──> presenters
//! status scheduler ─ticks─┘
//! ```
//!
//! The two producers never wait on each other; the engine loop applies
//! their messages one at a time in arrival order.

pub mod config;
pub mod engine;
pub mod ingestion;
pub mod scheduler;
pub mod sources;
pub mod status;
pub mod types;

pub use config::PipelineConfig;
pub use engine::LiveEngine;
pub use ingestion::run_engine_loop;
pub use scheduler::{poll_once, status_scheduler_task};
pub use sources::{HttpSnapshotSource, SnapshotSource};
pub use status::{Record, SourceKind, SourceState, StatusModel, TickOutcome};
pub use types::{DashboardSnapshot, EngineMessage, EngineStats};
