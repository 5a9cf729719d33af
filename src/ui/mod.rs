//! Console presentation of published dashboard snapshots
//!
//! Read-only: presenters hold a watch receiver and never a handle that can
//! mutate engine state.

pub mod console;
pub mod renderer;

pub use console::run_console;
