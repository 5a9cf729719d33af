//! Error taxonomy for the live engine
//!
//! Every variant is recovered locally by the component that raises it:
//! nothing here is fatal to the process.

use crate::pipeline::status::SourceKind;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum LiveError {
    /// Inbound stream payload could not be parsed. The message is dropped
    /// and the stream keeps flowing.
    #[error("malformed stream message: {0}")]
    MalformedMessage(String),

    /// A single poll of a status source failed (network, non-2xx, timeout).
    #[error("{kind} source unavailable: {reason}")]
    SourceUnavailable { kind: SourceKind, reason: String },

    /// The stream connection terminated.
    #[error("stream connection closed: {0}")]
    ConnectionClosed(String),
}

impl LiveError {
    pub fn source_unavailable(kind: SourceKind, reason: impl Into<String>) -> Self {
        LiveError::SourceUnavailable {
            kind,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}
