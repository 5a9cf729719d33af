//! Pipeline configuration from environment variables

use crate::aggregator_core::{series::DEFAULT_SERIES_CAPACITY, window::DEFAULT_WINDOW_CAPACITY};
use crate::error::ConfigError;
use crate::streamer_core::StreamClientConfig;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Configuration for the live runtime
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Detection stream WebSocket URL
    pub stream_url: String,

    /// Summary snapshot endpoint
    pub summary_url: String,

    /// Health snapshot endpoint
    pub health_url: String,

    /// Status reconciler tick interval in milliseconds
    pub poll_interval_ms: u64,

    /// Per-request status poll timeout in milliseconds
    pub poll_timeout_ms: u64,

    /// Maximum events kept in the window
    pub window_capacity: usize,

    /// Maximum samples kept in the confidence series
    pub series_capacity: usize,

    /// Engine channel buffer size (messages)
    pub channel_buffer: usize,

    /// Reconnect the stream after it drops
    pub reconnect: bool,

    pub reconnect_initial_ms: u64,
    pub reconnect_max_ms: u64,

    /// 0 means retry forever
    pub reconnect_max_retries: u32,

    /// Console presenter refresh interval in milliseconds
    pub console_refresh_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stream_url: "ws://localhost:8002/ws".to_string(),
            summary_url: "http://localhost:8000/summary".to_string(),
            health_url: "http://localhost:8001/health".to_string(),
            poll_interval_ms: 2_000,
            poll_timeout_ms: 1_500,
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            series_capacity: DEFAULT_SERIES_CAPACITY,
            channel_buffer: 1_000,
            reconnect: true,
            reconnect_initial_ms: 500,
            reconnect_max_ms: 30_000,
            reconnect_max_retries: 0,
            console_refresh_ms: 1_000,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `CRASHNET_WS_URL` (default: ws://localhost:8002/ws)
    /// - `CRASHNET_SUMMARY_URL` (default: http://localhost:8000/summary)
    /// - `CRASHNET_HEALTH_URL` (default: http://localhost:8001/health)
    /// - `STATUS_POLL_INTERVAL_MS` (default: 2000)
    /// - `STATUS_POLL_TIMEOUT_MS` (default: 1500)
    /// - `EVENT_WINDOW_CAPACITY` (default: 600)
    /// - `SERIES_CAPACITY` (default: 100)
    /// - `ENGINE_CHANNEL_BUFFER` (default: 1000)
    /// - `STREAM_RECONNECT` (default: true)
    /// - `RECONNECT_INITIAL_MS` (default: 500)
    /// - `RECONNECT_MAX_MS` (default: 30000)
    /// - `RECONNECT_MAX_RETRIES` (default: 0, unlimited)
    /// - `CONSOLE_REFRESH_MS` (default: 1000)
    ///
    /// Unparsable values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            stream_url: env::var("CRASHNET_WS_URL").unwrap_or(defaults.stream_url),
            summary_url: env::var("CRASHNET_SUMMARY_URL").unwrap_or(defaults.summary_url),
            health_url: env::var("CRASHNET_HEALTH_URL").unwrap_or(defaults.health_url),
            poll_interval_ms: parse_var("STATUS_POLL_INTERVAL_MS", defaults.poll_interval_ms),
            poll_timeout_ms: parse_var("STATUS_POLL_TIMEOUT_MS", defaults.poll_timeout_ms),
            window_capacity: parse_var("EVENT_WINDOW_CAPACITY", defaults.window_capacity),
            series_capacity: parse_var("SERIES_CAPACITY", defaults.series_capacity),
            channel_buffer: parse_var("ENGINE_CHANNEL_BUFFER", defaults.channel_buffer),
            reconnect: env::var("STREAM_RECONNECT")
                .ok()
                .and_then(|s| s.trim().to_lowercase().parse().ok())
                .unwrap_or(defaults.reconnect),
            reconnect_initial_ms: parse_var("RECONNECT_INITIAL_MS", defaults.reconnect_initial_ms),
            reconnect_max_ms: parse_var("RECONNECT_MAX_MS", defaults.reconnect_max_ms),
            reconnect_max_retries: parse_var("RECONNECT_MAX_RETRIES", defaults.reconnect_max_retries),
            console_refresh_ms: parse_var("CONSOLE_REFRESH_MS", defaults.console_refresh_ms),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.stream_url.starts_with("ws://") && !self.stream_url.starts_with("wss://") {
            return Err(ConfigError::InvalidValue(
                "CRASHNET_WS_URL must start with ws:// or wss://".to_string(),
            ));
        }

        for (name, url) in [
            ("CRASHNET_SUMMARY_URL", &self.summary_url),
            ("CRASHNET_HEALTH_URL", &self.health_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::InvalidValue(format!(
                    "{} must start with http:// or https://",
                    name
                )));
            }
        }

        for (name, value) in [
            ("EVENT_WINDOW_CAPACITY", self.window_capacity),
            ("SERIES_CAPACITY", self.series_capacity),
            ("ENGINE_CHANNEL_BUFFER", self.channel_buffer),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue(format!("{} must be greater than 0", name)));
            }
        }

        if self.poll_interval_ms == 0 || self.console_refresh_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "STATUS_POLL_INTERVAL_MS and CONSOLE_REFRESH_MS must be greater than 0".to_string(),
            ));
        }

        if self.poll_timeout_ms == 0 || self.poll_timeout_ms >= self.poll_interval_ms {
            return Err(ConfigError::InvalidValue(format!(
                "STATUS_POLL_TIMEOUT_MS ({}) must be between 1 and STATUS_POLL_INTERVAL_MS ({})",
                self.poll_timeout_ms, self.poll_interval_ms
            )));
        }

        if self.reconnect_initial_ms == 0 || self.reconnect_initial_ms > self.reconnect_max_ms {
            return Err(ConfigError::InvalidValue(
                "RECONNECT_INITIAL_MS must be between 1 and RECONNECT_MAX_MS".to_string(),
            ));
        }

        Ok(())
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn stream_client(&self) -> StreamClientConfig {
        StreamClientConfig {
            url: self.stream_url.clone(),
            reconnect: self.reconnect,
            initial_delay: Duration::from_millis(self.reconnect_initial_ms),
            max_delay: Duration::from_millis(self.reconnect_max_ms),
            max_retries: (self.reconnect_max_retries > 0).then_some(self.reconnect_max_retries),
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}
