//! Detection stream client with reconnect
//!
//! Connects to the WebSocket detection feed and forwards every text or
//! binary frame to the engine loop untouched; parsing happens there. When
//! the connection drops the engine is told (`StreamClosed`) and the client
//! reconnects with exponential backoff, so engine state survives outages.

use crate::pipeline::types::EngineMessage;
use crate::streamer_core::error_handler::{ExponentialBackoff, MaxRetriesExceeded};
use chrono::Utc;
use futures_util::StreamExt;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

#[derive(Debug, Clone)]
pub struct StreamClientConfig {
    pub url: String,
    pub reconnect: bool,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// `None` reconnects forever
    pub max_retries: Option<u32>,
}

/// Why a connected session ended
#[derive(Debug, PartialEq)]
enum SessionEnd {
    Shutdown,
    EngineGone,
    Closed(String),
}

/// Run the stream client until shutdown.
///
/// Returns `Err` only when a retry cap is configured and exhausted.
pub async fn run_stream_with_reconnect(
    config: StreamClientConfig,
    tx: mpsc::Sender<EngineMessage>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), MaxRetriesExceeded> {
    let mut backoff = ExponentialBackoff::new(config.initial_delay, config.max_delay, config.max_retries);

    loop {
        if *shutdown.borrow() {
            return Ok(());
        }

        log::info!("🔌 Connecting to detection stream: {}", config.url);
        let connected = tokio::select! {
            result = connect_async(config.url.as_str()) => result,
            _ = shutdown.changed() => return Ok(()),
        };

        match connected {
            Ok((ws, _response)) => {
                log::info!("✅ Connected to detection stream");
                backoff.reset();
                if tx.send(EngineMessage::StreamConnected).await.is_err() {
                    return Ok(());
                }

                match run_session(ws, &tx, &mut shutdown).await {
                    SessionEnd::Shutdown | SessionEnd::EngineGone => return Ok(()),
                    SessionEnd::Closed(reason) => {
                        if tx.send(EngineMessage::StreamClosed(reason)).await.is_err() {
                            return Ok(());
                        }
                    }
                }
            }
            Err(e) => {
                log::error!("❌ Stream connection failed: {}", e);
            }
        }

        if !config.reconnect {
            log::warn!("⚠️  Reconnect disabled, stream stays down");
            return Ok(());
        }

        tokio::select! {
            result = backoff.sleep() => result?,
            _ = shutdown.changed() => return Ok(()),
        }
    }
}

async fn run_session(
    mut ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    tx: &mpsc::Sender<EngineMessage>,
    shutdown: &mut watch::Receiver<bool>,
) -> SessionEnd {
    loop {
        let frame = tokio::select! {
            frame = ws.next() => frame,
            _ = shutdown.changed() => {
                if let Err(e) = ws.close(None).await {
                    log::debug!("Close handshake failed: {}", e);
                }
                return SessionEnd::Shutdown;
            }
        };

        let payload = match frame {
            Some(Ok(Message::Text(text))) => text.into_bytes(),
            Some(Ok(Message::Binary(bytes))) => bytes,
            Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
            Some(Ok(Message::Close(close))) => {
                let reason = close
                    .map(|c| format!("server closed ({}): {}", c.code, c.reason))
                    .unwrap_or_else(|| "server closed".to_string());
                return SessionEnd::Closed(reason);
            }
            Some(Err(e)) => return SessionEnd::Closed(e.to_string()),
            None => return SessionEnd::Closed("stream ended".to_string()),
        };

        let message = EngineMessage::Stream {
            payload,
            received_at: Utc::now(),
        };
        if tx.send(message).await.is_err() {
            log::warn!("⚠️  Engine channel closed, dropping stream connection");
            return SessionEnd::EngineGone;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_config(reconnect: bool, max_retries: Option<u32>) -> StreamClientConfig {
        StreamClientConfig {
            // Port 9 (discard) on localhost is not expected to accept WebSocket upgrades
            url: "ws://127.0.0.1:9/ws".to_string(),
            reconnect,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            max_retries,
        }
    }

    #[tokio::test]
    async fn test_no_reconnect_returns_after_failed_connect() {
        let (tx, _rx) = mpsc::channel(8);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            run_stream_with_reconnect(unreachable_config(false, None), tx, shutdown_rx),
        )
        .await
        .expect("client did not give up");
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_retry_cap_exhausted() {
        let (tx, _rx) = mpsc::channel(8);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            run_stream_with_reconnect(unreachable_config(true, Some(2)), tx, shutdown_rx),
        )
        .await
        .expect("client did not give up");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_shutdown_before_start() {
        let (tx, mut rx) = mpsc::channel(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        shutdown_tx.send(true).unwrap();

        let result = run_stream_with_reconnect(unreachable_config(true, None), tx, shutdown_rx).await;
        assert!(result.is_ok());
        assert!(rx.recv().await.is_none());
    }
}
