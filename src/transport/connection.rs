//! WebSocket connection over `tokio-tungstenite`.
//!
//! [`WsTransport::open`] spawns a task that performs the client
//! handshake. On success the stream is split: the write half becomes a
//! [`WsSession`] handed to the worker through `on_open`, and the read
//! half stays in the task, translating frames into callbacks.
//!
//! # Read Loop
//!
//! | Frame | Callback |
//! |-------|----------|
//! | Text | `on_message(Payload::Text)` |
//! | Binary | `on_message(Payload::Binary)` |
//! | Pong | `on_pong` |
//! | Close | `on_close(code, reason)`, loop ends |
//! | Error / end of stream | `on_failure`, loop ends |
//!
//! Inbound pings are answered by tungstenite itself.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::error::{Error, Result};

use super::{EventSink, Payload, Session, Transport};

// ============================================================================
// Constants
// ============================================================================

/// HTTP status of a successful WebSocket upgrade.
pub const SWITCHING_PROTOCOLS: u16 = 101;

/// Close code reported when the remote close frame carries no status.
const NO_STATUS_RECEIVED: u16 = 1005;

// ============================================================================
// Types
// ============================================================================

/// Client WebSocket stream.
type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// WsTransport
// ============================================================================

/// [`Transport`] backed by `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsTransport;

impl WsTransport {
    /// Creates a new transport.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Performs the handshake and runs the read loop.
    async fn run(endpoint: String, events: EventSink) {
        let (ws_stream, response) = match connect_async(endpoint.as_str()).await {
            Ok(pair) => pair,
            Err(WsError::Http(response)) => {
                let status = response.status().as_u16();
                warn!(%endpoint, status, "WebSocket upgrade rejected");
                events.on_failure(Error::handshake_rejected(status));
                return;
            }
            Err(e) => {
                warn!(%endpoint, error = %e, "WebSocket connect failed");
                events.on_failure(Error::WebSocket(e));
                return;
            }
        };

        let status = response.status().as_u16();
        info!(%endpoint, status, epoch = %events.epoch(), "WebSocket handshake completed");

        let (ws_write, ws_read) = ws_stream.split();
        events.on_open(Box::new(WsSession { ws_write }), status);

        Self::read_loop(ws_read, &events).await;

        debug!(epoch = %events.epoch(), "Read loop terminated");
    }

    /// Translates inbound frames into callbacks until the stream ends.
    async fn read_loop(mut ws_read: SplitStream<WsStream>, events: &EventSink) {
        while let Some(message) = ws_read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    events.on_message(Payload::Text(text.as_str().to_owned()));
                }

                Ok(Message::Binary(data)) => {
                    events.on_message(Payload::Binary(data.to_vec()));
                }

                Ok(Message::Pong(_)) => {
                    events.on_pong();
                }

                Ok(Message::Close(frame)) => {
                    let (code, reason) = frame
                        .map(|f| (u16::from(f.code), f.reason.as_str().to_owned()))
                        .unwrap_or((NO_STATUS_RECEIVED, String::new()));
                    debug!(code, %reason, "WebSocket closed by remote");
                    events.on_close(code, reason);
                    return;
                }

                // Pings are answered by tungstenite
                Ok(_) => {
                    trace!("Ignoring control frame");
                }

                Err(e) => {
                    warn!(error = %e, "WebSocket read failed");
                    events.on_failure(Error::WebSocket(e));
                    return;
                }
            }
        }

        debug!("WebSocket stream ended without close frame");
        events.on_failure(Error::ConnectionClosed);
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn open(&self, endpoint: &Url, events: EventSink) -> Result<()> {
        debug!(%endpoint, epoch = %events.epoch(), "Starting WebSocket handshake");
        tokio::spawn(Self::run(endpoint.to_string(), events));
        Ok(())
    }
}

// ============================================================================
// WsSession
// ============================================================================

/// Write half of a `tokio-tungstenite` connection.
pub struct WsSession {
    ws_write: SplitSink<WsStream, Message>,
}

#[async_trait]
impl Session for WsSession {
    async fn send_text(&mut self, text: &str) -> Result<()> {
        self.ws_write
            .send(Message::Text(text.to_owned().into()))
            .await?;
        trace!(len = text.len(), "Text frame sent");
        Ok(())
    }

    async fn send_ping(&mut self) -> Result<()> {
        self.ws_write.send(Message::Ping(Default::default())).await?;
        trace!("Ping frame sent");
        Ok(())
    }

    async fn close(&mut self, code: u16, reason: &str) -> Result<()> {
        let frame = CloseFrame {
            code: CloseCode::from(code),
            reason: reason.to_owned().into(),
        };
        self.ws_write.send(Message::Close(Some(frame))).await?;
        debug!(code, reason, "Close frame sent");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
