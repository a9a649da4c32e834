//! Transport adapter capability.
//!
//! The worker loop never touches sockets directly. It drives a
//! [`Transport`] to open connections and a [`Session`] to write frames,
//! and learns about the connection through the five callbacks on
//! [`EventSink`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   open(endpoint, sink)   ┌─────────────────┐
//! │              │─────────────────────────►│                 │
//! │  Worker loop │   send_text / send_ping  │    Transport    │
//! │              │─────────────────────────►│   (+ Session)   │
//! │              │   close(code, reason)    │                 │
//! │              │◄─────────────────────────│                 │
//! └──────────────┘   TransportEvent (sink)  └─────────────────┘
//! ```
//!
//! # Callback Ordering
//!
//! Per connection attempt: at most one `on_open`, then interleaved
//! `on_message` / `on_pong`, then at most one terminal `on_failure` or
//! `on_close`. Every event is tagged with the attempt's
//! [`ConnectionEpoch`] so the worker can discard stragglers.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | `tokio-tungstenite` adapter |

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::trace;
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::ConnectionEpoch;

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection over `tokio-tungstenite`.
pub mod connection;

#[cfg(test)]
pub(crate) mod mock;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{SWITCHING_PROTOCOLS, WsSession, WsTransport};

// ============================================================================
// Traits
// ============================================================================

/// Opens connections to a remote endpoint.
///
/// `open` returns once the attempt has been started. The outcome is
/// reported later through exactly one of [`EventSink::on_open`] or
/// [`EventSink::on_failure`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Starts a connection attempt.
    ///
    /// # Errors
    ///
    /// Returns an error if the attempt cannot even be started. No
    /// callback is delivered in that case.
    async fn open(&self, endpoint: &Url, events: EventSink) -> Result<()>;
}

/// Write half of an open connection.
///
/// Owned exclusively by the worker loop between the open callback and
/// the terminal callback.
#[async_trait]
pub trait Session: Send {
    /// Sends a text frame.
    async fn send_text(&mut self, text: &str) -> Result<()>;

    /// Sends an empty ping frame.
    async fn send_ping(&mut self) -> Result<()>;

    /// Sends a close frame.
    async fn close(&mut self, code: u16, reason: &str) -> Result<()>;
}

/// Boxed session handed to the worker.
pub type BoxSession = Box<dyn Session>;

// ============================================================================
// Payload
// ============================================================================

/// Content of an inbound data frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// UTF-8 text frame.
    Text(String),
    /// Binary frame. Ignored by the worker.
    Binary(Vec<u8>),
}

// ============================================================================
// TransportEvent
// ============================================================================

/// Callback kinds delivered to the worker.
pub enum TransportEventKind {
    /// Handshake completed with the given HTTP status.
    Opened {
        /// Write half of the new connection.
        session: BoxSession,
        /// Upgrade response status.
        status: u16,
    },
    /// Connection attempt or established connection failed.
    Failed(Error),
    /// Data frame received.
    Message(Payload),
    /// Pong frame received.
    Pong,
    /// Close frame received.
    Closed {
        /// Close code reported by the remote end.
        code: u16,
        /// Close reason reported by the remote end.
        reason: String,
    },
}

impl TransportEventKind {
    /// Returns the callback name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Opened { .. } => "open",
            Self::Failed(_) => "failure",
            Self::Message(_) => "message",
            Self::Pong => "pong",
            Self::Closed { .. } => "close",
        }
    }
}

/// A callback tagged with its connection attempt.
pub struct TransportEvent {
    /// Attempt the event belongs to.
    pub epoch: ConnectionEpoch,
    /// Callback payload.
    pub kind: TransportEventKind,
}

// ============================================================================
// EventSink
// ============================================================================

/// Callback target handed to [`Transport::open`].
///
/// Cheap to clone; every clone reports into the same worker under the
/// same epoch. Delivery after the worker has stopped is silently dropped.
#[derive(Clone)]
pub struct EventSink {
    epoch: ConnectionEpoch,
    tx: mpsc::UnboundedSender<TransportEvent>,
}

impl EventSink {
    /// Creates a sink for one connection attempt.
    pub(crate) fn new(epoch: ConnectionEpoch, tx: mpsc::UnboundedSender<TransportEvent>) -> Self {
        Self { epoch, tx }
    }

    /// Returns the connection attempt this sink reports for.
    #[inline]
    #[must_use]
    pub const fn epoch(&self) -> ConnectionEpoch {
        self.epoch
    }

    /// Reports a completed handshake.
    pub fn on_open(&self, session: BoxSession, status: u16) {
        self.deliver(TransportEventKind::Opened { session, status });
    }

    /// Reports a failed attempt or a broken connection.
    pub fn on_failure(&self, error: Error) {
        self.deliver(TransportEventKind::Failed(error));
    }

    /// Reports an inbound data frame.
    pub fn on_message(&self, payload: Payload) {
        self.deliver(TransportEventKind::Message(payload));
    }

    /// Reports an inbound pong frame.
    pub fn on_pong(&self) {
        self.deliver(TransportEventKind::Pong);
    }

    /// Reports an inbound close frame.
    pub fn on_close(&self, code: u16, reason: impl Into<String>) {
        self.deliver(TransportEventKind::Closed {
            code,
            reason: reason.into(),
        });
    }

    fn deliver(&self, kind: TransportEventKind) {
        let name = kind.name();
        let event = TransportEvent {
            epoch: self.epoch,
            kind,
        };
        if self.tx.send(event).is_err() {
            trace!(epoch = %self.epoch, callback = name, "Worker gone, callback dropped");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
