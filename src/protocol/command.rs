//! Worker loop commands.
//!
//! Every effectful operation against the transport is expressed as a
//! [`Command`] and applied by the worker strictly in submission order.

// ============================================================================
// Imports
// ============================================================================

use crate::identifiers::ConnectionEpoch;

// ============================================================================
// Command
// ============================================================================

/// A unit of work for the worker loop.
///
/// Consumed exactly once, in FIFO order relative to other commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open a connection unless one is already connecting or connected.
    Connect,

    /// Send a text frame. Dropped when not connected.
    Send(String),

    /// Close the connection with the configured code and reason.
    Close,

    /// Stop the worker loop. Commands submitted afterwards are rejected.
    Shutdown,

    /// Keepalive firing scheduled by the worker itself.
    ///
    /// Ignored unless `epoch` is still current and the connection is
    /// still connected.
    Keepalive {
        /// Connection attempt the probe was scheduled for.
        epoch: ConnectionEpoch,
        /// Frames to send.
        probe: KeepaliveProbe,
    },
}

impl Command {
    /// Creates a send command.
    #[inline]
    pub fn send(text: impl Into<String>) -> Self {
        Self::Send(text.into())
    }

    /// Returns the command name for logging.
    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Send(_) => "send",
            Self::Close => "close",
            Self::Shutdown => "shutdown",
            Self::Keepalive { .. } => "keepalive",
        }
    }
}

// ============================================================================
// KeepaliveProbe
// ============================================================================

/// Frames sent when a keepalive task fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepaliveProbe {
    /// First probe after open: a ping followed by the greeting text.
    PingWithGreeting,
    /// Probe after each pong: a ping only.
    Ping,
}

impl KeepaliveProbe {
    /// Returns `true` if the greeting text follows the ping.
    #[inline]
    #[must_use]
    pub const fn sends_greeting(self) -> bool {
        matches!(self, Self::PingWithGreeting)
    }
}

// ============================================================================
// Tests
// ============================================================================
