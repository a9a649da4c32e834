//! Connection state tracking.
//!
//! A single atomic tri-state flag is the only source of truth for
//! whether the client is connected. It is read from any thread and
//! changed only through compare-and-set transitions.
//!
//! # Transitions
//!
//! ```text
//!                 Connect
//!  Disconnected ───────────► Connecting
//!       ▲  ▲                     │
//!       │  └─────── failure ─────┤ open (101)
//!       │                        ▼
//!       └── failure / close ─ Connected
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle state of the single logical connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ConnectionState {
    /// No session. Initial state.
    #[default]
    Disconnected = 0,
    /// Open requested, handshake pending.
    Connecting = 1,
    /// Handshake completed, session live.
    Connected = 2,
}

impl ConnectionState {
    #[inline]
    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Connecting,
            2 => Self::Connected,
            _ => Self::Disconnected,
        }
    }

    /// Returns the state name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// AtomicConnectionState
// ============================================================================

/// Lock-free holder for [`ConnectionState`].
#[derive(Default)]
pub struct AtomicConnectionState {
    inner: AtomicU8,
}

impl fmt::Debug for AtomicConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AtomicConnectionState")
            .field(&self.load())
            .finish()
    }
}

impl AtomicConnectionState {
    /// Creates a holder in the `Disconnected` state.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: AtomicU8::new(ConnectionState::Disconnected as u8),
        }
    }

    /// Returns the current state.
    #[inline]
    #[must_use]
    pub fn load(&self) -> ConnectionState {
        ConnectionState::from_u8(self.inner.load(Ordering::Acquire))
    }

    /// Returns `true` if the current state is `Connected`.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.load() == ConnectionState::Connected
    }

    /// Moves from `from` to `to` if the current state is `from`.
    ///
    /// Returns `true` if this call performed the transition.
    #[inline]
    pub fn transition(&self, from: ConnectionState, to: ConnectionState) -> bool {
        self.inner
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Forces `Disconnected` and returns the previous state.
    #[inline]
    pub fn reset(&self) -> ConnectionState {
        ConnectionState::from_u8(
            self.inner
                .swap(ConnectionState::Disconnected as u8, Ordering::AcqRel),
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
