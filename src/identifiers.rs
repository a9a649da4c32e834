//! Type-safe identifiers.
//!
//! Newtype wrappers keep subscription handles and connection epochs
//! from being mixed up with plain integers or strings.
//!
//! | Type | Backing | Purpose |
//! |------|---------|---------|
//! | [`SubscriptionId`] | UUID v4 | Handle for a bus subscription |
//! | [`ConnectionEpoch`] | `u64` | Tags one `Connect` attempt and its callbacks |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// SubscriptionId
// ============================================================================

/// Identifier returned by [`EventBus::subscribe`](crate::bus::EventBus::subscribe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Generates a fresh random subscription ID.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[inline]
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ConnectionEpoch
// ============================================================================

/// Monotonic counter identifying one connection attempt.
///
/// The worker bumps the epoch on every `Connect` it actually starts.
/// Callbacks and keepalive firings from an older epoch are discarded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionEpoch(u64);

impl ConnectionEpoch {
    /// Epoch before any connection attempt.
    pub const INITIAL: Self = Self(0);

    /// Returns the epoch following this one.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Returns the raw counter value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
