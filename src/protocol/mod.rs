//! Message types crossing the client's boundaries.
//!
//! # Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | [`Command`] | Caller → Worker | Unit of work for the worker loop |
//! | [`BusEvent`] | Bus ↔ Bridge | Publish/subscribe contract |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Worker commands and keepalive probes |
//! | `event` | Publish/subscribe event kinds |

// ============================================================================
// Submodules
// ============================================================================

/// Worker loop commands.
pub mod command;

/// Publish/subscribe event types.
pub mod event;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{Command, KeepaliveProbe};
pub use event::BusEvent;
