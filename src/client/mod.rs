//! Connection lifecycle: worker loop, state and keepalive.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Client`] | Handle for submitting commands and reading state |
//! | [`ClientOptions`] | Endpoint, close frame and keepalive settings |
//! | [`ConnectionState`] | Disconnected / Connecting / Connected |
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use socket_keepalive::{Client, ClientOptions, LocalBus, WsTransport};
//!
//! # async fn example() -> socket_keepalive::Result<()> {
//! let options = ClientOptions::builder()
//!     .endpoint("ws://127.0.0.1:5000")
//!     .build()?;
//!
//! let client = Client::spawn(Arc::new(WsTransport::new()), LocalBus::new(), options);
//! client.connect()?;
//! client.send("hello")?;
//! client.shutdown()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Caller-facing client handle.
pub mod core;

/// Delayed ping scheduling.
mod keepalive;

/// Client options and builder.
pub mod options;

/// Atomic connection state.
pub mod state;

/// Single-consumer command loop.
mod worker;

// ============================================================================
// Re-exports
// ============================================================================

pub use self::core::Client;
pub use options::{ClientOptions, ClientOptionsBuilder};
pub use state::{AtomicConnectionState, ConnectionState};
