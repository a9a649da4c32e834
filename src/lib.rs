//! Socket Keepalive - a single long-lived WebSocket connection behind a
//! publish/subscribe bridge.
//!
//! # Architecture
//!
//! ```text
//!  publish(ConnectRequest | SendMessageRequest | DisconnectRequest)
//!        │
//!        ▼
//!  ┌─────────────┐  Command   ┌─────────────┐  open / send / ping / close  ┌───────────┐
//!  │ EventBridge │───────────►│ Worker loop │─────────────────────────────►│ Transport │
//!  └─────────────┘            └─────────────┘◄─────────────────────────────└───────────┘
//!        ▲                       │       ▲      open / failure / message
//!        │ MessageReceived       │       │      pong / close
//!        └───────────────────────┘       └─ Keepalive (5s after open, 9s after pong)
//! ```
//!
//! Key design principles:
//!
//! - One tokio task owns the session and applies commands in submission order
//! - One atomic tri-state flag is the only record of the connection state
//! - Keepalive tasks re-enter the worker queue and re-check state at fire time
//! - No error crosses the bus; failures are logged and absorbed
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use socket_keepalive::{BusEvent, ClientOptions, EventBridge, EventBus, LocalBus, Result, WsTransport};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let options = ClientOptions::builder()
//!         .endpoint("ws://127.0.0.1:5000")
//!         .build()?;
//!
//!     let bus = LocalBus::new();
//!     let (_, mut inbox) = bus.subscribe_channel();
//!     let bridge = EventBridge::start(Arc::new(WsTransport::new()), bus.clone(), options);
//!
//!     bus.publish(BusEvent::send("hello"));
//!     while let Some(event) = inbox.recv().await {
//!         if let BusEvent::MessageReceived { payload } = event {
//!             println!("{payload}");
//!             break;
//!         }
//!     }
//!
//!     bridge.teardown();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`bridge`] | Bus ↔ client translation and host hooks |
//! | [`bus`] | Publish/subscribe capability and in-process bus |
//! | [`client`] | Worker loop, connection state, keepalive, options |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Commands and bus events |
//! | [`transport`] | Transport adapter traits and WebSocket implementation |

// ============================================================================
// Modules
// ============================================================================

/// Event Bridge between the bus and the client.
pub mod bridge;

/// Publish/subscribe boundary.
pub mod bus;

/// Connection lifecycle: worker loop, state and keepalive.
pub mod client;

/// Error types and result aliases.
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Commands and bus events.
pub mod protocol;

/// Transport adapter capability.
///
/// Defines the traits the worker drives and a `tokio-tungstenite`
/// implementation.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Bridge and bus
pub use bridge::EventBridge;
pub use bus::{EventBus, Handler, LocalBus};

// Client types
pub use client::{Client, ClientOptions, ClientOptionsBuilder, ConnectionState};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ConnectionEpoch, SubscriptionId};

// Protocol types
pub use protocol::{BusEvent, Command, KeepaliveProbe};

// Transport types
pub use transport::{EventSink, Payload, Session, Transport, WsTransport};
