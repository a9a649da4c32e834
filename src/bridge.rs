//! Event Bridge between the publish/subscribe bus and the client.
//!
//! # Routing
//!
//! | Inbound event | Guard | Command |
//! |---------------|-------|---------|
//! | `ConnectRequest` | not connected | `Connect` |
//! | `DisconnectRequest` | connected | `Close` |
//! | `SendMessageRequest` | connected | `Send(payload)` |
//!
//! Requests failing their guard are dropped and logged at debug level.
//! Outbound `MessageReceived` events are published by the worker.
//!
//! # Lifecycle
//!
//! ```ignore
//! let bridge = EventBridge::start(Arc::new(WsTransport::new()), bus.clone(), options);
//! bus.publish(BusEvent::send("hi"));
//! bridge.teardown();
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use crate::bus::EventBus;
use crate::client::{Client, ClientOptions};
use crate::identifiers::SubscriptionId;
use crate::protocol::{BusEvent, Command};
use crate::transport::Transport;

// ============================================================================
// EventBridge
// ============================================================================

/// Running bridge: a client plus its bus subscription.
pub struct EventBridge {
    client: Client,
    bus: Arc<dyn EventBus>,
    subscription: SubscriptionId,
}

impl fmt::Debug for EventBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBridge")
            .field("client", &self.client)
            .field("subscription", &self.subscription)
            .finish_non_exhaustive()
    }
}

impl EventBridge {
    /// Starts the client, subscribes to `bus` and, if configured,
    /// submits an initial `Connect`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        transport: Arc<dyn Transport>,
        bus: Arc<dyn EventBus>,
        options: ClientOptions,
    ) -> Self {
        let connect_on_start = options.connect_on_start;
        let client = Client::spawn(transport, Arc::clone(&bus), options);

        let routed = client.clone();
        let subscription = bus.subscribe(Arc::new(move |event: &BusEvent| {
            route(&routed, event);
        }));

        if connect_on_start && let Err(e) = client.connect() {
            warn!(error = %e, "Initial connect not submitted");
        }

        info!(%subscription, "Event bridge started");

        Self {
            client,
            bus,
            subscription,
        }
    }

    /// Returns the underlying client.
    #[inline]
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Returns the bus subscription ID.
    #[inline]
    #[must_use]
    pub fn subscription(&self) -> SubscriptionId {
        self.subscription
    }

    /// Submits `Close` then `Shutdown` and unsubscribes from the bus.
    pub fn teardown(self) {
        if let Err(e) = self.client.shutdown() {
            debug!(error = %e, "Worker already stopped");
        }
        self.bus.unsubscribe(self.subscription);
        info!(subscription = %self.subscription, "Event bridge torn down");
    }
}

// ============================================================================
// Routing
// ============================================================================

/// Translates one bus event into at most one command.
fn route(client: &Client, event: &BusEvent) {
    let command = match event {
        BusEvent::SendMessageRequest { payload } => {
            if !client.is_connected() {
                trace!("Not connected, dropping send request");
                return;
            }
            Command::Send(payload.clone())
        }

        BusEvent::ConnectRequest => {
            if client.is_connected() {
                debug!("WebSocket is already connected");
                return;
            }
            Command::Connect
        }

        BusEvent::DisconnectRequest => {
            if !client.is_connected() {
                debug!("WebSocket is already disconnected");
                return;
            }
            Command::Close
        }

        // Outbound; published by the worker
        BusEvent::MessageReceived { .. } => return,
    };

    if let Err(e) = client.submit(command) {
        debug!(error = %e, "Dropping request, worker stopped");
    }
}

// ============================================================================
// Tests
// ============================================================================
