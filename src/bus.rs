//! Publish/subscribe boundary.
//!
//! The client only needs two capabilities from the surrounding
//! application: publishing a [`BusEvent`] and subscribing a handler.
//! [`EventBus`] names those capabilities; [`LocalBus`] is an in-process
//! implementation.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use socket_keepalive::{BusEvent, EventBus, LocalBus};
//!
//! let bus = LocalBus::new();
//! let id = bus.subscribe(Arc::new(|event: &BusEvent| println!("{event:?}")));
//! bus.publish(BusEvent::ConnectRequest);
//! bus.unsubscribe(id);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tokio::sync::mpsc;
use tracing::trace;

use crate::identifiers::SubscriptionId;
use crate::protocol::BusEvent;

// ============================================================================
// Types
// ============================================================================

/// Subscriber callback.
///
/// Invoked synchronously on the publisher's thread; must not block.
pub type Handler = Arc<dyn Fn(&BusEvent) + Send + Sync>;

// ============================================================================
// EventBus
// ============================================================================

/// Publish/subscribe capability used by the bridge.
pub trait EventBus: Send + Sync {
    /// Delivers an event to every current subscriber.
    fn publish(&self, event: BusEvent);

    /// Registers a handler and returns its subscription ID.
    fn subscribe(&self, handler: Handler) -> SubscriptionId;

    /// Removes a handler. Returns `false` if the ID was unknown.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

// ============================================================================
// LocalBus
// ============================================================================

/// In-process [`EventBus`].
///
/// Handlers are snapshotted before delivery, so a handler may publish,
/// subscribe or unsubscribe without deadlocking.
#[derive(Default)]
pub struct LocalBus {
    handlers: RwLock<FxHashMap<SubscriptionId, Handler>>,
}

impl fmt::Debug for LocalBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl LocalBus {
    /// Creates an empty bus.
    #[inline]
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Returns the number of registered handlers.
    #[inline]
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.handlers.read().len()
    }

    /// Subscribes a channel that receives a copy of every event.
    ///
    /// The subscription stays registered until unsubscribed, even if
    /// the receiver is dropped.
    pub fn subscribe_channel(&self) -> (SubscriptionId, mpsc::UnboundedReceiver<BusEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.subscribe(Arc::new(move |event: &BusEvent| {
            let _ = tx.send(event.clone());
        }));
        (id, rx)
    }
}

impl EventBus for LocalBus {
    fn publish(&self, event: BusEvent) {
        let handlers: Vec<Handler> = self.handlers.read().values().cloned().collect();

        trace!(?event, subscribers = handlers.len(), "Publishing event");

        for handler in handlers {
            handler(&event);
        }
    }

    fn subscribe(&self, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId::generate();
        self.handlers.write().insert(id, handler);
        trace!(%id, "Subscribed");
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.handlers.write().remove(&id).is_some();
        trace!(%id, removed, "Unsubscribed");
        removed
    }
}

// ============================================================================
// Tests
// ============================================================================
