//! Publish/subscribe event types.
//!
//! The first three kinds flow inbound to the client, the last one
//! flows outbound.
//!
//! # Format
//!
//! ```json
//! { "type": "connectRequest" }
//! { "type": "disconnectRequest" }
//! { "type": "sendMessageRequest", "payload": "hi" }
//! { "type": "messageReceived", "payload": "pong" }
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

// ============================================================================
// BusEvent
// ============================================================================

/// An event exchanged over the publish/subscribe boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BusEvent {
    /// Request to open the connection.
    ConnectRequest,

    /// Request to close the connection.
    DisconnectRequest,

    /// Request to send a text message.
    SendMessageRequest {
        /// Text to send.
        payload: String,
    },

    /// A text message arrived from the remote end.
    MessageReceived {
        /// Received text.
        payload: String,
    },
}

impl BusEvent {
    /// Creates a send request.
    #[inline]
    pub fn send(payload: impl Into<String>) -> Self {
        Self::SendMessageRequest {
            payload: payload.into(),
        }
    }

    /// Creates a received message event.
    #[inline]
    pub fn received(payload: impl Into<String>) -> Self {
        Self::MessageReceived {
            payload: payload.into(),
        }
    }

    /// Returns `true` for events the client consumes.
    #[inline]
    #[must_use]
    pub const fn is_request(&self) -> bool {
        !matches!(self, Self::MessageReceived { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::{from_str, json, to_value};

    #[test]
    fn test_wire_format() {
        assert_eq!(
            to_value(BusEvent::send("hi")).unwrap(),
            json!({ "type": "sendMessageRequest", "payload": "hi" })
        );
        assert_eq!(
            to_value(BusEvent::ConnectRequest).unwrap(),
            json!({ "type": "connectRequest" })
        );
    }

    #[test]
    fn test_parse_disconnect_request() {
        let event: BusEvent = from_str(r#"{"type":"disconnectRequest"}"#).unwrap();
        assert_eq!(event, BusEvent::DisconnectRequest);
    }

    #[test]
    fn test_parse_unknown_type_fails() {
        assert!(from_str::<BusEvent>(r#"{"type":"reboot"}"#).is_err());
    }

    #[test]
    fn test_is_request() {
        assert!(BusEvent::ConnectRequest.is_request());
        assert!(BusEvent::DisconnectRequest.is_request());
        assert!(BusEvent::send("x").is_request());
        assert!(!BusEvent::received("x").is_request());
    }
}
