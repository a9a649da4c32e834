//! Client configuration.
//!
//! Provides [`ClientOptions`] and its fluent [`ClientOptionsBuilder`].
//! Options can also be loaded from JSON.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use socket_keepalive::ClientOptions;
//!
//! let options = ClientOptions::builder()
//!     .endpoint("ws://127.0.0.1:5000")
//!     .greeting("Hi!")
//!     .pong_ping_delay(Duration::from_secs(20))
//!     .build()?;
//!
//! let from_file = ClientOptions::from_json(r#"{ "endpoint": "ws://10.0.0.2:1999" }"#)?;
//! ```
//!
//! # JSON Keys
//!
//! | Key | Type | Default |
//! |-----|------|---------|
//! | `endpoint` | string | `ws://192.168.56.1:5000` |
//! | `greeting` | string | `Hello there!` |
//! | `closeCode` | integer | `1000` |
//! | `closeReason` | string | `Goodbye, World!` |
//! | `openPingDelayMs` | integer | `5000` |
//! | `pongPingDelayMs` | integer | `9000` |
//! | `connectOnStart` | bool | `true` |

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default remote endpoint.
pub const DEFAULT_ENDPOINT: &str = "ws://192.168.56.1:5000";

/// Text sent together with the first keepalive ping.
pub const DEFAULT_GREETING: &str = "Hello there!";

/// Normal closure.
pub const DEFAULT_CLOSE_CODE: u16 = 1000;

/// Reason sent with an explicit close.
pub const DEFAULT_CLOSE_REASON: &str = "Goodbye, World!";

/// Delay between a successful open and the first ping.
pub const DEFAULT_OPEN_PING_DELAY: Duration = Duration::from_secs(5);

/// Delay between a pong and the next ping.
pub const DEFAULT_PONG_PING_DELAY: Duration = Duration::from_secs(9);

/// Returns `true` if `code` may appear in a close frame we send
/// (RFC 6455 section 7.4). 1004-1006 and 1015 are reserved, 1016-2999
/// belong to the protocol and its extensions.
const fn is_sendable_close_code(code: u16) -> bool {
    matches!(code, 1000..=1003 | 1007..=1014 | 3000..=4999)
}

// ============================================================================
// ClientOptions
// ============================================================================

/// Validated client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Remote endpoint (`ws` or `wss`).
    pub endpoint: Url,

    /// Text sent after the first ping following an open.
    pub greeting: String,

    /// Close code sent on an explicit close.
    pub close_code: u16,

    /// Close reason sent on an explicit close.
    pub close_reason: String,

    /// Delay from open to the first ping.
    pub open_ping_delay: Duration,

    /// Delay from each pong to the next ping.
    pub pong_ping_delay: Duration,

    /// Submit a `Connect` as soon as the bridge starts.
    pub connect_on_start: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        ClientOptionsBuilder::new()
            .build()
            .expect("default options are valid")
    }
}

impl ClientOptions {
    /// Creates a new builder.
    #[inline]
    #[must_use]
    pub fn builder() -> ClientOptionsBuilder {
        ClientOptionsBuilder::new()
    }

    /// Parses options from JSON. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the document is malformed
    /// - [`Error::Config`] if a value fails validation
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawOptions = serde_json::from_str(json)?;
        raw.into_builder().build()
    }
}

// ============================================================================
// ClientOptionsBuilder
// ============================================================================

/// Builder for [`ClientOptions`].
#[derive(Debug, Clone)]
pub struct ClientOptionsBuilder {
    endpoint: String,
    greeting: String,
    close_code: u16,
    close_reason: String,
    open_ping_delay: Duration,
    pong_ping_delay: Duration,
    connect_on_start: bool,
}

impl Default for ClientOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientOptionsBuilder {
    /// Creates a builder populated with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            greeting: DEFAULT_GREETING.to_owned(),
            close_code: DEFAULT_CLOSE_CODE,
            close_reason: DEFAULT_CLOSE_REASON.to_owned(),
            open_ping_delay: DEFAULT_OPEN_PING_DELAY,
            pong_ping_delay: DEFAULT_PONG_PING_DELAY,
            connect_on_start: true,
        }
    }

    /// Sets the remote endpoint URL.
    #[inline]
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the greeting sent with the first ping.
    #[inline]
    #[must_use]
    pub fn greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }

    /// Sets the close code and reason sent on an explicit close.
    #[inline]
    #[must_use]
    pub fn close_with(mut self, code: u16, reason: impl Into<String>) -> Self {
        self.close_code = code;
        self.close_reason = reason.into();
        self
    }

    /// Sets the delay from open to the first ping.
    #[inline]
    #[must_use]
    pub fn open_ping_delay(mut self, delay: Duration) -> Self {
        self.open_ping_delay = delay;
        self
    }

    /// Sets the delay from each pong to the next ping.
    #[inline]
    #[must_use]
    pub fn pong_ping_delay(mut self, delay: Duration) -> Self {
        self.pong_ping_delay = delay;
        self
    }

    /// Controls whether the bridge connects immediately on start.
    #[inline]
    #[must_use]
    pub fn connect_on_start(mut self, enabled: bool) -> Self {
        self.connect_on_start = enabled;
        self
    }

    /// Validates and builds the options.
    ///
    /// # Errors
    ///
    /// - [`Error::Url`] if the endpoint does not parse
    /// - [`Error::Config`] if the endpoint is not a `ws`/`wss` URL with a host
    /// - [`Error::Config`] if the close code is not sendable or the reason is too long
    /// - [`Error::Config`] if a keepalive delay is zero
    pub fn build(self) -> Result<ClientOptions> {
        let endpoint = self.validate_endpoint()?;
        self.validate_close()?;
        self.validate_delays()?;

        Ok(ClientOptions {
            endpoint,
            greeting: self.greeting,
            close_code: self.close_code,
            close_reason: self.close_reason,
            open_ping_delay: self.open_ping_delay,
            pong_ping_delay: self.pong_ping_delay,
            connect_on_start: self.connect_on_start,
        })
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ClientOptionsBuilder {
    fn validate_endpoint(&self) -> Result<Url> {
        let url = Url::parse(&self.endpoint)?;

        match url.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(Error::config(format!(
                    "Endpoint scheme must be ws or wss, got {other:?}"
                )));
            }
        }

        if url.host_str().is_none() {
            return Err(Error::config("Endpoint has no host"));
        }

        Ok(url)
    }

    fn validate_close(&self) -> Result<()> {
        if !is_sendable_close_code(self.close_code) {
            return Err(Error::config(format!(
                "Close code {} may not be sent by an endpoint",
                self.close_code
            )));
        }

        // Control frame payload limit is 125 bytes, 2 of which hold the code
        if self.close_reason.len() > 123 {
            return Err(Error::config("Close reason exceeds 123 bytes"));
        }

        Ok(())
    }

    fn validate_delays(&self) -> Result<()> {
        if self.open_ping_delay.is_zero() || self.pong_ping_delay.is_zero() {
            return Err(Error::config("Keepalive delays must be non-zero"));
        }
        Ok(())
    }
}

// ============================================================================
// RawOptions
// ============================================================================

/// JSON shape of [`ClientOptions`].
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawOptions {
    endpoint: Option<String>,
    greeting: Option<String>,
    close_code: Option<u16>,
    close_reason: Option<String>,
    open_ping_delay_ms: Option<u64>,
    pong_ping_delay_ms: Option<u64>,
    connect_on_start: Option<bool>,
}

impl RawOptions {
    fn into_builder(self) -> ClientOptionsBuilder {
        let mut builder = ClientOptionsBuilder::new();

        if let Some(endpoint) = self.endpoint {
            builder = builder.endpoint(endpoint);
        }
        if let Some(greeting) = self.greeting {
            builder = builder.greeting(greeting);
        }
        if let Some(code) = self.close_code {
            builder.close_code = code;
        }
        if let Some(reason) = self.close_reason {
            builder.close_reason = reason;
        }
        if let Some(ms) = self.open_ping_delay_ms {
            builder = builder.open_ping_delay(Duration::from_millis(ms));
        }
        if let Some(ms) = self.pong_ping_delay_ms {
            builder = builder.pong_ping_delay(Duration::from_millis(ms));
        }
        if let Some(enabled) = self.connect_on_start {
            builder = builder.connect_on_start(enabled);
        }

        builder
    }
}

// ============================================================================
// Tests
// ============================================================================
