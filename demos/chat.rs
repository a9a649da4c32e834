//! Interactive chat over a keepalive WebSocket connection.
//!
//! Lines typed on stdin are published as send requests; received text
//! is printed. `/connect`, `/disconnect` and `/quit` drive the bridge.
//!
//! Usage:
//!
//! ```text
//! cargo run --example chat -- ws://127.0.0.1:5000 [--debug]
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use socket_keepalive::{
    BusEvent, ClientOptions, EventBridge, EventBus, LocalBus, Result, WsTransport,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Functions
// ============================================================================

/// Initialize tracing/logging.
fn init_logging(debug: bool) {
    let filter = if debug {
        "socket_keepalive=debug"
    } else {
        "socket_keepalive=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    init_logging(args.iter().any(|a| a == "--debug"));

    let mut builder = ClientOptions::builder();
    if let Some(endpoint) = args.iter().find(|a| !a.starts_with("--")) {
        builder = builder.endpoint(endpoint.clone());
    }
    let options = builder.build()?;

    println!("Connecting to {}", options.endpoint);

    let bus = LocalBus::new();
    let (_, mut inbox) = bus.subscribe_channel();
    let bridge = EventBridge::start(Arc::new(WsTransport::new()), bus.clone(), options);

    tokio::spawn(async move {
        while let Some(event) = inbox.recv().await {
            if let BusEvent::MessageReceived { payload } = event {
                println!("< {payload}");
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" => {}
            "/quit" => break,
            "/connect" => bus.publish(BusEvent::ConnectRequest),
            "/disconnect" => bus.publish(BusEvent::DisconnectRequest),
            "/state" => println!("[{}]", bridge.client().state()),
            text => bus.publish(BusEvent::send(text)),
        }
    }

    bridge.teardown();
    println!("Bye");

    Ok(())
}
