//! Worker loop.
//!
//! A single tokio task owns the session and performs every
//! transport-mutating operation. It selects over two queues:
//!
//! - Transport callbacks (open, failure, message, pong, close)
//! - Commands (connect, send, close, shutdown, keepalive)
//!
//! Commands are applied one at a time in submission order. Failures
//! raised while applying a command are logged and the loop moves on.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

use crate::bus::EventBus;
use crate::error::Result;
use crate::identifiers::ConnectionEpoch;
use crate::protocol::{BusEvent, Command, KeepaliveProbe};
use crate::transport::{
    BoxSession, EventSink, Payload, SWITCHING_PROTOCOLS, Transport, TransportEvent,
    TransportEventKind,
};

use super::keepalive::KeepaliveScheduler;
use super::options::ClientOptions;
use super::state::{AtomicConnectionState, ConnectionState};

// ============================================================================
// Worker
// ============================================================================

/// State owned by the worker task.
pub(crate) struct Worker {
    transport: Arc<dyn Transport>,
    bus: Arc<dyn EventBus>,
    options: Arc<ClientOptions>,
    state: Arc<AtomicConnectionState>,
    /// Live session, present only while connected.
    session: Option<BoxSession>,
    /// Current connection attempt.
    epoch: ConnectionEpoch,
    keepalive: KeepaliveScheduler,
    /// Cloned into each attempt's [`EventSink`].
    events_tx: mpsc::UnboundedSender<TransportEvent>,
}

impl Worker {
    /// Creates the worker and the receiving end of its callback queue.
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        bus: Arc<dyn EventBus>,
        options: Arc<ClientOptions>,
        state: Arc<AtomicConnectionState>,
        commands_tx: &mpsc::UnboundedSender<Command>,
    ) -> (Self, mpsc::UnboundedReceiver<TransportEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let worker = Self {
            transport,
            bus,
            options,
            state,
            session: None,
            epoch: ConnectionEpoch::INITIAL,
            keepalive: KeepaliveScheduler::new(commands_tx),
            events_tx,
        };

        (worker, events_rx)
    }

    /// Runs until `Shutdown` or until every command sender is dropped.
    pub(crate) async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut events: mpsc::UnboundedReceiver<TransportEvent>,
    ) {
        debug!("Worker loop started");

        loop {
            tokio::select! {
                biased;

                // Transport callbacks first so guards see fresh state
                Some(event) = events.recv() => {
                    self.handle_event(event).await;
                }

                command = commands.recv() => {
                    match command {
                        Some(Command::Shutdown) => {
                            debug!("Shutdown command received");
                            break;
                        }

                        Some(command) => self.handle_command(command).await,

                        None => {
                            debug!("Command channel closed");
                            break;
                        }
                    }
                }
            }
        }

        self.teardown();

        debug!("Worker loop terminated");
    }

    /// Drops the session and stops keepalive.
    fn teardown(&mut self) {
        self.keepalive.cancel();
        if self.session.take().is_some() {
            debug!(epoch = %self.epoch, "Session dropped on shutdown");
        }
        self.state.reset();
    }
}

// ============================================================================
// Worker - Commands
// ============================================================================

impl Worker {
    async fn handle_command(&mut self, command: Command) {
        trace!(command = command.name(), "Applying command");

        match command {
            Command::Connect => self.connect().await,
            Command::Send(text) => self.send(&text).await,
            Command::Close => self.close().await,
            Command::Keepalive { epoch, probe } => self.keepalive(epoch, probe).await,
            // Handled by the loop
            Command::Shutdown => {}
        }
    }

    async fn connect(&mut self) {
        if !self
            .state
            .transition(ConnectionState::Disconnected, ConnectionState::Connecting)
        {
            debug!(state = %self.state.load(), "WebSocket is already connected");
            return;
        }

        self.epoch = self.epoch.next();
        let sink = EventSink::new(self.epoch, self.events_tx.clone());

        info!(endpoint = %self.options.endpoint, epoch = %self.epoch, "Connecting");

        if let Err(e) = self.transport.open(&self.options.endpoint, sink).await {
            error!(error = %e, "Couldn't start WebSocket connection");
            self.state
                .transition(ConnectionState::Connecting, ConnectionState::Disconnected);
        }
    }

    async fn send(&mut self, text: &str) {
        if !self.state.is_connected() {
            trace!("Not connected, dropping message");
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };

        if let Err(e) = session.send_text(text).await {
            warn!(error = %e, "Error sending message");
        }
    }

    async fn close(&mut self) {
        if !self.state.is_connected() {
            debug!("WebSocket is already disconnected");
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let result = session
            .close(self.options.close_code, &self.options.close_reason)
            .await;

        match result {
            Ok(()) => {
                self.disconnect();
                info!(code = self.options.close_code, "WebSocket closed");
            }
            Err(e) => warn!(error = %e, "Failed to close WebSocket"),
        }
    }

    async fn keepalive(&mut self, epoch: ConnectionEpoch, probe: KeepaliveProbe) {
        if epoch != self.epoch || !self.state.is_connected() {
            trace!(%epoch, current = %self.epoch, "Keepalive skipped");
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };

        if let Err(e) = Self::send_probe(session, probe, &self.options.greeting).await {
            warn!(error = %e, ?probe, "Keepalive failed");
        }
    }

    async fn send_probe(
        session: &mut BoxSession,
        probe: KeepaliveProbe,
        greeting: &str,
    ) -> Result<()> {
        session.send_ping().await?;
        if probe.sends_greeting() {
            session.send_text(greeting).await?;
        }
        Ok(())
    }

    /// Clears the session and returns to `Disconnected`.
    fn disconnect(&mut self) {
        self.keepalive.cancel();
        self.session = None;
        self.state.reset();
    }
}

// ============================================================================
// Worker - Transport Callbacks
// ============================================================================

impl Worker {
    async fn handle_event(&mut self, event: TransportEvent) {
        if event.epoch != self.epoch {
            trace!(
                epoch = %event.epoch,
                current = %self.epoch,
                callback = event.kind.name(),
                "Ignoring callback from superseded connection"
            );
            return;
        }

        match event.kind {
            TransportEventKind::Opened { session, status } => self.on_open(session, status),
            TransportEventKind::Failed(e) => {
                let previous = self.state.load();
                self.disconnect();
                warn!(error = %e, %previous, "WebSocket failure");
            }
            TransportEventKind::Message(payload) => self.on_message(payload),
            TransportEventKind::Pong => self.on_pong(),
            TransportEventKind::Closed { code, reason } => {
                self.disconnect();
                info!(code, %reason, "WebSocket is closed");
            }
        }
    }

    fn on_open(&mut self, session: BoxSession, status: u16) {
        debug!(status, epoch = %self.epoch, "onOpen");

        if status != SWITCHING_PROTOCOLS {
            warn!(status, "Unexpected handshake status, dropping session");
            self.state
                .transition(ConnectionState::Connecting, ConnectionState::Disconnected);
            return;
        }

        if !self
            .state
            .transition(ConnectionState::Connecting, ConnectionState::Connected)
        {
            debug!(state = %self.state.load(), "Duplicate open ignored");
            return;
        }

        self.session = Some(session);
        info!(endpoint = %self.options.endpoint, "WebSocket connected");

        self.keepalive.schedule(
            self.epoch,
            KeepaliveProbe::PingWithGreeting,
            self.options.open_ping_delay,
        );
    }

    fn on_message(&self, payload: Payload) {
        match payload {
            Payload::Text(text) => {
                self.bus.publish(BusEvent::received(text));
            }
            Payload::Binary(data) => {
                trace!(len = data.len(), "Ignoring binary message");
            }
        }
    }

    fn on_pong(&mut self) {
        trace!("onPong");
        if self.state.is_connected() {
            self.keepalive.schedule(
                self.epoch,
                KeepaliveProbe::Ping,
                self.options.pong_ping_delay,
            );
        }
    }
}
