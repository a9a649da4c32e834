//! Client handle.
//!
//! [`Client`] is the caller-facing side of the worker loop: it submits
//! commands without blocking and reads the shared connection state.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use crate::bus::EventBus;
use crate::error::{Error, Result};
use crate::protocol::Command;
use crate::transport::Transport;

use super::options::ClientOptions;
use super::state::{AtomicConnectionState, ConnectionState};
use super::worker::Worker;

// ============================================================================
// Client
// ============================================================================

/// Handle to a running worker loop.
///
/// # Thread Safety
///
/// `Client` is `Send + Sync` and cheap to clone. All clones feed the
/// same queue, so commands from different clones are still applied in
/// the order they were submitted.
#[derive(Clone)]
pub struct Client {
    /// Command queue into the worker.
    commands: mpsc::UnboundedSender<Command>,
    /// Connection state shared with the worker.
    state: Arc<AtomicConnectionState>,
    /// Options the worker was started with.
    options: Arc<ClientOptions>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.options.endpoint.as_str())
            .field("state", &self.state.load())
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Spawns the worker task and returns a handle to it.
    ///
    /// Must be called from within a tokio runtime. Text messages
    /// received from the remote end are published on `bus` as
    /// [`BusEvent::MessageReceived`](crate::BusEvent::MessageReceived).
    pub fn spawn(
        transport: Arc<dyn Transport>,
        bus: Arc<dyn EventBus>,
        options: ClientOptions,
    ) -> Self {
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let state = Arc::new(AtomicConnectionState::new());
        let options = Arc::new(options);

        let (worker, events_rx) = Worker::new(
            transport,
            bus,
            Arc::clone(&options),
            Arc::clone(&state),
            &commands,
        );

        tokio::spawn(worker.run(commands_rx, events_rx));

        debug!(endpoint = %options.endpoint, "Client spawned");

        Self {
            commands,
            state,
            options,
        }
    }

    /// Enqueues a command. Never blocks.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerStopped`] if the worker has shut down.
    pub fn submit(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| Error::WorkerStopped)
    }

    /// Enqueues [`Command::Connect`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerStopped`] if the worker has shut down.
    #[inline]
    pub fn connect(&self) -> Result<()> {
        self.submit(Command::Connect)
    }

    /// Enqueues [`Command::Send`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerStopped`] if the worker has shut down.
    #[inline]
    pub fn send(&self, text: impl Into<String>) -> Result<()> {
        self.submit(Command::send(text))
    }

    /// Enqueues [`Command::Close`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerStopped`] if the worker has shut down.
    #[inline]
    pub fn close(&self) -> Result<()> {
        self.submit(Command::Close)
    }

    /// Enqueues [`Command::Close`] followed by [`Command::Shutdown`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerStopped`] if the worker has already shut down.
    pub fn shutdown(&self) -> Result<()> {
        self.submit(Command::Close)?;
        self.submit(Command::Shutdown)
    }

    /// Returns the current connection state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state.load()
    }

    /// Returns `true` if the connection is established.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Returns `true` once the worker has terminated.
    #[inline]
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.commands.is_closed()
    }

    /// Returns the options the worker runs with.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use proptest::prelude::*;
    use tokio::time::sleep;
    use tokio_test::{assert_err, assert_ok};

    use crate::bus::LocalBus;
    use crate::identifiers::ConnectionEpoch;
    use crate::protocol::{BusEvent, KeepaliveProbe};
    use crate::transport::mock::{Call, MockTransport};
    use crate::transport::{Payload, SWITCHING_PROTOCOLS};

    /// Lets the worker drain both queues. Time is paused in these tests,
    /// so this only returns once every task is idle.
    async fn settle() {
        sleep(Duration::from_millis(1)).await;
    }

    fn options() -> ClientOptions {
        ClientOptions::builder()
            .endpoint("ws://127.0.0.1:5000")
            .build()
            .expect("valid options")
    }

    fn spawn() -> (Client, Arc<MockTransport>, Arc<LocalBus>) {
        let transport = MockTransport::new();
        let bus = LocalBus::new();
        let client = Client::spawn(transport.clone(), bus.clone(), options());
        (client, transport, bus)
    }

    async fn connected() -> (Client, Arc<MockTransport>, Arc<LocalBus>) {
        let (client, transport, bus) = spawn();
        assert_ok!(client.connect());
        settle().await;
        transport
            .last_sink()
            .on_open(transport.session(), SWITCHING_PROTOCOLS);
        settle().await;
        assert_eq!(client.state(), ConnectionState::Connected);
        (client, transport, bus)
    }

    // ------------------------------------------------------------------------
    // Connection state
    // ------------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_connect_moves_to_connecting() {
        let (client, transport, _) = spawn();

        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert_ok!(client.connect());
        settle().await;

        assert_eq!(client.state(), ConnectionState::Connecting);
        assert_eq!(
            transport.calls(),
            vec![Call::Open("ws://127.0.0.1:5000/".into())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_while_connecting_is_noop() {
        let (client, transport, _) = spawn();

        assert_ok!(client.connect());
        assert_ok!(client.connect());
        settle().await;

        assert_eq!(transport.open_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_while_connected_keeps_session() {
        let (client, transport, _) = connected().await;

        assert_ok!(client.connect());
        assert_ok!(client.send("still here"));
        settle().await;

        assert_eq!(transport.open_count(), 1);
        assert_eq!(transport.writes(), vec![Call::Text("still here".into())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_start_failure_reverts() {
        let (client, transport, _) = spawn();
        transport.fail_open(true);

        assert_ok!(client.connect());
        settle().await;

        assert_eq!(client.state(), ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_open_applies_once() {
        let (client, transport, _) = connected().await;

        transport
            .last_sink()
            .on_open(transport.session(), SWITCHING_PROTOCOLS);
        settle().await;

        assert_eq!(client.state(), ConnectionState::Connected);

        // Only one keepalive chain: one ping + greeting at T+5
        sleep(Duration::from_secs(6)).await;
        assert_eq!(
            transport.writes(),
            vec![Call::Ping, Call::Text("Hello there!".into())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_switching_status_reverts() {
        let (client, transport, _) = spawn();
        assert_ok!(client.connect());
        settle().await;

        transport.last_sink().on_open(transport.session(), 200);
        settle().await;

        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert_ok!(client.send("dropped"));
        settle().await;
        assert!(transport.writes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_before_open() {
        let (client, transport, _) = spawn();
        assert_ok!(client.connect());
        settle().await;

        transport.last_sink().on_failure(Error::connection("refused"));
        settle().await;

        assert_eq!(client.state(), ConnectionState::Disconnected);

        // A new connect is allowed after failure
        assert_ok!(client.connect());
        settle().await;
        assert_eq!(transport.open_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_close_disconnects() {
        let (client, transport, _) = connected().await;

        transport.last_sink().on_close(1001, "going away");
        settle().await;

        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert_ok!(client.send("late"));
        settle().await;
        assert!(transport.writes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_callbacks_are_ignored() {
        let (client, transport, _) = connected().await;
        let old_sink = transport.last_sink();

        assert_ok!(client.close());
        assert_ok!(client.connect());
        settle().await;
        transport
            .last_sink()
            .on_open(transport.session(), SWITCHING_PROTOCOLS);
        settle().await;

        // Late close from the first connection must not tear down the second
        old_sink.on_close(1000, "Goodbye, World!");
        settle().await;

        assert_eq!(client.state(), ConnectionState::Connected);
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_send_while_disconnected_is_noop() {
        let (client, transport, _) = spawn();

        assert_ok!(client.send("nobody home"));
        settle().await;

        assert!(transport.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_sends_configured_frame() {
        let (client, transport, _) = connected().await;

        assert_ok!(client.close());
        settle().await;

        assert_eq!(
            transport.writes(),
            vec![Call::Close(1000, "Goodbye, World!".into())]
        );
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_while_disconnected_is_noop() {
        let (client, transport, _) = spawn();

        assert_ok!(client.close());
        settle().await;

        assert!(transport.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_close_keeps_state() {
        let (client, transport, _) = connected().await;
        transport.fail_writes(true);

        assert_ok!(client.close());
        settle().await;

        assert_eq!(client.state(), ConnectionState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_failure_does_not_stop_loop() {
        let (client, transport, _) = connected().await;

        transport.fail_writes(true);
        assert_ok!(client.send("lost"));
        settle().await;

        transport.fail_writes(false);
        assert_ok!(client.send("delivered"));
        settle().await;

        assert_eq!(client.state(), ConnectionState::Connected);
        assert_eq!(transport.writes(), vec![Call::Text("delivered".into())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_closes_then_stops() {
        let (client, transport, _) = connected().await;

        assert_ok!(client.shutdown());
        settle().await;

        assert_eq!(
            transport.writes(),
            vec![Call::Close(1000, "Goodbye, World!".into())]
        );
        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert!(client.is_stopped());
        assert_err!(client.send("after shutdown"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_all_handles_stops_worker() {
        let (client, transport, _) = connected().await;
        let state = Arc::clone(&client.state);

        drop(client);
        settle().await;

        assert_eq!(state.load(), ConnectionState::Disconnected);
        assert!(transport.writes().is_empty());
    }

    // ------------------------------------------------------------------------
    // Keepalive
    // ------------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_first_ping_with_greeting_after_five_seconds() {
        let (_client, transport, _) = connected().await;

        sleep(Duration::from_millis(4_990)).await;
        assert!(transport.writes().is_empty());

        sleep(Duration::from_millis(20)).await;
        assert_eq!(
            transport.writes(),
            vec![Call::Ping, Call::Text("Hello there!".into())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_ping_nine_seconds_after_pong() {
        let (_client, transport, _) = connected().await;

        sleep(Duration::from_millis(5_010)).await;
        transport.last_sink().on_pong();
        settle().await;

        sleep(Duration::from_millis(8_980)).await;
        assert_eq!(transport.writes().len(), 2);

        sleep(Duration::from_millis(50)).await;
        assert_eq!(
            transport.writes(),
            vec![Call::Ping, Call::Text("Hello there!".into()), Call::Ping]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_ping_after_disconnect() {
        let (client, transport, _) = connected().await;

        sleep(Duration::from_secs(3)).await;
        assert_ok!(client.close());
        settle().await;

        sleep(Duration::from_secs(10)).await;
        assert_eq!(
            transport.writes(),
            vec![Call::Close(1000, "Goodbye, World!".into())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_pong_after_failure_schedules_nothing() {
        let (client, transport, _) = connected().await;
        let sink = transport.last_sink();

        sink.on_failure(Error::ConnectionClosed);
        sink.on_pong();
        settle().await;

        sleep(Duration::from_secs(20)).await;
        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert!(transport.writes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_between_pong_and_ping_sends_nothing() {
        let (client, transport, _) = connected().await;
        let sink = transport.last_sink();

        sleep(Duration::from_millis(5_010)).await;
        sink.on_pong();
        settle().await;

        sleep(Duration::from_secs(3)).await;
        sink.on_close(1001, "going away");
        settle().await;
        assert_eq!(client.state(), ConnectionState::Disconnected);

        sleep(Duration::from_secs(10)).await;
        assert_eq!(
            transport.writes(),
            vec![Call::Ping, Call::Text("Hello there!".into())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_keepalive_checks_epoch_and_state_when_fired() {
        let (client, transport, _) = connected().await;
        let current = ConnectionEpoch::INITIAL.next();

        // Left over from an earlier connection
        assert_ok!(client.submit(Command::Keepalive {
            epoch: ConnectionEpoch::INITIAL,
            probe: KeepaliveProbe::Ping,
        }));
        settle().await;
        assert!(transport.writes().is_empty());

        assert_ok!(client.submit(Command::Keepalive {
            epoch: current,
            probe: KeepaliveProbe::Ping,
        }));
        settle().await;
        assert_eq!(transport.writes(), vec![Call::Ping]);

        transport.last_sink().on_close(1000, "bye");
        settle().await;
        assert_ok!(client.submit(Command::Keepalive {
            epoch: current,
            probe: KeepaliveProbe::PingWithGreeting,
        }));
        settle().await;
        assert_eq!(transport.writes(), vec![Call::Ping]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_pong_never_disconnects() {
        let (client, transport, _) = connected().await;

        sleep(Duration::from_secs(120)).await;

        assert_eq!(client.state(), ConnectionState::Connected);
        assert_eq!(
            transport.writes(),
            vec![Call::Ping, Call::Text("Hello there!".into())]
        );
    }

    // ------------------------------------------------------------------------
    // Inbound messages
    // ------------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_text_message_is_published() {
        let (_client, transport, bus) = connected().await;
        let (_, mut rx) = bus.subscribe_channel();

        transport
            .last_sink()
            .on_message(Payload::Text("pong".into()));
        settle().await;

        assert_eq!(rx.try_recv().unwrap(), BusEvent::received("pong"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_binary_message_is_ignored() {
        let (_client, transport, bus) = connected().await;
        let (_, mut rx) = bus.subscribe_channel();

        transport
            .last_sink()
            .on_message(Payload::Binary(vec![0xde, 0xad]));
        settle().await;

        assert!(rx.try_recv().is_err());
    }

    // ------------------------------------------------------------------------
    // Ordering
    // ------------------------------------------------------------------------

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_sends_applied_in_submission_order(
            messages in proptest::collection::vec("[a-z]{1,8}", 1..40)
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .start_paused(true)
                .build()
                .expect("runtime");

            let writes = runtime.block_on(async {
                let (client, transport, _) = connected().await;
                for message in &messages {
                    client.send(message.clone()).expect("worker alive");
                }
                settle().await;
                transport.writes()
            });

            let expected: Vec<Call> = messages.into_iter().map(Call::Text).collect();
            prop_assert_eq!(writes, expected);
        }
    }
}
