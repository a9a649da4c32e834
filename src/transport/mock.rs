//! Recording transport for unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use url::Url;

use crate::error::{Error, Result};

use super::{BoxSession, EventSink, Session, Transport};

/// One observed transport operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Open(String),
    Text(String),
    Ping,
    Close(u16, String),
}

/// Transport that records every call and exposes the sinks it was given.
#[derive(Default)]
pub(crate) struct MockTransport {
    calls: Arc<Mutex<Vec<Call>>>,
    sinks: Mutex<Vec<EventSink>>,
    fail_writes: Arc<AtomicBool>,
    fail_open: AtomicBool,
}

impl MockTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub(crate) fn writes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::Open(_)))
            .collect()
    }

    pub(crate) fn open_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Open(_)))
            .count()
    }

    /// Sink handed to the most recent `open`.
    pub(crate) fn last_sink(&self) -> EventSink {
        self.sinks
            .lock()
            .last()
            .cloned()
            .expect("open was called")
    }

    /// Creates a session that records into this transport.
    pub(crate) fn session(&self) -> BoxSession {
        Box::new(MockSession {
            calls: Arc::clone(&self.calls),
            fail_writes: Arc::clone(&self.fail_writes),
        })
    }

    pub(crate) fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn open(&self, endpoint: &Url, events: EventSink) -> Result<()> {
        self.calls.lock().push(Call::Open(endpoint.to_string()));
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(Error::connection("mock open refused"));
        }
        self.sinks.lock().push(events);
        Ok(())
    }
}

struct MockSession {
    calls: Arc<Mutex<Vec<Call>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MockSession {
    fn record(&self, call: Call) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::connection("mock write failed"));
        }
        self.calls.lock().push(call);
        Ok(())
    }
}

#[async_trait]
impl Session for MockSession {
    async fn send_text(&mut self, text: &str) -> Result<()> {
        self.record(Call::Text(text.to_owned()))
    }

    async fn send_ping(&mut self) -> Result<()> {
        self.record(Call::Ping)
    }

    async fn close(&mut self, code: u16, reason: &str) -> Result<()> {
        self.record(Call::Close(code, reason.to_owned()))
    }
}
