//! Keepalive scheduling.
//!
//! After a successful open the worker schedules a ping plus greeting;
//! after every pong it schedules a bare ping. A scheduled task sleeps
//! for its delay and then submits a [`Command::Keepalive`] back into
//! the worker queue, so the frame is written on the worker and observes
//! the state at fire time.
//!
//! At most one task is pending. Scheduling replaces the pending task,
//! and the worker cancels it on every transition away from `Connected`.
//!
//! There is no pong timeout: a missing pong never fails the connection.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio::sync::mpsc::{UnboundedSender, WeakUnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, trace};

use crate::identifiers::ConnectionEpoch;
use crate::protocol::{Command, KeepaliveProbe};

// ============================================================================
// KeepaliveScheduler
// ============================================================================

/// Owner of the single pending keepalive task.
///
/// Holds a weak sender so a pending task never keeps the command queue
/// open on its own.
pub(crate) struct KeepaliveScheduler {
    commands: WeakUnboundedSender<Command>,
    pending: Option<JoinHandle<()>>,
}

impl KeepaliveScheduler {
    /// Creates a scheduler submitting into `commands`.
    pub(crate) fn new(commands: &UnboundedSender<Command>) -> Self {
        Self {
            commands: commands.downgrade(),
            pending: None,
        }
    }

    /// Schedules `probe` for `epoch` after `delay`, replacing any pending task.
    pub(crate) fn schedule(
        &mut self,
        epoch: ConnectionEpoch,
        probe: KeepaliveProbe,
        delay: Duration,
    ) {
        self.cancel();

        let commands = self.commands.clone();
        self.pending = Some(tokio::spawn(async move {
            sleep(delay).await;

            let Some(tx) = commands.upgrade() else {
                trace!(%epoch, "Keepalive fired after worker stopped");
                return;
            };

            match tx.send(Command::Keepalive { epoch, probe }) {
                Ok(()) => trace!(%epoch, ?probe, "Keepalive fired"),
                Err(_) => trace!(%epoch, "Keepalive dropped, worker stopped"),
            }
        }));

        debug!(%epoch, ?probe, ?delay, "Keepalive scheduled");
    }

    /// Aborts the pending task, if any.
    pub(crate) fn cancel(&mut self) {
        if let Some(task) = self.pending.take() {
            task.abort();
            trace!("Keepalive cancelled");
        }
    }

    /// Returns `true` if a task is scheduled and has not yet fired.
    #[cfg(test)]
    #[must_use]
    pub(crate) fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for KeepaliveScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ============================================================================
// Tests
// ============================================================================
