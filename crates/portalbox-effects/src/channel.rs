//! Command channel between the controller and an effect worker.
//!
//! Sending never blocks: the controller ticks on a fixed period and must not
//! stall on a slow peripheral. The worker applies commands in order, one per
//! tick, and acknowledges each one so the sender can [`drain`] the channel
//! before shutting the worker down.
//!
//! [`drain`]: PeripheralChannel::drain

use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::{Notify, mpsc};
use tracing::trace;

use crate::error::{ChannelError, CommandError};

#[derive(Debug, Default)]
struct Shared {
    pending: AtomicUsize,
    closed: AtomicBool,
    changed: Notify,
}

/// Sending side, cheap to clone.
#[derive(Debug)]
pub struct PeripheralChannel<C> {
    name: &'static str,
    tx: mpsc::UnboundedSender<C>,
    shared: Arc<Shared>,
}

impl<C> Clone for PeripheralChannel<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            tx: self.tx.clone(),
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Receiving side, owned by the worker.
#[derive(Debug)]
pub struct CommandInbox<C> {
    rx: mpsc::UnboundedReceiver<C>,
    shared: Arc<Shared>,
}

impl<C> PeripheralChannel<C> {
    /// Create a channel for the peripheral called `name` (used in logs and
    /// errors).
    pub fn new(name: &'static str) -> (Self, CommandInbox<C>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared::default());
        (
            Self {
                name,
                tx,
                shared: Arc::clone(&shared),
            },
            CommandInbox { rx, shared },
        )
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Commands sent but not yet applied.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.shared.pending.load(Ordering::Acquire)
    }

    /// Whether the worker has gone away.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire) || self.tx.is_closed()
    }

    /// Queue a command. Never blocks.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Closed`] if the worker is no longer running.
    pub fn send(&self, command: C) -> Result<(), ChannelError> {
        self.shared.pending.fetch_add(1, Ordering::AcqRel);
        if self.tx.send(command).is_err() {
            self.shared.pending.fetch_sub(1, Ordering::AcqRel);
            return Err(ChannelError::Closed {
                peripheral: self.name,
            });
        }
        Ok(())
    }

    /// Wait until every queued command has been applied, or the worker has
    /// stopped.
    pub async fn drain(&self) {
        loop {
            let changed = self.shared.changed.notified();
            if self.pending() == 0 || self.is_closed() {
                return;
            }
            changed.await;
        }
    }
}

impl<C: FromStr<Err = CommandError>> PeripheralChannel<C> {
    /// Parse a text command line and queue it.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Rejected`] for a malformed line (nothing is
    /// queued) or [`ChannelError::Closed`] if the worker is gone.
    pub fn send_line(&self, line: &str) -> Result<(), ChannelError> {
        let command = line.parse::<C>()?;
        self.send(command)
    }
}

impl<C> CommandInbox<C> {
    /// Next queued command, if any. Never waits.
    pub fn try_next(&mut self) -> Option<C> {
        self.rx.try_recv().ok()
    }

    /// Acknowledge one command taken with [`try_next`](Self::try_next).
    pub fn applied(&self) {
        let previous = self.shared.pending.fetch_sub(1, Ordering::AcqRel);
        trace!("Command applied, {} still pending", previous.saturating_sub(1));
        self.shared.changed.notify_waiters();
    }
}

impl<C> Drop for CommandInbox<C> {
    fn drop(&mut self) {
        self.shared.closed.store(true, Ordering::Release);
        self.shared.changed.notify_waiters();
    }
}
