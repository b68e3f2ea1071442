//! Recording notifier for tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{BackendError, Result};
use crate::notify::{Email, Notifier};

#[derive(Debug, Default)]
struct Outbox {
    sent: Mutex<Vec<Email>>,
    failing: AtomicBool,
}

/// Notifier that keeps every email instead of sending it.
///
/// Clones share the same outbox.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    outbox: Arc<Outbox>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following delivery fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.outbox.failing.store(failing, Ordering::Release);
    }

    /// Emails delivered so far.
    pub fn sent(&self) -> Vec<Email> {
        self.outbox
            .sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    async fn send(&self, email: &Email) -> Result<()> {
        if self.outbox.failing.load(Ordering::Acquire) {
            return Err(BackendError::delivery("recording notifier set to fail"));
        }
        self.outbox
            .sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(email.clone());
        Ok(())
    }
}
