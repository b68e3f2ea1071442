//! Mock front-panel button.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::traits::ButtonInput;

/// Mock button with a rising-edge latch.
#[derive(Debug)]
pub struct MockButton {
    latch: Arc<AtomicBool>,
}

impl MockButton {
    pub fn new() -> (Self, MockButtonHandle) {
        let latch = Arc::new(AtomicBool::new(false));
        (
            Self {
                latch: Arc::clone(&latch),
            },
            MockButtonHandle { latch },
        )
    }
}

impl ButtonInput for MockButton {
    fn take_pressed(&mut self) -> bool {
        self.latch.swap(false, Ordering::AcqRel)
    }
}

/// Handle for pressing a mock button.
#[derive(Debug, Clone)]
pub struct MockButtonHandle {
    latch: Arc<AtomicBool>,
}

impl MockButtonHandle {
    /// Register a press. Several presses before the next check count once.
    pub fn press(&self) {
        self.latch.store(true, Ordering::Release);
    }
}
