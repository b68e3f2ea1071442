//! Mock device implementations for testing and development.
//!
//! Each mock is created together with a handle. The device half is handed to
//! the controller; the handle stays with the test (or the emulator console)
//! to present cards, press the button, or inspect what was driven.

pub mod button;
pub mod buzzer;
pub mod reader;
pub mod relay;
pub mod strip;

use std::sync::{Mutex, MutexGuard, PoisonError};

// Re-export commonly used types
pub use button::{MockButton, MockButtonHandle};
pub use buzzer::{BuzzerEvent, MockBuzzer, MockBuzzerHandle};
pub use reader::{MockCardReader, MockCardReaderHandle};
pub use relay::{MockRelay, MockRelayHandle};
pub use strip::{MockStrip, MockStripHandle};

/// Lock shared mock state, ignoring poisoning from a panicked test thread.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
