//! Mock buzzer.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::lock;
use crate::{Result, traits::BuzzerOutput};

/// Events kept by the mock; older ones are dropped.
const EVENT_CAPACITY: usize = 512;

/// A change of buzzer output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BuzzerEvent {
    Start(f32),
    Stop,
}

#[derive(Debug, Default)]
struct BuzzerState {
    sounding: Option<f32>,
    events: VecDeque<BuzzerEvent>,
}

impl BuzzerState {
    fn push(&mut self, event: BuzzerEvent) {
        if self.events.len() == EVENT_CAPACITY {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Mock buzzer that records output changes.
///
/// Repeated `stop` calls on a silent buzzer are not recorded, so the event
/// list reads as the audible on/off pattern.
#[derive(Debug)]
pub struct MockBuzzer {
    state: Arc<Mutex<BuzzerState>>,
}

impl MockBuzzer {
    pub fn new() -> (Self, MockBuzzerHandle) {
        let state = Arc::new(Mutex::new(BuzzerState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockBuzzerHandle { state },
        )
    }
}

impl BuzzerOutput for MockBuzzer {
    fn start(&mut self, freq_hz: f32) -> Result<()> {
        let mut state = lock(&self.state);
        if state.sounding != Some(freq_hz) {
            state.sounding = Some(freq_hz);
            state.push(BuzzerEvent::Start(freq_hz));
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        if state.sounding.take().is_some() {
            state.push(BuzzerEvent::Stop);
        }
        Ok(())
    }

    fn is_sounding(&self) -> bool {
        lock(&self.state).sounding.is_some()
    }
}

/// Handle for inspecting a mock buzzer.
#[derive(Debug, Clone)]
pub struct MockBuzzerHandle {
    state: Arc<Mutex<BuzzerState>>,
}

impl MockBuzzerHandle {
    /// Frequency currently sounding, if any.
    pub fn sounding(&self) -> Option<f32> {
        lock(&self.state).sounding
    }

    /// Recorded output changes, oldest first.
    pub fn events(&self) -> Vec<BuzzerEvent> {
        lock(&self.state).events.iter().copied().collect()
    }
}
