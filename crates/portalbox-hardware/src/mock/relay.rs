//! Mock equipment power relay.

use std::sync::{Arc, Mutex};

use super::lock;
use crate::{Result, traits::PowerRelay};

#[derive(Debug, Default)]
struct RelayState {
    powered: bool,
    switches: Vec<bool>,
}

/// Mock relay that records every commanded state.
#[derive(Debug)]
pub struct MockRelay {
    state: Arc<Mutex<RelayState>>,
}

impl MockRelay {
    /// Create a relay that starts switched off.
    pub fn new() -> (Self, MockRelayHandle) {
        let state = Arc::new(Mutex::new(RelayState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockRelayHandle { state },
        )
    }
}

impl PowerRelay for MockRelay {
    fn set_power(&mut self, on: bool) -> Result<()> {
        let mut state = lock(&self.state);
        state.powered = on;
        state.switches.push(on);
        Ok(())
    }

    fn is_powered(&self) -> bool {
        lock(&self.state).powered
    }
}

/// Handle for inspecting a mock relay.
#[derive(Debug, Clone)]
pub struct MockRelayHandle {
    state: Arc<Mutex<RelayState>>,
}

impl MockRelayHandle {
    /// Whether the equipment is currently powered.
    pub fn is_powered(&self) -> bool {
        lock(&self.state).powered
    }

    /// Every state commanded so far, oldest first.
    pub fn switches(&self) -> Vec<bool> {
        lock(&self.state).switches.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_records_switches() {
        let (mut relay, handle) = MockRelay::new();
        assert!(!handle.is_powered());

        relay.set_power(true).unwrap();
        assert!(relay.is_powered());
        assert!(handle.is_powered());

        relay.set_power(false).unwrap();
        assert_eq!(handle.switches(), vec![true, false]);
    }
}
