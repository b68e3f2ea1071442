//! Helpers shared by the controller integration tests.

#![allow(dead_code)]

use std::time::{Duration, Instant};

use portalbox_controller::{AccessState, AccessStateMachine, ControllerConfig, InputSnapshot, Step};
use portalbox_core::{AuthorityLevel, CardId, CardType};

pub const OWNER: u32 = 0x0A0B_0C0D;
pub const PROXY: u32 = 0x0000_0002;
pub const TRAINEE: u32 = 0x0000_0003;

pub fn card(id: u32) -> CardId {
    CardId::new(id).unwrap()
}

pub fn user(id: u32, level: AuthorityLevel) -> InputSnapshot {
    InputSnapshot::card(card(id), CardType::User).authorized(level)
}

pub fn proxy(id: u32) -> InputSnapshot {
    InputSnapshot::card(card(id), CardType::Proxy)
}

pub fn trainee(id: u32, eligible: bool) -> InputSnapshot {
    let input = InputSnapshot::card(card(id), CardType::Training);
    if eligible {
        input.authorized(AuthorityLevel::None)
    } else {
        input
    }
}

/// A machine and a fake clock advanced in control ticks.
pub struct Harness {
    pub machine: AccessStateMachine,
    pub now: Instant,
}

impl Harness {
    /// Machine already past setup, idle with no card.
    pub fn idle(config: ControllerConfig) -> Self {
        let now = Instant::now();
        let mut machine = AccessStateMachine::new(config);
        machine.complete_setup(now);
        assert_eq!(machine.state(), AccessState::IdleNoCard);
        Self { machine, now }
    }

    pub fn tick(&mut self, input: InputSnapshot) -> Step {
        self.now += Duration::from_millis(100);
        self.machine.tick(&input, self.now)
    }

    /// Feed the same input for `duration`, collecting every step.
    pub fn hold(&mut self, input: InputSnapshot, duration: Duration) -> Vec<Step> {
        let ticks = duration.as_millis() / 100;
        (0..ticks).map(|_| self.tick(input)).collect()
    }

    pub fn state(&self) -> AccessState {
        self.machine.state()
    }
}
