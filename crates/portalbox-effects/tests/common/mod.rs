//! Shared fixtures for effect worker tests.

#![allow(dead_code)]

use std::time::Duration;

use portalbox_effects::{EffectWorkers, WorkerConfig};
use portalbox_hardware::mock::{MockBuzzer, MockBuzzerHandle, MockStrip, MockStripHandle};
use tokio_util::sync::CancellationToken;

/// Standard box strip length.
pub const LED_COUNT: usize = 15;

/// Running workers wired to mock peripherals.
pub struct Rig {
    pub workers: EffectWorkers,
    pub strip: MockStripHandle,
    pub buzzer: MockBuzzerHandle,
    pub cancel: CancellationToken,
}

/// Spawn both workers with mock peripherals on default ticks.
pub fn spawn_rig() -> Rig {
    let (strip, strip_handle) = MockStrip::new(LED_COUNT);
    let (buzzer, buzzer_handle) = MockBuzzer::new();
    let cancel = CancellationToken::new();
    let workers = EffectWorkers::spawn(
        Box::new(strip),
        Box::new(buzzer),
        WorkerConfig::default(),
        cancel.clone(),
    );
    Rig {
        workers,
        strip: strip_handle,
        buzzer: buzzer_handle,
        cancel,
    }
}

/// Let `ms` of paused time pass.
pub async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
