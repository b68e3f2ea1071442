//! Hardware facade: the only way the service touches the box.
//!
//! Card reads go through the [`ReaderHealthMonitor`]; light and sound go to
//! the effect workers over their command channels; the relay also feeds the
//! watchdog's running file.

use std::time::Duration;

use portalbox_core::Rgb;
use portalbox_core::constants::{ALERT_PULSE_MS, DEFAULT_TONE_HZ, SOUND_TICK_MS};
use portalbox_effects::{EffectWorkers, LightCommand, SoundCommand, WorkerConfig};
use portalbox_hardware::{
    AnyCardReader, ButtonInput, BuzzerOutput, CardRead, HangReason, LedStrip, PowerRelay, ReaderHealthMonitor,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, trace, warn};

use crate::config::ServiceConfig;
use crate::watchdog::Watchdog;

/// The devices of one box.
pub struct Peripherals {
    pub reader: AnyCardReader,
    pub button: Box<dyn ButtonInput>,
    pub relay: Box<dyn PowerRelay>,
    pub strip: Box<dyn LedStrip>,
    pub buzzer: Box<dyn BuzzerOutput>,
}

pub struct HardwareFacade {
    reader: AnyCardReader,
    monitor: ReaderHealthMonitor,
    button: Box<dyn ButtonInput>,
    relay: Box<dyn PowerRelay>,
    workers: EffectWorkers,
    watchdog: Watchdog,
    buzzer_enabled: bool,
    alert_pause: Duration,
}

impl HardwareFacade {
    /// Take over the peripherals and start the effect workers.
    ///
    /// The workers run until [`shutdown`](Self::shutdown), so commands
    /// queued while the service stops still reach them.
    pub fn new(peripherals: Peripherals, config: &ServiceConfig) -> Self {
        let Peripherals {
            reader,
            button,
            relay,
            strip,
            buzzer,
        } = peripherals;

        Self {
            reader,
            monitor: ReaderHealthMonitor::new(config.reader.health_config()),
            button,
            relay,
            workers: EffectWorkers::spawn(strip, buzzer, WorkerConfig::default(), CancellationToken::new()),
            watchdog: Watchdog::new(&config.watchdog),
            buzzer_enabled: config.display.buzzer_enabled,
            alert_pause: config.reader.alert_pause(),
        }
    }

    /// Read the card in the field, checking reader health first.
    ///
    /// A failed register sample is reported as no card.
    pub async fn read_card(&mut self) -> CardRead {
        match self.monitor.read_card(&mut self.reader).await {
            Ok(read) => read,
            Err(e) => {
                warn!("Card reader sampling failed: {}", e);
                CardRead::NoCard
            }
        }
    }

    pub fn button_pressed_since_last_check(&mut self) -> bool {
        self.button.take_pressed()
    }

    pub fn set_power(&mut self, on: bool) {
        if on {
            info!("Turning on equipment power");
        } else {
            info!("Turning off equipment power");
        }
        self.watchdog.set_running(on);
        if let Err(e) = self.relay.set_power(on) {
            error!("Failed to switch equipment power: {}", e);
        }
    }

    pub fn is_powered(&self) -> bool {
        self.relay.is_powered()
    }

    pub fn watchdog(&self) -> &Watchdog {
        &self.watchdog
    }

    pub fn send_light(&self, command: LightCommand) {
        if let Err(e) = self.workers.light().send(command) {
            warn!("Dropping light command: {}", e);
        }
    }

    /// Queue a sound command, unless the buzzer is disabled.
    pub fn send_sound(&self, command: SoundCommand) {
        if !self.buzzer_enabled {
            trace!("Buzzer disabled, dropping '{}'", command);
            return;
        }
        if let Err(e) = self.workers.sound().send(command) {
            warn!("Dropping sound command: {}", e);
        }
    }

    /// Wait until both workers have applied every queued command.
    pub async fn drain(&self) {
        self.workers.drain().await;
    }

    /// Signal a hung reader until `cancel` fires.
    ///
    /// The equipment is switched off, then a short beep with a red flash
    /// alternates with a long amber pause. The reader cannot recover in
    /// process; the external watchdog is expected to restart the service.
    pub async fn alert_loop(&mut self, reason: HangReason, cancel: &CancellationToken) {
        error!("Card reader hung ({}), waiting for a restart", reason);
        if self.is_powered() {
            self.set_power(false);
        }

        let pulse = Duration::from_millis(ALERT_PULSE_MS);
        let beep = SoundCommand::Tone {
            freq_hz: DEFAULT_TONE_HZ,
            length_secs: Duration::from_millis(ALERT_PULSE_MS.max(SOUND_TICK_MS)).as_secs_f32(),
            stop_song: true,
            stop_beep: true,
        };

        loop {
            self.send_sound(beep.clone());
            self.send_light(LightCommand::Color { rgb: Rgb::RED });
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(pulse) => {}
            }

            self.send_light(LightCommand::Color { rgb: Rgb::AMBER });
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.alert_pause) => {}
            }
        }
    }

    /// Let queued commands reach the workers, then stop them.
    pub async fn shutdown(self, grace: Duration) {
        if tokio::time::timeout(grace, self.workers.drain()).await.is_err() {
            warn!("Effect commands still queued after {:?}", grace);
        }
        self.workers.shutdown(grace).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulator::{EmulatorHandles, emulated_peripherals};
    use portalbox_hardware::mock::BuzzerEvent;
    use tempfile::TempDir;

    fn facade(configure: impl FnOnce(&mut ServiceConfig)) -> (HardwareFacade, EmulatorHandles, TempDir) {
        let dir = TempDir::new().unwrap();
        let mut config = ServiceConfig::default();
        config.watchdog.running_file = dir.path().join("running");
        config.watchdog.activity_file = dir.path().join("activity");
        configure(&mut config);

        let (peripherals, handles) = emulated_peripherals(&config.display).unwrap();
        (HardwareFacade::new(peripherals, &config), handles, dir)
    }

    fn tone() -> SoundCommand {
        SoundCommand::Tone {
            freq_hz: 880.0,
            length_secs: 1.0,
            stop_song: true,
            stop_beep: true,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_power_feeds_watchdog() {
        let (mut facade, handles, dir) = facade(|_| {});

        facade.set_power(true);
        assert!(handles.relay.is_powered());
        assert_eq!(std::fs::read_to_string(dir.path().join("running")).unwrap(), "True\n");

        facade.set_power(false);
        assert!(!facade.is_powered());
        assert_eq!(std::fs::read_to_string(dir.path().join("running")).unwrap(), "False\n");
        facade.shutdown(Duration::from_secs(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_sound_reaches_buzzer() {
        let (facade, handles, _dir) = facade(|_| {});

        facade.send_sound(tone());
        facade.drain().await;
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(handles.buzzer.events().first(), Some(&BuzzerEvent::Start(880.0)));
        facade.shutdown(Duration::from_secs(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_buzzer_drops_sound() {
        let (facade, handles, _dir) = facade(|config| config.display.buzzer_enabled = false);

        facade.send_sound(tone());
        facade.drain().await;
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert!(handles.buzzer.events().is_empty());
        facade.shutdown(Duration::from_secs(1)).await;
    }
}
