//! Controller configuration: display colors, timing and optional sounds.

use std::time::Duration;

use portalbox_core::Rgb;
use portalbox_core::constants::{
    CHIRP_LENGTH_SECS, DEFAULT_GRACE_PERIOD_SECS, DEFAULT_TIMEOUT_GRACE_PERIOD_SECS, DEFAULT_TONE_HZ,
};
use portalbox_effects::{Direction, LightCommand, SoundCommand};
use serde::{Deserialize, Serialize};

/// Length of the setup wipe, in milliseconds.
pub const SETUP_WIPE_MS: u32 = 1000;

/// Colors shown in each state.
///
/// Deserializes from `RRGGBB` hex strings; missing keys keep their default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayColors {
    pub setup_color: Rgb,
    pub sleep_color: Rgb,
    pub auth_color: Rgb,
    pub proxy_color: Rgb,
    pub training_color: Rgb,
    pub unauth_color: Rgb,
    pub no_card_grace_color: Rgb,
    pub grace_timeout_color: Rgb,
    pub timeout_color: Rgb,
}

impl Default for DisplayColors {
    fn default() -> Self {
        Self {
            setup_color: Rgb::new(0xFF, 0xFF, 0xFF),
            sleep_color: Rgb::new(0x00, 0x00, 0xFF),
            auth_color: Rgb::new(0x00, 0xFF, 0x00),
            proxy_color: Rgb::new(0xFF, 0x00, 0xFF),
            training_color: Rgb::new(0x00, 0xFF, 0xFF),
            unauth_color: Rgb::RED,
            no_card_grace_color: Rgb::AMBER,
            grace_timeout_color: Rgb::new(0xFF, 0x80, 0x00),
            timeout_color: Rgb::RED,
        }
    }
}

/// A repeated beep, played while a grace period runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeepPattern {
    pub freq_hz: f32,
    pub duration_ms: u32,
    pub count: u32,
}

impl Default for BeepPattern {
    fn default() -> Self {
        Self {
            freq_hz: DEFAULT_TONE_HZ,
            duration_ms: 2000,
            count: 4,
        }
    }
}

impl BeepPattern {
    #[must_use]
    pub fn command(&self) -> SoundCommand {
        SoundCommand::Beep {
            freq_hz: self.freq_hz,
            duration_ms: self.duration_ms,
            count: self.count.max(1),
        }
    }
}

/// Everything the transition function needs besides state and input.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    pub colors: DisplayColors,
    /// Length of an error flash (unauthorized card, grace warnings).
    pub flash_duration_ms: u32,
    pub flash_repeats: u32,
    /// Grace period after the card is removed.
    pub grace_period: Duration,
    /// Grace period after the equipment timeout elapsed.
    pub timeout_grace_period: Duration,
    /// Equipment timeout; `0` disables it.
    pub timeout_minutes: u32,
    /// Whether proxy cards may take over a session on this equipment.
    pub allow_proxy: bool,
    pub grace_beep: Option<BeepPattern>,
    /// Chirp on every powered entry.
    pub power_on_chirp: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            colors: DisplayColors::default(),
            flash_duration_ms: 1000,
            flash_repeats: 5,
            grace_period: Duration::from_secs(DEFAULT_GRACE_PERIOD_SECS),
            timeout_grace_period: Duration::from_secs(DEFAULT_TIMEOUT_GRACE_PERIOD_SECS),
            timeout_minutes: 0,
            allow_proxy: false,
            grace_beep: None,
            power_on_chirp: false,
        }
    }
}

impl ControllerConfig {
    /// Equipment timeout, or `None` when disabled.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_minutes > 0).then(|| Duration::from_secs(u64::from(self.timeout_minutes) * 60))
    }

    pub(crate) fn setup_wipe(&self) -> LightCommand {
        LightCommand::Wipe {
            rgb: self.colors.setup_color,
            duration_ms: SETUP_WIPE_MS,
            direction: Direction::Up,
        }
    }

    pub(crate) fn flash(&self, rgb: Rgb) -> LightCommand {
        LightCommand::Blink {
            rgb,
            duration_ms: self.flash_duration_ms,
            repeats: self.flash_repeats.max(1),
        }
    }

    pub(crate) fn chirp(&self) -> Option<SoundCommand> {
        self.power_on_chirp.then_some(SoundCommand::Tone {
            freq_hz: DEFAULT_TONE_HZ,
            length_secs: CHIRP_LENGTH_SECS,
            stop_song: false,
            stop_beep: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_timeout_is_disabled() {
        let mut config = ControllerConfig::default();
        assert_eq!(config.timeout(), None);
        config.timeout_minutes = 2;
        assert_eq!(config.timeout(), Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_flash_never_has_zero_repeats() {
        let config = ControllerConfig {
            flash_repeats: 0,
            ..ControllerConfig::default()
        };
        assert!(matches!(config.flash(Rgb::RED), LightCommand::Blink { repeats: 1, .. }));
    }

    #[test]
    fn test_colors_deserialize_with_defaults() {
        let colors: DisplayColors = serde_json::from_str(r#"{"auth_color": "123456"}"#).unwrap();
        assert_eq!(colors.auth_color, Rgb::new(0x12, 0x34, 0x56));
        assert_eq!(colors.sleep_color, DisplayColors::default().sleep_color);
    }

    #[test]
    fn test_chirp_only_when_enabled() {
        let mut config = ControllerConfig::default();
        assert!(config.chirp().is_none());
        config.power_on_chirp = true;
        assert!(matches!(config.chirp(), Some(SoundCommand::Tone { .. })));
    }
}
