//! Service configuration.
//!
//! Loaded from a TOML file. Every key has a default, so an empty file (or
//! no file at all) gives a working emulated box:
//!
//! ```toml
//! hardware = "emulated"
//!
//! [identity]
//! mac_address = "b8:27:eb:00:00:01"
//!
//! [display]
//! auth_color = "00FF00"
//! led_count = 15
//! color_order = "BRG"
//!
//! [timing]
//! grace_period_secs = 2
//! timeout_grace_period_secs = 30
//!
//! [reader]
//! hang_register = 20
//! hang_from = 0x83
//! hang_to = 0x80
//!
//! [sound]
//! power_on_chirp = true
//! grace_beep = { freq_hz = 800.0, duration_ms = 2000, count = 4 }
//!
//! [watchdog]
//! running_file = "/tmp/running"
//! activity_file = "/tmp/boxactivity"
//!
//! [email]
//! from_address = "portalbox@example.edu"
//! ```
//!
//! The `[backend]` section holds the directory served by the in-memory
//! backend (see [`Directory`]).

use std::path::{Path, PathBuf};
use std::time::Duration;

use portalbox_backend::{Directory, EmailSettings, EquipmentProfile, MacAddress};
use portalbox_controller::{BeepPattern, ControllerConfig, DisplayColors};
use portalbox_core::constants::{
    ALERT_PAUSE_SECS, CONTROL_TICK_MS, DEFAULT_GRACE_PERIOD_SECS, DEFAULT_LED_COUNT, DEFAULT_READ_ATTEMPTS,
    DEFAULT_TIMEOUT_GRACE_PERIOD_SECS, EXPECTED_VERSION, IDENTITY_RETRY_SECS, MONITORED_REGISTERS, TX_CONTROL_ACTIVE,
    TX_CONTROL_DISABLED, TX_CONTROL_REG, VERSION_MASK,
};
use portalbox_hardware::{ColorOrder, HangSignature, ReaderHealthConfig};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Where the peripherals come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HardwareMode {
    /// Mock devices driven from a console on standard input.
    #[default]
    Emulated,
    /// Mock devices with no console; only a signal stops the box.
    Headless,
}

/// Full service configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub hardware: HardwareMode,
    pub identity: IdentitySettings,
    pub display: DisplaySettings,
    pub timing: TimingSettings,
    pub reader: ReaderSettings,
    pub sound: SoundSettings,
    pub watchdog: WatchdogSettings,
    pub backend: Directory,
    pub email: EmailSettings,
}

/// How the box finds its MAC address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentitySettings {
    /// Use this address instead of the host's.
    pub mac_address: Option<MacAddress>,
    /// Directory with one entry per network interface.
    pub net_class_dir: PathBuf,
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self {
            mac_address: None,
            net_class_dir: PathBuf::from("/sys/class/net"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    #[serde(flatten)]
    pub colors: DisplayColors,
    pub led_count: usize,
    pub color_order: ColorOrder,
    pub flash_duration_ms: u32,
    pub flash_repeats: u32,
    /// When false, sound commands are dropped.
    pub buzzer_enabled: bool,
    /// SPI device node receiving APA102 frames. Without it frames go to a
    /// mock strip.
    pub spi_device: Option<PathBuf>,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        let controller = ControllerConfig::default();
        Self {
            colors: DisplayColors::default(),
            led_count: DEFAULT_LED_COUNT,
            color_order: ColorOrder::default(),
            flash_duration_ms: controller.flash_duration_ms,
            flash_repeats: controller.flash_repeats,
            buzzer_enabled: true,
            spi_device: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    pub grace_period_secs: u64,
    pub timeout_grace_period_secs: u64,
    /// Control loop period.
    pub tick_ms: u64,
    /// Delay between identity lookups while the box is unregistered.
    pub identity_retry_secs: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            grace_period_secs: DEFAULT_GRACE_PERIOD_SECS,
            timeout_grace_period_secs: DEFAULT_TIMEOUT_GRACE_PERIOD_SECS,
            tick_ms: CONTROL_TICK_MS,
            identity_retry_secs: IDENTITY_RETRY_SECS,
        }
    }
}

impl TimingSettings {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn identity_retry(&self) -> Duration {
        Duration::from_secs(self.identity_retry_secs)
    }
}

/// Reader hang detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderSettings {
    pub hang_register: u8,
    pub hang_from: u8,
    pub hang_to: u8,
    pub monitored_registers: Vec<u8>,
    pub version_mask: u8,
    pub expected_version: u8,
    /// Set to false for reader revisions with another version number.
    pub check_version: bool,
    pub read_attempts: u8,
    /// Pause between two pulses of the hang alert.
    pub alert_pause_secs: u64,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            hang_register: TX_CONTROL_REG,
            hang_from: TX_CONTROL_ACTIVE,
            hang_to: TX_CONTROL_DISABLED,
            monitored_registers: MONITORED_REGISTERS.to_vec(),
            version_mask: VERSION_MASK,
            expected_version: EXPECTED_VERSION,
            check_version: true,
            read_attempts: DEFAULT_READ_ATTEMPTS,
            alert_pause_secs: ALERT_PAUSE_SECS,
        }
    }
}

impl ReaderSettings {
    pub fn health_config(&self) -> ReaderHealthConfig {
        ReaderHealthConfig {
            signature: HangSignature {
                register: self.hang_register,
                from: self.hang_from,
                to: self.hang_to,
            },
            monitored_registers: self.monitored_registers.clone(),
            version_mask: self.version_mask,
            expected_version: self.check_version.then_some(self.expected_version),
            read_attempts: self.read_attempts,
        }
    }

    pub fn alert_pause(&self) -> Duration {
        Duration::from_secs(self.alert_pause_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundSettings {
    /// Beep played while a grace period runs.
    pub grace_beep: Option<BeepPattern>,
    /// Short tone each time the equipment is powered.
    pub power_on_chirp: bool,
}

/// Files read by the external watchdog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchdogSettings {
    /// `True` while the equipment is powered, `False` otherwise.
    pub running_file: PathBuf,
    /// Last service event (`service_exit`, `service_interrupt`).
    pub activity_file: PathBuf,
}

impl Default for WatchdogSettings {
    fn default() -> Self {
        Self {
            running_file: PathBuf::from("/tmp/running"),
            activity_file: PathBuf::from("/tmp/boxactivity"),
        }
    }
}

impl ServiceConfig {
    /// Read and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, is not valid
    /// TOML, or holds an out-of-range value.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Like [`load`](Self::load), but a missing file gives the defaults.
    ///
    /// # Errors
    ///
    /// As [`load`](Self::load), except for a missing file.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            warn!("Configuration file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Parse and validate configuration text.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for invalid TOML or out-of-range values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: ServiceConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.display.led_count == 0 {
            return Err(ConfigError::invalid("display.led_count", "must be at least 1"));
        }
        if self.display.flash_repeats == 0 {
            return Err(ConfigError::invalid("display.flash_repeats", "must be at least 1"));
        }
        if self.timing.tick_ms == 0 {
            return Err(ConfigError::invalid("timing.tick_ms", "must be at least 1"));
        }
        if self.timing.identity_retry_secs == 0 {
            return Err(ConfigError::invalid("timing.identity_retry_secs", "must be at least 1"));
        }
        if let Some(beep) = &self.sound.grace_beep {
            if !(beep.freq_hz.is_finite() && beep.freq_hz > 0.0) {
                return Err(ConfigError::invalid("sound.grace_beep.freq_hz", "must be a positive frequency"));
            }
        }
        self.reader
            .health_config()
            .validate()
            .map_err(|e| ConfigError::invalid("reader", e.to_string()))
    }

    /// Controller configuration for this box.
    ///
    /// The equipment profile, once known, decides the session timeout and
    /// whether proxy cards are accepted.
    pub fn controller_config(&self, profile: Option<&EquipmentProfile>) -> ControllerConfig {
        ControllerConfig {
            colors: self.display.colors,
            flash_duration_ms: self.display.flash_duration_ms,
            flash_repeats: self.display.flash_repeats,
            grace_period: Duration::from_secs(self.timing.grace_period_secs),
            timeout_grace_period: Duration::from_secs(self.timing.timeout_grace_period_secs),
            timeout_minutes: profile.map_or(0, |p| p.timeout_minutes),
            allow_proxy: profile.is_some_and(|p| p.allow_proxy),
            grace_beep: self.sound.grace_beep,
            power_on_chirp: self.sound.power_on_chirp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portalbox_core::Rgb;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = ServiceConfig::from_toml_str("").unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.hardware, HardwareMode::Emulated);
        assert_eq!(config.timing.tick(), Duration::from_millis(100));
        assert_eq!(config.reader.hang_register, 20);
        assert_eq!(config.reader.monitored_registers, vec![17, 20, 21]);
    }

    #[test]
    fn test_display_colors_are_flattened() {
        let config = ServiceConfig::from_toml_str(
            r#"
            [display]
            auth_color = "123456"
            led_count = 30
            color_order = "RBG"
            buzzer_enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(config.display.colors.auth_color, Rgb::new(0x12, 0x34, 0x56));
        assert_eq!(config.display.colors.sleep_color, DisplayColors::default().sleep_color);
        assert_eq!(config.display.led_count, 30);
        assert_eq!(config.display.color_order, ColorOrder::Rbg);
        assert!(!config.display.buzzer_enabled);
    }

    #[test]
    fn test_bad_color_is_rejected() {
        let result = ServiceConfig::from_toml_str(
            r#"
            [display]
            auth_color = "green"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_zero_led_count_names_key() {
        let error = ServiceConfig::from_toml_str("[display]\nled_count = 0\n").unwrap_err();
        assert!(matches!(
            error,
            ConfigError::Invalid {
                key: "display.led_count",
                ..
            }
        ));
    }

    #[test]
    fn test_register_out_of_range() {
        let error = ServiceConfig::from_toml_str("[reader]\nhang_register = 64\n").unwrap_err();
        assert!(matches!(error, ConfigError::Invalid { key: "reader", .. }));
    }

    #[test]
    fn test_version_check_can_be_disabled() {
        let config = ServiceConfig::from_toml_str("[reader]\ncheck_version = false\n").unwrap();
        assert_eq!(config.reader.health_config().expected_version, None);
    }

    #[test]
    fn test_controller_config_takes_profile() {
        let config = ServiceConfig::from_toml_str(
            r#"
            [timing]
            grace_period_secs = 5

            [sound]
            power_on_chirp = true
            grace_beep = { freq_hz = 440.0, duration_ms = 1000, count = 2 }
            "#,
        )
        .unwrap();
        let profile = EquipmentProfile {
            id: 3,
            mac_address: "b827eb000003".parse().unwrap(),
            type_id: 1,
            type_name: "Lathe".to_string(),
            location: "Shop".to_string(),
            timeout_minutes: 45,
            allow_proxy: true,
            requires_training: true,
            requires_payment: false,
        };

        let before = config.controller_config(None);
        assert_eq!(before.timeout_minutes, 0);
        assert!(!before.allow_proxy);

        let after = config.controller_config(Some(&profile));
        assert_eq!(after.timeout_minutes, 45);
        assert!(after.allow_proxy);
        assert_eq!(after.grace_period, Duration::from_secs(5));
        assert!(after.power_on_chirp);
        assert_eq!(after.grace_beep.map(|b| b.count), Some(2));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServiceConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert!(matches!(
            ServiceConfig::load(&dir.path().join("absent.toml")),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_backend_directory_section() {
        let config = ServiceConfig::from_toml_str(
            r#"
            [identity]
            mac_address = "B8:27:EB:00:00:07"

            [[backend.equipment]]
            id = 7
            mac_address = "b8:27:eb:00:00:07"
            type_id = 2
            type_name = "Band Saw"
            location = "Wood Shop"
            "#,
        )
        .unwrap();
        assert_eq!(config.backend.equipment.len(), 1);
        assert_eq!(
            config.identity.mac_address.as_ref().map(MacAddress::as_str),
            Some("b827eb000007")
        );
    }
}
