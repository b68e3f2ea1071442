//! Reader hang detection.
//!
//! The MFRC522 sometimes stops answering requests with its antenna drivers
//! switched off, and never recovers without a reset. There is no status bit
//! for this, so the monitor samples a few registers on every read attempt
//! and compares them with the previous sample. A hang is declared when:
//!
//! - the masked version register no longer reads as an MFRC522, or
//! - the signature register moves from its "active" value to its
//!   "disabled" value (by default TxControlReg `0x83 -> 0x80`).
//!
//! This is a heuristic tuned on one chip revision. It accepts false
//! negatives, and the signature is configurable for other revisions.

use std::fmt;

use portalbox_core::{CardId, constants::*};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{HardwareError, Result, traits::CardReader};

/// Size of the MFRC522 register file.
const REGISTER_COUNT: usize = 64;

/// Register transition that marks a hung reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HangSignature {
    pub register: u8,
    pub from: u8,
    pub to: u8,
}

impl Default for HangSignature {
    fn default() -> Self {
        Self {
            register: TX_CONTROL_REG,
            from: TX_CONTROL_ACTIVE,
            to: TX_CONTROL_DISABLED,
        }
    }
}

/// Reader health monitor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderHealthConfig {
    /// Transition that marks a hang.
    pub signature: HangSignature,

    /// Registers sampled on every read. Changes are logged.
    pub monitored_registers: Vec<u8>,

    /// Mask applied to the version register.
    pub version_mask: u8,

    /// Expected masked version; `None` disables the check.
    pub expected_version: Option<u8>,

    /// Request attempts before reporting "no card".
    pub read_attempts: u8,
}

impl Default for ReaderHealthConfig {
    fn default() -> Self {
        Self {
            signature: HangSignature::default(),
            monitored_registers: MONITORED_REGISTERS.to_vec(),
            version_mask: VERSION_MASK,
            expected_version: Some(EXPECTED_VERSION),
            read_attempts: DEFAULT_READ_ATTEMPTS,
        }
    }
}

impl ReaderHealthConfig {
    /// Check register addresses and attempt count.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for addresses outside the register file
    /// or a zero attempt count.
    pub fn validate(&self) -> Result<()> {
        let out_of_range = self
            .monitored_registers
            .iter()
            .chain(std::iter::once(&self.signature.register))
            .find(|reg| usize::from(**reg) >= REGISTER_COUNT);
        if let Some(reg) = out_of_range {
            return Err(HardwareError::configuration(format!(
                "register 0x{reg:02x} is outside the reader register file"
            )));
        }
        if self.read_attempts == 0 {
            return Err(HardwareError::configuration("read_attempts must be at least 1"));
        }
        Ok(())
    }
}

/// Why the reader was declared hung.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HangReason {
    /// The version register does not identify the chip.
    VersionMismatch { found: u8 },

    /// The signature register made its hang transition.
    RegisterSignature { register: u8, from: u8, to: u8 },
}

impl fmt::Display for HangReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HangReason::VersionMismatch { found } => {
                write!(f, "version register reads 0x{found:02x}")
            }
            HangReason::RegisterSignature { register, from, to } => {
                write!(f, "register 0x{register:02x} went 0x{from:02x} -> 0x{to:02x}")
            }
        }
    }
}

/// Outcome of a monitored card read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardRead {
    Card(CardId),
    NoCard,
    Hung(HangReason),
}

/// Last observed value of every reader register. Starts zeroed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterSnapshot {
    values: [u8; REGISTER_COUNT],
}

impl RegisterSnapshot {
    /// Last observed value, `None` outside the register file.
    #[must_use]
    pub fn get(&self, register: u8) -> Option<u8> {
        self.values.get(usize::from(register)).copied()
    }

    /// Store a value, returning the previous one.
    fn replace(&mut self, register: u8, value: u8) -> Option<u8> {
        self.values
            .get_mut(usize::from(register))
            .map(|slot| std::mem::replace(slot, value))
    }
}

impl Default for RegisterSnapshot {
    fn default() -> Self {
        Self {
            values: [0; REGISTER_COUNT],
        }
    }
}

/// Wraps card reads with register sampling and retry.
#[derive(Debug, Clone, Default)]
pub struct ReaderHealthMonitor {
    config: ReaderHealthConfig,
    snapshot: RegisterSnapshot,
}

impl ReaderHealthMonitor {
    /// Create a monitor with an all-zero register snapshot.
    pub fn new(config: ReaderHealthConfig) -> Self {
        Self {
            config,
            snapshot: RegisterSnapshot::default(),
        }
    }

    /// Current register snapshot.
    pub fn snapshot(&self) -> &RegisterSnapshot {
        &self.snapshot
    }

    /// Record one register sample and test it against the hang signature.
    ///
    /// # Examples
    ///
    /// ```
    /// use portalbox_hardware::monitor::{HangReason, ReaderHealthConfig, ReaderHealthMonitor};
    ///
    /// let mut monitor = ReaderHealthMonitor::new(ReaderHealthConfig::default());
    /// assert_eq!(monitor.observe(20, 0x83), None);
    /// assert!(matches!(
    ///     monitor.observe(20, 0x80),
    ///     Some(HangReason::RegisterSignature { register: 20, .. })
    /// ));
    /// ```
    pub fn observe(&mut self, register: u8, value: u8) -> Option<HangReason> {
        let previous = self.snapshot.replace(register, value)?;
        if previous != value {
            info!(
                "Reader register 0x{:02x} changed from 0x{:02x} to 0x{:02x}",
                register, previous, value
            );
        }

        let signature = self.config.signature;
        (register == signature.register && previous == signature.from && value == signature.to)
            .then_some(HangReason::RegisterSignature {
                register,
                from: previous,
                to: value,
            })
    }

    /// Sample the version and monitored registers.
    ///
    /// Every monitored register is sampled even after a hang is found so the
    /// snapshot stays current.
    ///
    /// # Errors
    ///
    /// Returns an error if a register read fails.
    pub async fn check<R: CardReader>(&mut self, reader: &mut R) -> Result<Option<HangReason>> {
        let mut reason = None;

        if let Some(expected) = self.config.expected_version {
            let version = reader.read_register(VERSION_REG).await? & self.config.version_mask;
            if version != expected {
                info!("Reader communication failed, version register reads 0x{:02x}", version);
                reason = Some(HangReason::VersionMismatch { found: version });
            }
        }

        for index in 0..self.config.monitored_registers.len() {
            let register = self.config.monitored_registers[index];
            let value = reader.read_register(register).await?;
            if let Some(found) = self.observe(register, value) {
                reason.get_or_insert(found);
            }
        }

        if let Some(reason) = reason {
            error!("Card reader hang detected: {}", reason);
        }
        Ok(reason)
    }

    /// Check reader health, then attempt to read a card.
    ///
    /// A failed or empty request is retried up to the configured attempt
    /// count before reporting [`CardRead::NoCard`].
    ///
    /// # Errors
    ///
    /// Returns an error if register sampling fails. Request failures are
    /// absorbed by the retry.
    pub async fn read_card<R: CardReader>(&mut self, reader: &mut R) -> Result<CardRead> {
        if let Some(reason) = self.check(reader).await? {
            return Ok(CardRead::Hung(reason));
        }

        for attempt in 1..=self.config.read_attempts {
            match reader.request_card().await {
                Ok(Some(card)) => return Ok(CardRead::Card(card)),
                Ok(None) => {}
                Err(e) => debug!("Card request attempt {} failed: {}", attempt, e),
            }
        }
        Ok(CardRead::NoCard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockCardReader;

    #[test]
    fn test_signature_requires_exact_transition() {
        let mut monitor = ReaderHealthMonitor::default();
        assert_eq!(monitor.observe(TX_CONTROL_REG, 0x80), None);
        assert_eq!(monitor.observe(TX_CONTROL_REG, 0x83), None);
        assert_eq!(monitor.observe(TX_CONTROL_REG, 0x83), None);
        assert!(monitor.observe(TX_CONTROL_REG, 0x80).is_some());
        assert_eq!(monitor.snapshot().get(TX_CONTROL_REG), Some(0x80));
    }

    #[test]
    fn test_other_registers_never_match_signature() {
        let mut monitor = ReaderHealthMonitor::default();
        monitor.observe(MODE_REG, 0x83);
        assert_eq!(monitor.observe(MODE_REG, 0x80), None);
    }

    #[test]
    fn test_custom_signature() {
        let config = ReaderHealthConfig {
            signature: HangSignature {
                register: TX_ASK_REG,
                from: 0x40,
                to: 0x00,
            },
            ..Default::default()
        };
        let mut monitor = ReaderHealthMonitor::new(config);
        monitor.observe(TX_ASK_REG, 0x40);
        assert!(monitor.observe(TX_ASK_REG, 0x00).is_some());
    }

    #[test]
    fn test_out_of_range_register_is_ignored() {
        let mut monitor = ReaderHealthMonitor::default();
        assert_eq!(monitor.observe(200, 0x80), None);
        assert_eq!(monitor.snapshot().get(200), None);
    }

    #[test]
    fn test_config_validation() {
        assert!(ReaderHealthConfig::default().validate().is_ok());

        let bad_register = ReaderHealthConfig {
            monitored_registers: vec![0x11, 0x40],
            ..Default::default()
        };
        assert!(bad_register.validate().is_err());

        let no_attempts = ReaderHealthConfig {
            read_attempts: 0,
            ..Default::default()
        };
        assert!(no_attempts.validate().is_err());
    }

    #[tokio::test]
    async fn test_hang_detected_on_next_read() {
        let (mut reader, handle) = MockCardReader::new();
        let mut monitor = ReaderHealthMonitor::default();

        assert_eq!(monitor.read_card(&mut reader).await.unwrap(), CardRead::NoCard);

        handle.set_register(TX_CONTROL_REG, TX_CONTROL_DISABLED);
        let read = monitor.read_card(&mut reader).await.unwrap();
        assert_eq!(
            read,
            CardRead::Hung(HangReason::RegisterSignature {
                register: TX_CONTROL_REG,
                from: TX_CONTROL_ACTIVE,
                to: TX_CONTROL_DISABLED,
            })
        );
    }

    #[tokio::test]
    async fn test_version_mismatch_is_a_hang() {
        let (mut reader, handle) = MockCardReader::new();
        let mut monitor = ReaderHealthMonitor::default();

        handle.set_register(VERSION_REG, 0x00);
        let read = monitor.read_card(&mut reader).await.unwrap();
        assert_eq!(read, CardRead::Hung(HangReason::VersionMismatch { found: 0x00 }));
    }

    #[tokio::test]
    async fn test_single_failure_is_retried() {
        let (mut reader, handle) = MockCardReader::new();
        let mut monitor = ReaderHealthMonitor::default();
        let card = CardId::new(0x04AB_CDEF).unwrap();

        handle.present_card(card);
        handle.fail_next_requests(1);
        assert_eq!(monitor.read_card(&mut reader).await.unwrap(), CardRead::Card(card));

        handle.fail_next_requests(2);
        assert_eq!(monitor.read_card(&mut reader).await.unwrap(), CardRead::NoCard);
        assert_eq!(monitor.read_card(&mut reader).await.unwrap(), CardRead::Card(card));
    }
}
