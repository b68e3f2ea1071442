//! Shared constants for the PortalBox controller.
//!
//! Timing, brightness and register values here are tied to the physical box:
//! a strip of APA102 ("Dotstar") pixels, a piezo buzzer, and an MFRC522
//! proximity reader on SPI. Changing them changes perceived animation speed
//! or breaks compatibility with existing effect driver processes.
//!
//! # Usage
//!
//! ```
//! use portalbox_core::constants::*;
//! use std::time::Duration;
//!
//! let tick = Duration::from_millis(LIGHT_TICK_MS);
//! assert_eq!(tick.as_millis(), 50);
//! assert!(MIN_PULSE_BRIGHTNESS < DEFAULT_BRIGHTNESS);
//! ```

// ============================================================================
// Control Loop
// ============================================================================

/// Period of the access state machine tick, in milliseconds.
///
/// Timeout and grace deadlines are evaluated once per tick, so this is also
/// their precision.
pub const CONTROL_TICK_MS: u64 = 100;

/// Default grace period after the card is removed from a running session.
pub const DEFAULT_GRACE_PERIOD_SECS: u64 = 2;

/// Default grace period after the equipment timeout has elapsed.
///
/// Longer than the removal grace: the card is still in the reader and the
/// user must notice the warning and press the button.
pub const DEFAULT_TIMEOUT_GRACE_PERIOD_SECS: u64 = 30;

/// Delay between equipment identity lookups while the box has no role.
pub const IDENTITY_RETRY_SECS: u64 = 5;

/// Upper bound on states traversed in one tick.
///
/// `IdleUnknownCard` and `AccessComplete` resolve immediately, so a tick can
/// pass through a few states; anything longer indicates a table bug.
pub const MAX_TRANSITIONS_PER_TICK: usize = 8;

// ============================================================================
// Light Effect Engine
// ============================================================================

/// LED engine tick, in milliseconds. All light step intervals are multiples.
pub const LIGHT_TICK_MS: u64 = 50;

/// Pixels on the standard box strip.
pub const DEFAULT_LED_COUNT: usize = 15;

/// Brightness used by solid colors (APA102 brightness is 5 bits, 0-31).
pub const DEFAULT_BRIGHTNESS: u8 = 16;

/// Upper brightness bound for pulse and blink.
pub const MAX_PULSE_BRIGHTNESS: u8 = 30;

/// Lower brightness bound for pulse and blink.
pub const MIN_PULSE_BRIGHTNESS: u8 = 1;

/// Brightness change per tick while pulsing.
pub const PULSE_BRIGHTNESS_STEP: u8 = 2;

/// Largest value the APA102 global brightness field can carry.
pub const MAX_BRIGHTNESS: u8 = 31;

// ============================================================================
// Sound Effect Engine
// ============================================================================

/// Buzzer engine tick, in milliseconds.
pub const SOUND_TICK_MS: u64 = 100;

/// Tone used when none is given (Hz).
pub const DEFAULT_TONE_HZ: f32 = 800.0;

/// Short tone played as a redundant power-on indicator (seconds).
pub const CHIRP_LENGTH_SECS: f32 = 0.2;

// ============================================================================
// MFRC522 Reader Registers
// ============================================================================

/// Version register. Genuine chips report `0x9X`.
pub const VERSION_REG: u8 = 0x37;

/// Mask applied to the version register before comparison.
pub const VERSION_MASK: u8 = 0xFC;

/// Expected masked version value.
pub const EXPECTED_VERSION: u8 = 0x90;

/// ModeReg (17).
pub const MODE_REG: u8 = 0x11;

/// TxControlReg (20). Drops from `0x83` to `0x80` when the chip hangs with
/// its antenna drivers disabled.
pub const TX_CONTROL_REG: u8 = 0x14;

/// TxASKReg (21).
pub const TX_ASK_REG: u8 = 0x15;

/// Registers sampled on every read attempt.
pub const MONITORED_REGISTERS: [u8; 3] = [MODE_REG, TX_CONTROL_REG, TX_ASK_REG];

/// TxControlReg value while the antenna is driven.
pub const TX_CONTROL_ACTIVE: u8 = 0x83;

/// TxControlReg value observed after the chip hangs.
pub const TX_CONTROL_DISABLED: u8 = 0x80;

/// Card read attempts before reporting "no card".
pub const DEFAULT_READ_ATTEMPTS: u8 = 2;

/// Buzzer pulse length in the degraded alert loop (milliseconds).
pub const ALERT_PULSE_MS: u64 = 50;

/// Pause between degraded alert pulses (seconds).
pub const ALERT_PAUSE_SECS: u64 = 10;

// ============================================================================
// Notifications
// ============================================================================

/// Subject of the email sent when a card is left in the reader.
pub const LEFT_CARD_SUBJECT: &str = "Access Card left in PortalBox";
