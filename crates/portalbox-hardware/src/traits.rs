//! Device traits for the peripherals of a badge box.
//!
//! The card reader is polled from the async control loop and uses native
//! `async fn` in traits. The other peripherals are driven from fixed-period
//! loops, never wait on I/O for longer than a register write, and are plain
//! object-safe traits.

#![allow(async_fn_in_trait)]

use portalbox_core::CardId;

use crate::{
    Result,
    types::{Pixel, ReaderInfo},
};

/// Proximity card reader with register-level access.
///
/// Implementations expose a single low-level read attempt; retrying and
/// hang detection are layered on top by
/// [`ReaderHealthMonitor`](crate::monitor::ReaderHealthMonitor).
///
/// # Examples
///
/// ```no_run
/// use portalbox_hardware::traits::CardReader;
/// use portalbox_hardware::Result;
///
/// async fn poll<R: CardReader>(reader: &mut R) -> Result<()> {
///     if let Some(card) = reader.request_card().await? {
///         println!("card {}", card);
///     }
///     Ok(())
/// }
/// ```
pub trait CardReader: Send + Sync {
    /// Perform one request + anticollision cycle.
    ///
    /// Returns `Ok(None)` when no card answers the request.
    ///
    /// # Errors
    ///
    /// Returns an error when the chip answers but the exchange fails
    /// (e.g. anticollision status not OK). Isolated failures are common and
    /// not diagnostic of a hang.
    async fn request_card(&mut self) -> Result<Option<CardId>>;

    /// Read one chip register.
    ///
    /// # Errors
    ///
    /// Returns an error if the bus transfer fails.
    async fn read_register(&mut self, address: u8) -> Result<u8>;

    /// Get reader information.
    ///
    /// # Errors
    ///
    /// Returns an error if the version register cannot be read.
    async fn reader_info(&mut self) -> Result<ReaderInfo>;
}

/// Solid-state relay (and interlock) switching power to the equipment.
pub trait PowerRelay: Send {
    /// Switch equipment power.
    ///
    /// # Errors
    ///
    /// Returns an error if the output line cannot be driven.
    fn set_power(&mut self, on: bool) -> Result<()>;

    /// Last commanded state.
    fn is_powered(&self) -> bool;
}

/// Front-panel push button with edge latching.
pub trait ButtonInput: Send {
    /// Whether the button was pressed since the previous call. Clears the latch.
    fn take_pressed(&mut self) -> bool;
}

/// Addressable LED strip.
pub trait LedStrip: Send {
    /// Number of pixels on the strip.
    fn len(&self) -> usize;

    /// Whether the strip has no pixels.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Transmit a full frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame length does not match the strip or the
    /// transfer fails.
    fn show(&mut self, pixels: &[Pixel]) -> Result<()>;
}

/// Piezo buzzer, either PWM driven (tone follows frequency) or a plain
/// on/off line that ignores frequency.
pub trait BuzzerOutput: Send {
    /// Start sounding at the given frequency.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be driven.
    fn start(&mut self, freq_hz: f32) -> Result<()>;

    /// Silence the buzzer.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be driven.
    fn stop(&mut self) -> Result<()>;

    /// Whether the buzzer is currently sounding.
    fn is_sounding(&self) -> bool;
}
