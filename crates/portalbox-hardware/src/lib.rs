//! Hardware device abstraction layer for the PortalBox access controller.
//!
//! This crate provides trait-based abstractions for the peripherals inside a
//! badge box: the MFRC522 proximity card reader, the equipment power relay,
//! the front-panel button, the APA102 LED strip and the piezo buzzer. Mock
//! implementations of every trait are included so the controller can be
//! exercised without a Raspberry Pi.
//!
//! # Design Philosophy
//!
//! - **Async where I/O waits**: the card reader uses native `async fn` in
//!   traits (Rust 1.90 + Edition 2024 RPITIT) and is dispatched through
//!   [`AnyCardReader`] since such traits are not object-safe.
//! - **Sync where the caller ticks**: LED strip, buzzer, relay and button are
//!   driven from fixed-period loops and are plain object-safe traits, so they
//!   can be boxed.
//! - **Error-aware**: all operations return [`Result<T>`] with
//!   [`HardwareError`] context.
//!
//! # Reader Health
//!
//! The MFRC522 occasionally locks up with its antenna drivers disabled. The
//! [`ReaderHealthMonitor`] samples a few status registers on every read
//! attempt and reports a hang when the configured signature appears:
//!
//! ```
//! use portalbox_hardware::mock::MockCardReader;
//! use portalbox_hardware::monitor::{CardRead, ReaderHealthConfig, ReaderHealthMonitor};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> portalbox_hardware::Result<()> {
//! let (mut reader, handle) = MockCardReader::new();
//! let mut monitor = ReaderHealthMonitor::new(ReaderHealthConfig::default());
//!
//! assert_eq!(monitor.read_card(&mut reader).await?, CardRead::NoCard);
//!
//! handle.set_register(0x14, 0x80);
//! assert!(matches!(monitor.read_card(&mut reader).await?, CardRead::Hung(_)));
//! # Ok(())
//! # }
//! ```
//!
//! # LED Frames
//!
//! [`apa102`] encodes pixel buffers into the SPI byte stream understood by
//! APA102/SK9822 strips and provides a strip that writes frames to any
//! `std::io::Write`, e.g. an opened `/dev/spidev0.0`.
//!
//! [`AnyCardReader`]: devices::AnyCardReader
//! [`ReaderHealthMonitor`]: monitor::ReaderHealthMonitor

pub mod apa102;
pub mod devices;
pub mod error;
pub mod mock;
pub mod monitor;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use devices::AnyCardReader;
pub use error::{HardwareError, Result};
pub use monitor::{CardRead, HangReason, HangSignature, ReaderHealthConfig, ReaderHealthMonitor};
pub use traits::{ButtonInput, BuzzerOutput, CardReader, LedStrip, PowerRelay};
pub use types::{ColorOrder, Pixel, ReaderInfo};
