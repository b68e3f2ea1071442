//! Enum wrappers for hardware device dispatch.
//!
//! Native `async fn` in traits (RPITIT, Edition 2024) is not object-safe, so
//! the card reader cannot be held as `Box<dyn CardReader>`. The control loop
//! holds an [`AnyCardReader`] instead and dispatches by `match`.
//!
//! # Examples
//!
//! ```
//! use portalbox_hardware::devices::AnyCardReader;
//! use portalbox_hardware::mock::MockCardReader;
//! use portalbox_hardware::traits::CardReader;
//!
//! #[tokio::main]
//! async fn main() -> portalbox_hardware::Result<()> {
//!     let (reader, _handle) = MockCardReader::new();
//!     let mut reader = AnyCardReader::Mock(reader);
//!
//!     let info = reader.reader_info().await?;
//!     println!("Reader: {} (version 0x{:02x})", info.name, info.version);
//!     Ok(())
//! }
//! ```

use portalbox_core::CardId;

use crate::mock::MockCardReader;
use crate::traits::CardReader;
use crate::{ReaderInfo, Result};

/// Enum wrapper for card reader dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyCardReader {
    /// Mock reader for development and testing.
    Mock(MockCardReader),
}

impl CardReader for AnyCardReader {
    async fn request_card(&mut self) -> Result<Option<CardId>> {
        match self {
            Self::Mock(device) => device.request_card().await,
        }
    }

    async fn read_register(&mut self, address: u8) -> Result<u8> {
        match self {
            Self::Mock(device) => device.read_register(address).await,
        }
    }

    async fn reader_info(&mut self) -> Result<ReaderInfo> {
        match self {
            Self::Mock(device) => device.reader_info().await,
        }
    }
}

impl From<MockCardReader> for AnyCardReader {
    fn from(device: MockCardReader) -> Self {
        Self::Mock(device)
    }
}
