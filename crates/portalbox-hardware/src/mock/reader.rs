//! Mock MFRC522 card reader.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use portalbox_core::{CardId, constants::*};

use super::lock;
use crate::{HardwareError, Result, traits::CardReader, types::ReaderInfo};

/// Register contents of a healthy chip with the antenna on.
const HEALTHY_REGISTERS: [(u8, u8); 4] = [
    (VERSION_REG, 0x92),
    (MODE_REG, 0x3D),
    (TX_CONTROL_REG, TX_CONTROL_ACTIVE),
    (TX_ASK_REG, 0x40),
];

#[derive(Debug)]
struct ReaderState {
    card: Option<CardId>,
    registers: HashMap<u8, u8>,
    failures_pending: u32,
    requests: u64,
    connected: bool,
}

impl Default for ReaderState {
    fn default() -> Self {
        Self {
            card: None,
            registers: HEALTHY_REGISTERS.into_iter().collect(),
            failures_pending: 0,
            requests: 0,
            connected: true,
        }
    }
}

/// Mock card reader for testing and development.
///
/// A card stays "in the field" from `present_card` until `remove_card`,
/// matching how the real reader answers every poll while a card rests on it.
///
/// # Examples
///
/// ```
/// use portalbox_core::CardId;
/// use portalbox_hardware::mock::MockCardReader;
/// use portalbox_hardware::traits::CardReader;
///
/// #[tokio::main]
/// async fn main() -> portalbox_hardware::Result<()> {
///     let (mut reader, handle) = MockCardReader::new();
///
///     let card = CardId::new(0x04ABCDEF).unwrap();
///     handle.present_card(card);
///     assert_eq!(reader.request_card().await?, Some(card));
///
///     handle.remove_card();
///     assert_eq!(reader.request_card().await?, None);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockCardReader {
    name: String,
    state: Arc<Mutex<ReaderState>>,
}

impl MockCardReader {
    /// Create a new mock reader with the default name.
    pub fn new() -> (Self, MockCardReaderHandle) {
        Self::with_name("Mock MFRC522")
    }

    /// Create a new mock reader with a custom name.
    pub fn with_name(name: impl Into<String>) -> (Self, MockCardReaderHandle) {
        let state = Arc::new(Mutex::new(ReaderState::default()));
        let reader = Self {
            name: name.into(),
            state: Arc::clone(&state),
        };
        (reader, MockCardReaderHandle { state })
    }

    fn ensure_connected(&self) -> Result<()> {
        if lock(&self.state).connected {
            Ok(())
        } else {
            Err(HardwareError::disconnected(self.name.clone()))
        }
    }
}

impl CardReader for MockCardReader {
    async fn request_card(&mut self) -> Result<Option<CardId>> {
        self.ensure_connected()?;
        let mut state = lock(&self.state);
        state.requests += 1;
        if state.failures_pending > 0 {
            state.failures_pending -= 1;
            return Err(HardwareError::card_read("anticollision status not OK"));
        }
        Ok(state.card)
    }

    async fn read_register(&mut self, address: u8) -> Result<u8> {
        self.ensure_connected()?;
        Ok(lock(&self.state)
            .registers
            .get(&address)
            .copied()
            .unwrap_or(0))
    }

    async fn reader_info(&mut self) -> Result<ReaderInfo> {
        let version = self.read_register(VERSION_REG).await?;
        Ok(ReaderInfo::new(self.name.clone(), version))
    }
}

/// Handle for controlling a mock card reader.
#[derive(Debug, Clone)]
pub struct MockCardReaderHandle {
    state: Arc<Mutex<ReaderState>>,
}

impl MockCardReaderHandle {
    /// Place a card in the reader field, replacing any current card.
    pub fn present_card(&self, card: CardId) {
        lock(&self.state).card = Some(card);
    }

    /// Take the card out of the field.
    pub fn remove_card(&self) {
        lock(&self.state).card = None;
    }

    /// Card currently in the field.
    pub fn current_card(&self) -> Option<CardId> {
        lock(&self.state).card
    }

    /// Overwrite a chip register, e.g. to simulate a hang.
    pub fn set_register(&self, address: u8, value: u8) {
        lock(&self.state).registers.insert(address, value);
    }

    /// Make the next `count` requests fail.
    pub fn fail_next_requests(&self, count: u32) {
        lock(&self.state).failures_pending = count;
    }

    /// Simulate the SPI bus going away (or coming back).
    pub fn set_connected(&self, connected: bool) {
        lock(&self.state).connected = connected;
    }

    /// Number of request attempts served so far.
    pub fn request_count(&self) -> u64 {
        lock(&self.state).requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_card_stays_until_removed() {
        let (mut reader, handle) = MockCardReader::new();
        let card = CardId::new(1234).unwrap();

        assert_eq!(reader.request_card().await.unwrap(), None);
        handle.present_card(card);
        assert_eq!(reader.request_card().await.unwrap(), Some(card));
        assert_eq!(reader.request_card().await.unwrap(), Some(card));
        handle.remove_card();
        assert_eq!(reader.request_card().await.unwrap(), None);
        assert_eq!(handle.request_count(), 4);
    }

    #[tokio::test]
    async fn test_healthy_registers() {
        let (mut reader, _handle) = MockCardReader::new();
        assert_eq!(reader.read_register(VERSION_REG).await.unwrap() & VERSION_MASK, 0x90);
        assert_eq!(reader.read_register(TX_CONTROL_REG).await.unwrap(), 0x83);
        assert_eq!(reader.read_register(0x01).await.unwrap(), 0x00);

        let info = reader.reader_info().await.unwrap();
        assert_eq!(info.name, "Mock MFRC522");
        assert_eq!(info.version, 0x92);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let (mut reader, handle) = MockCardReader::new();
        handle.present_card(CardId::new(9).unwrap());
        handle.fail_next_requests(1);

        assert!(matches!(
            reader.request_card().await,
            Err(HardwareError::CardRead { .. })
        ));
        assert!(reader.request_card().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_disconnected_reader() {
        let (mut reader, handle) = MockCardReader::with_name("bench reader");
        handle.set_connected(false);

        let err = reader.read_register(VERSION_REG).await.unwrap_err();
        assert_eq!(err.to_string(), "Device disconnected: bench reader");
    }
}
