//! Emulated hardware.
//!
//! Without a Raspberry Pi the box runs on mock devices. A console on
//! standard input plays the user:
//!
//! ```text
//! present 0x04ABCDEF put a card on the reader (decimal, or hex with 0x)
//! remove             take it away
//! press              press the front-panel button
//! quit               stop the service
//! ```

use std::fs::OpenOptions;
use std::str::FromStr;

use portalbox_core::CardId;
use portalbox_hardware::apa102::WriterStrip;
use portalbox_hardware::mock::{
    MockButton, MockButtonHandle, MockBuzzer, MockBuzzerHandle, MockCardReader, MockCardReaderHandle, MockRelay,
    MockRelayHandle, MockStrip, MockStripHandle,
};
use portalbox_hardware::{AnyCardReader, LedStrip};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::DisplaySettings;
use crate::error::{Result, ServiceError};
use crate::facade::Peripherals;

/// Controls for the mock devices behind an emulated box.
#[derive(Debug, Clone)]
pub struct EmulatorHandles {
    pub reader: MockCardReaderHandle,
    pub button: MockButtonHandle,
    pub relay: MockRelayHandle,
    /// `None` when frames go to an SPI device.
    pub strip: Option<MockStripHandle>,
    pub buzzer: MockBuzzerHandle,
}

/// Build mock peripherals for `display`.
///
/// With `spi_device` set, LED frames are written to that device node.
///
/// # Errors
///
/// Returns an error if the SPI device cannot be opened.
pub fn emulated_peripherals(display: &DisplaySettings) -> Result<(Peripherals, EmulatorHandles)> {
    let (reader, reader_handle) = MockCardReader::with_name("MFRC522 (emulated)");
    let (button, button_handle) = MockButton::new();
    let (relay, relay_handle) = MockRelay::new();
    let (buzzer, buzzer_handle) = MockBuzzer::new();

    let (strip, strip_handle): (Box<dyn LedStrip>, _) = match &display.spi_device {
        Some(path) => {
            info!("Writing LED frames to {}", path.display());
            let device = OpenOptions::new().write(true).open(path)?;
            let strip = WriterStrip::new(device, display.led_count, display.color_order)?;
            (Box::new(strip), None)
        }
        None => {
            let (strip, handle) = MockStrip::new(display.led_count);
            (Box::new(strip), Some(handle))
        }
    };

    let peripherals = Peripherals {
        reader: AnyCardReader::from(reader),
        button: Box::new(button),
        relay: Box::new(relay),
        strip,
        buzzer: Box::new(buzzer),
    };
    let handles = EmulatorHandles {
        reader: reader_handle,
        button: button_handle,
        relay: relay_handle,
        strip: strip_handle,
        buzzer: buzzer_handle,
    };
    Ok((peripherals, handles))
}

/// One console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Present(CardId),
    Remove,
    Press,
    Quit,
}

impl FromStr for ConsoleCommand {
    type Err = ServiceError;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let command = match (words.next(), words.next()) {
            (Some("present"), Some(card)) => {
                ConsoleCommand::Present(card.parse().map_err(|_| ServiceError::Console(line.to_string()))?)
            }
            (Some("remove"), None) => ConsoleCommand::Remove,
            (Some("press"), None) => ConsoleCommand::Press,
            (Some("quit"), None) => ConsoleCommand::Quit,
            _ => return Err(ServiceError::Console(line.to_string())),
        };
        if words.next().is_some() {
            return Err(ServiceError::Console(line.to_string()));
        }
        Ok(command)
    }
}

impl EmulatorHandles {
    /// Act out one console command.
    pub fn apply(&self, command: ConsoleCommand, cancel: &CancellationToken) {
        match command {
            ConsoleCommand::Present(card) => {
                info!("Presenting card {}", card);
                self.reader.present_card(card);
            }
            ConsoleCommand::Remove => {
                info!("Removing card");
                self.reader.remove_card();
            }
            ConsoleCommand::Press => {
                info!("Pressing button");
                self.button.press();
            }
            ConsoleCommand::Quit => {
                info!("Quit requested from console");
                cancel.cancel();
            }
        }
    }
}

/// Read console commands until end of input or cancellation.
pub async fn run_console<R: AsyncBufRead + Unpin>(input: R, handles: EmulatorHandles, cancel: CancellationToken) {
    let mut lines = input.lines();
    loop {
        let line = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line,
        };

        match line {
            Ok(Some(line)) if line.trim().is_empty() => {}
            Ok(Some(line)) => match line.parse::<ConsoleCommand>() {
                Ok(command) => handles.apply(command, &cancel),
                Err(e) => warn!("{} (try present <uid>, remove, press, quit)", e),
            },
            Ok(None) => {
                info!("Console input closed");
                break;
            }
            Err(e) => {
                warn!("Console read failed: {}", e);
                break;
            }
        }
    }
}
