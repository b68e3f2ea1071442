//! Errors of the box peripherals.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// The device stopped answering.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// The reader saw a card but the anticollision or select step failed.
    /// Usually transient; the next poll retries.
    #[error("Card read error: {message}")]
    CardRead { message: String },

    /// A frame does not match the strip length.
    #[error("Frame has {found} pixels, strip has {expected}")]
    FrameLength { expected: usize, found: usize },

    /// Bad peripheral settings (strip length, color order, hang signature).
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// SPI, GPIO or device node I/O.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    pub fn card_read(message: impl Into<String>) -> Self {
        Self::CardRead {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Check a frame against the strip length.
    pub fn check_frame(expected: usize, found: usize) -> Result<()> {
        if expected == found {
            Ok(())
        } else {
            Err(Self::FrameLength { expected, found })
        }
    }
}
