//! Errors of the badge box service.

use std::path::PathBuf;

use portalbox_backend::BackendError;
use portalbox_effects::CodecError;
use portalbox_hardware::HardwareError;

/// Result type alias for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Configuration file problems.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or a value has the wrong type.
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Errors that stop the service or one of its helpers.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Hardware(#[from] HardwareError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A driver's command stream broke off.
    #[error("Command stream failed: {0}")]
    Codec(#[from] CodecError),

    /// The box could not determine its MAC address.
    #[error("Identity discovery failed: {reason}")]
    Identity { reason: String },

    /// An emulator console line was not understood.
    #[error("Unknown console command: {0}")]
    Console(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    pub fn identity(reason: impl Into<String>) -> Self {
        Self::Identity {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_names_key() {
        let error = ConfigError::invalid("display.led_count", "must be at least 1");
        assert_eq!(
            error.to_string(),
            "Invalid value for display.led_count: must be at least 1"
        );
    }

    #[test]
    fn test_backend_error_is_transparent() {
        let error: ServiceError = BackendError::unreachable("timeout").into();
        assert_eq!(error.to_string(), "Backend unreachable: timeout");
    }
}
