//! Errors reported by the authorization backend and the notifier.

use portalbox_core::CardId;

/// Result type alias for backend operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Errors that can occur talking to the backend or delivering email.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The backend could not be reached or did not answer.
    #[error("Backend unreachable: {reason}")]
    Unreachable { reason: String },

    /// No equipment is registered for this box.
    #[error("No equipment registered for MAC address {mac}")]
    NotRegistered { mac: String },

    /// The card is not known to the backend.
    #[error("Unknown card: {card}")]
    UnknownCard { card: CardId },

    /// The card is not linked to a user.
    #[error("No user for card {card}")]
    UnknownUser { card: CardId },

    /// A MAC address could not be parsed.
    #[error("Invalid MAC address: {0}")]
    InvalidMac(String),

    /// Email delivery failed.
    #[error("Email delivery failed: {reason}")]
    Delivery { reason: String },
}

impl BackendError {
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self::Unreachable {
            reason: reason.into(),
        }
    }

    pub fn delivery(reason: impl Into<String>) -> Self {
        Self::Delivery {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreachable_message() {
        let error = BackendError::unreachable("connection refused");
        assert!(matches!(error, BackendError::Unreachable { .. }));
        assert_eq!(error.to_string(), "Backend unreachable: connection refused");
    }

    #[test]
    fn test_not_registered_message() {
        let error = BackendError::NotRegistered {
            mac: "b827eb000001".to_string(),
        };
        assert_eq!(error.to_string(), "No equipment registered for MAC address b827eb000001");
    }
}
