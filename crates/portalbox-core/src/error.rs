use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Card errors
    #[error("Invalid card id: {0}")]
    InvalidCardId(String),

    #[error("Invalid authority level: {0}")]
    InvalidAuthorityLevel(u8),

    // Display errors
    #[error("Invalid color: {0}")]
    InvalidColor(String),
}

pub type Result<T> = std::result::Result<T, Error>;
