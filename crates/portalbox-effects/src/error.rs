//! Error types for effect commands, channels and song files.

use thiserror::Error;

/// A command line or typed command the engines refuse.
///
/// Rejected commands never change engine state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Unknown command: {token}")]
    Unknown { token: String },

    #[error("Empty command")]
    Empty,

    #[error("{command}: expected {expected} arguments, got {found}")]
    ArgumentCount {
        command: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{command}: invalid {name} '{value}'")]
    InvalidArgument {
        command: &'static str,
        name: &'static str,
        value: String,
    },
}

impl CommandError {
    /// Error number reported by driver processes: 1 for an unrecognized
    /// command, 2 for bad arguments.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            CommandError::Unknown { .. } | CommandError::Empty => 1,
            CommandError::ArgumentCount { .. } | CommandError::InvalidArgument { .. } => 2,
        }
    }

    pub(crate) fn invalid(command: &'static str, name: &'static str, value: impl Into<String>) -> Self {
        CommandError::InvalidArgument {
            command,
            name,
            value: value.into(),
        }
    }
}

/// Failure to hand a command to a worker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("{peripheral} effect worker is not running")]
    Closed { peripheral: &'static str },

    #[error(transparent)]
    Rejected(#[from] CommandError),
}

impl ChannelError {
    /// Error number for driver replies; a stopped worker reports 3.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            ChannelError::Closed { .. } => 3,
            ChannelError::Rejected(e) => e.code(),
        }
    }
}

/// Song file problems. The song is not started.
#[derive(Debug, Error)]
pub enum SongError {
    #[error("Cannot read song file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: malformed note '{text}'")]
    Malformed { line: usize, text: String },

    #[error("Line {line}: unknown note '{note}'")]
    UnknownNote { line: usize, note: String },
}

/// Stream-level failures of the command line codec.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Command line exceeds {max} bytes")]
    LineTooLong { max: usize },
}
