//! Shared vocabulary of the PortalBox crates: card and color types plus the
//! timing and register constants of the box.

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Crate version, logged at startup.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
