//! Collaborators of the PortalBox controller at their boundary.
//!
//! - [`AccessBackend`]: card lookups, authorization and usage logging
//! - [`Notifier`]: delivery of the left-card email composed by
//!   [`left_card_email`]
//!
//! [`InMemoryBackend`] serves a fixed [`Directory`] and records every log
//! call; it backs the emulated box and the test suites.
//!
//! # Example
//!
//! ```
//! use portalbox_backend::{AccessBackend, CardRecord, Directory, InMemoryBackend};
//! use portalbox_core::{CardId, CardType};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> portalbox_backend::Result<()> {
//! let card = CardId::new(0x1234).unwrap();
//! let backend = InMemoryBackend::new(Directory {
//!     cards: vec![CardRecord { id: card, card_type: CardType::Shutdown, user_id: None, equipment_types: vec![] }],
//!     ..Directory::default()
//! });
//!
//! assert_eq!(backend.get_card_type(card).await?, CardType::Shutdown);
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod error;
pub mod memory;
pub mod mock;
pub mod notify;
pub mod types;

pub use backend::AccessBackend;
pub use error::{BackendError, Result};
pub use memory::{BackendEvent, Directory, InMemoryBackend, RecordedEvent};
pub use notify::{Email, EmailSettings, LeftCardNotice, LogNotifier, Notifier, left_card_email};
pub use types::{CardDetails, CardRecord, EquipmentProfile, MacAddress, UserRecord};
