//! Per-tick input to the access state machine.

use portalbox_core::{AuthorityLevel, CardId, CardType};
use serde::{Deserialize, Serialize};

/// Everything the state machine sees in one tick.
///
/// Built once per control-loop iteration from the reader, the backend
/// verdict for the card and the button, and never mutated afterwards.
///
/// # Examples
///
/// ```
/// use portalbox_controller::InputSnapshot;
/// use portalbox_core::{AuthorityLevel, CardId, CardType};
///
/// let card = CardId::new(0x04AB_CDEF).unwrap();
/// let input = InputSnapshot::card(card, CardType::User).authorized(AuthorityLevel::User);
/// assert!(input.user_is_authorized);
/// assert!(!input.button_pressed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InputSnapshot {
    pub card_id: Option<CardId>,
    pub card_type: CardType,
    pub user_is_authorized: bool,
    pub user_authority_level: AuthorityLevel,
    /// Button pressed since the previous tick.
    pub button_pressed: bool,
}

impl InputSnapshot {
    /// No card in the reader.
    #[must_use]
    pub fn no_card() -> Self {
        Self::default()
    }

    /// A card of the given type, not yet authorized.
    #[must_use]
    pub fn card(card_id: CardId, card_type: CardType) -> Self {
        Self {
            card_id: Some(card_id),
            card_type,
            ..Self::default()
        }
    }

    /// Mark the card holder as authorized at `level`.
    #[must_use]
    pub fn authorized(mut self, level: AuthorityLevel) -> Self {
        self.user_is_authorized = true;
        self.user_authority_level = level;
        self
    }

    #[must_use]
    pub fn with_button(mut self) -> Self {
        self.button_pressed = true;
        self
    }

    #[must_use]
    pub fn has_card(&self) -> bool {
        self.card_id.is_some()
    }
}
