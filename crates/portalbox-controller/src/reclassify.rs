//! Card reclassification during a grace period.
//!
//! When a card is presented while a session is in `RunningNoCard` (or in
//! `RunningTimedOut` with the button pressed) the rules below are tried in
//! order and the first match decides the next state.
//!
//! | # | Condition | Result |
//! |---|---|---|
//! | 1 | card equals the session owner's card | `RunningAuthorizedUser` |
//! | 2 | proxy card, proxy allowed, no training card in the session | `RunningProxy` |
//! | 3 | eligible training card, owner can train, no proxy card in the session | `RunningTraining` |
//! | 4 | anything else | close the session, then dispatch the card |
//!
//! Rules 2 and 3 exclude each other symmetrically: a session that has
//! switched to proxy cannot switch to training and vice versa. Earlier
//! versions of the box were not consistent about this.

use portalbox_core::CardType;
use serde::{Deserialize, Serialize};

use crate::config::ControllerConfig;
use crate::input::InputSnapshot;
use crate::session::SessionContext;
use crate::state::AccessState;

/// Outcome of reclassifying a presented card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reclassification {
    ResumeOwner,
    Proxy,
    Training,
    CloseSession,
}

impl Reclassification {
    /// State entered for this outcome.
    #[must_use]
    pub fn target(&self) -> AccessState {
        match self {
            Reclassification::ResumeOwner => AccessState::RunningAuthorizedUser,
            Reclassification::Proxy => AccessState::RunningProxy,
            Reclassification::Training => AccessState::RunningTraining,
            Reclassification::CloseSession => AccessState::AccessComplete,
        }
    }
}

type Condition = fn(&SessionContext, &InputSnapshot, &ControllerConfig) -> bool;

struct Rule {
    outcome: Reclassification,
    applies: Condition,
}

const RULES: [Rule; 3] = [
    Rule {
        outcome: Reclassification::ResumeOwner,
        applies: is_owner_card,
    },
    Rule {
        outcome: Reclassification::Proxy,
        applies: is_usable_proxy,
    },
    Rule {
        outcome: Reclassification::Training,
        applies: is_usable_training,
    },
];

fn is_owner_card(session: &SessionContext, input: &InputSnapshot, _: &ControllerConfig) -> bool {
    input.card_id.is_some() && input.card_id == session.authorized_card_id
}

fn is_usable_proxy(session: &SessionContext, input: &InputSnapshot, config: &ControllerConfig) -> bool {
    input.card_type == CardType::Proxy && config.allow_proxy && session.training_card_id.is_none()
}

fn is_usable_training(session: &SessionContext, input: &InputSnapshot, _: &ControllerConfig) -> bool {
    input.card_type == CardType::Training
        && input.user_is_authorized
        && session.user_authority_level.can_train()
        && session.proxy_card_id.is_none()
}

/// Classify the card in `input` against the open session.
///
/// # Examples
///
/// ```
/// use portalbox_controller::{ControllerConfig, InputSnapshot, Reclassification, SessionContext, reclassify};
/// use portalbox_core::{CardId, CardType};
///
/// let owner = CardId::new(1).unwrap();
/// let session = SessionContext { authorized_card_id: Some(owner), ..SessionContext::default() };
/// let input = InputSnapshot::card(owner, CardType::User);
///
/// assert_eq!(reclassify(&session, &input, &ControllerConfig::default()), Reclassification::ResumeOwner);
/// ```
#[must_use]
pub fn reclassify(session: &SessionContext, input: &InputSnapshot, config: &ControllerConfig) -> Reclassification {
    if input.card_id.is_none() {
        return Reclassification::CloseSession;
    }
    RULES
        .iter()
        .find(|rule| (rule.applies)(session, input, config))
        .map_or(Reclassification::CloseSession, |rule| rule.outcome)
}
