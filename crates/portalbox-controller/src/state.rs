//! Access states of the equipment controller.
//!
//! # States
//!
//! - `Setup`: discovering the equipment identity and contacting the backend
//! - `IdleNoCard`: powered off, waiting for a card
//! - `IdleUnknownCard`: a card just arrived and is being dispatched
//! - `IdleUnauthorizedCard`: the card may not use this equipment
//! - `IdleCardLeftBehind`: a timed-out session's card is still in the reader
//! - `RunningAuthorizedUser`: powered on for the session owner
//! - `RunningProxy`: powered on for a proxy card in the owner's session
//! - `RunningTraining`: powered on for a trainee supervised by the owner
//! - `RunningNoCard`: the card was removed, grace period running
//! - `RunningTimedOut`: the equipment timeout elapsed, grace period running
//! - `AccessComplete`: the session is being closed
//! - `ShuttingDown`: terminal
//!
//! # Valid Transitions
//!
//! - Setup → IdleNoCard / ShuttingDown
//! - IdleNoCard → IdleUnknownCard → RunningAuthorizedUser / IdleUnauthorizedCard / ShuttingDown
//! - Running* → RunningNoCard / RunningTimedOut
//! - RunningNoCard / RunningTimedOut → Running* / AccessComplete
//! - RunningTimedOut → IdleCardLeftBehind → AccessComplete → IdleNoCard
//!
//! `IdleUnknownCard` and `AccessComplete` never persist across ticks: they
//! resolve in the same tick they are entered.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Every state of the equipment access flow.
///
/// Session data does not live in the variants; it is carried in a
/// [`SessionContext`](crate::SessionContext) threaded through
/// [`transition`](crate::transition).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessState {
    /// Identity discovery and backend connection.
    Setup,

    /// Waiting for a card.
    IdleNoCard,

    /// A card is present and is being classified.
    IdleUnknownCard,

    /// The presented card may not activate the equipment.
    IdleUnauthorizedCard,

    /// Power was cut after a timeout with the card still in the reader.
    IdleCardLeftBehind,

    /// Equipment powered for the authorized session owner.
    RunningAuthorizedUser,

    /// Equipment powered for a proxy card.
    RunningProxy,

    /// Equipment powered for a training card.
    RunningTraining,

    /// Card removed during a session; grace period running.
    RunningNoCard,

    /// Session timeout elapsed; grace period running.
    RunningTimedOut,

    /// Session is being closed.
    AccessComplete,

    /// Terminal state.
    ShuttingDown,
}

impl fmt::Display for AccessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            AccessState::Setup => "Setup",
            AccessState::IdleNoCard => "IdleNoCard",
            AccessState::IdleUnknownCard => "IdleUnknownCard",
            AccessState::IdleUnauthorizedCard => "IdleUnauthorizedCard",
            AccessState::IdleCardLeftBehind => "IdleCardLeftBehind",
            AccessState::RunningAuthorizedUser => "RunningAuthorizedUser",
            AccessState::RunningProxy => "RunningProxy",
            AccessState::RunningTraining => "RunningTraining",
            AccessState::RunningNoCard => "RunningNoCard",
            AccessState::RunningTimedOut => "RunningTimedOut",
            AccessState::AccessComplete => "AccessComplete",
            AccessState::ShuttingDown => "ShuttingDown",
        };
        write!(f, "{}", state_str)
    }
}

impl AccessState {
    /// All states, in declaration order.
    pub const ALL: [AccessState; 12] = [
        AccessState::Setup,
        AccessState::IdleNoCard,
        AccessState::IdleUnknownCard,
        AccessState::IdleUnauthorizedCard,
        AccessState::IdleCardLeftBehind,
        AccessState::RunningAuthorizedUser,
        AccessState::RunningProxy,
        AccessState::RunningTraining,
        AccessState::RunningNoCard,
        AccessState::RunningTimedOut,
        AccessState::AccessComplete,
        AccessState::ShuttingDown,
    ];

    /// Whether the equipment is powered for a card in this state.
    ///
    /// # Examples
    ///
    /// ```
    /// use portalbox_controller::AccessState;
    ///
    /// assert!(AccessState::RunningProxy.is_powered_session());
    /// assert!(!AccessState::RunningNoCard.is_powered_session());
    /// ```
    pub fn is_powered_session(&self) -> bool {
        matches!(
            self,
            AccessState::RunningAuthorizedUser | AccessState::RunningProxy | AccessState::RunningTraining
        )
    }

    /// Whether a grace period is running in this state.
    pub fn is_grace(&self) -> bool {
        matches!(self, AccessState::RunningNoCard | AccessState::RunningTimedOut)
    }

    /// Whether this state belongs to an open equipment session.
    ///
    /// A session is open from the first `Running*` entry until
    /// `AccessComplete`.
    pub fn in_session(&self) -> bool {
        self.is_powered_session() || self.is_grace() || *self == AccessState::IdleCardLeftBehind
    }

    /// States that always resolve in the tick they are entered.
    pub fn is_immediate(&self) -> bool {
        matches!(self, AccessState::IdleUnknownCard | AccessState::AccessComplete)
    }

    /// Whether no further transitions happen from this state.
    pub fn is_terminal(&self) -> bool {
        *self == AccessState::ShuttingDown
    }
}
