//! Side effects requested by the state machine.
//!
//! The transition function never touches hardware or the backend. It returns
//! an ordered list of [`SideEffect`]s and the service executes them in that
//! order. A failing side effect is logged and skipped; none is retried.

use std::fmt;

use portalbox_core::CardId;
use portalbox_effects::{LightCommand, SoundCommand};
use serde::{Deserialize, Serialize};

/// Which left-card email template to use, with the cards it mentions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum NotificationMode {
    SingleUser { user: CardId },
    Proxy { user: CardId, proxy: CardId },
    TrainerAndTrainee { trainer: CardId, trainee: CardId },
}

impl NotificationMode {
    /// Card whose owner receives the email.
    #[must_use]
    pub fn recipient(&self) -> CardId {
        match self {
            NotificationMode::SingleUser { user } | NotificationMode::Proxy { user, .. } => *user,
            NotificationMode::TrainerAndTrainee { trainer, .. } => *trainer,
        }
    }
}

/// One action for the service to perform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideEffect {
    /// Switch the equipment relay.
    SetPower(bool),
    /// Send a command to the light worker.
    Light(LightCommand),
    /// Send a command to the sound worker.
    Sound(SoundCommand),
    LogAccessAttempt { card: CardId, success: bool },
    LogAccessCompletion { card: CardId },
    LogShutdown { card: Option<CardId> },
    EmailCardLeftBehind(NotificationMode),
    /// Stop the process.
    Exit,
}

impl fmt::Display for SideEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SideEffect::SetPower(on) => write!(f, "power {}", if *on { "on" } else { "off" }),
            SideEffect::Light(command) => write!(f, "light '{}'", command),
            SideEffect::Sound(command) => write!(f, "sound '{}'", command),
            SideEffect::LogAccessAttempt { card, success } => {
                write!(f, "log attempt card={} success={}", card, success)
            }
            SideEffect::LogAccessCompletion { card } => write!(f, "log completion card={}", card),
            SideEffect::LogShutdown { card: Some(card) } => write!(f, "log shutdown card={}", card),
            SideEffect::LogShutdown { card: None } => write!(f, "log shutdown"),
            SideEffect::EmailCardLeftBehind(mode) => {
                write!(f, "email card left behind to {}", mode.recipient())
            }
            SideEffect::Exit => write!(f, "exit"),
        }
    }
}
