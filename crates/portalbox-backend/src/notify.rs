#![allow(async_fn_in_trait)]

//! Left-card notifications.
//!
//! When a timed-out session leaves a card in the reader, the session owner
//! is emailed. The text depends on how the session ended up:
//!
//! | Session | Template |
//! |---|---|
//! | owner only | single user |
//! | owner handed over to a proxy card | proxy |
//! | trainer supervising a training card | trainer and trainee |

use portalbox_core::constants::LEFT_CARD_SUBJECT;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::types::{EquipmentProfile, UserRecord};

/// Sender settings for outgoing email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailSettings {
    pub from_address: String,
    pub reply_to: Option<String>,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            from_address: "portalbox@localhost".to_string(),
            reply_to: None,
        }
    }
}

/// A composed email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub from: String,
    pub to: Vec<String>,
    pub reply_to: Option<String>,
    pub subject: String,
    pub body: String,
}

/// Who left which kind of card behind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LeftCardNotice<'a> {
    SingleUser {
        user: &'a UserRecord,
    },
    Proxy {
        user: &'a UserRecord,
    },
    TrainerAndTrainee {
        trainer: &'a UserRecord,
        /// Training cards are not always issued to a named person.
        trainee: Option<&'a UserRecord>,
    },
}

impl LeftCardNotice<'_> {
    fn body(&self, equipment: &EquipmentProfile) -> String {
        let (kind, location) = (&equipment.type_name, &equipment.location);
        match self {
            LeftCardNotice::SingleUser { user } => format!(
                "{} it appears you left your access card in a badge box for the {} in the {}",
                user.name, kind, location
            ),
            LeftCardNotice::Proxy { user } => format!(
                "{} it appears a proxy card was left in a badge box for the {} in the {} during your session",
                user.name, kind, location
            ),
            LeftCardNotice::TrainerAndTrainee { trainer, trainee } => format!(
                "{} and {} it appears a training card was left in a badge box for the {} in the {}",
                trainer.name,
                trainee.map_or("your trainee", |t| t.name.as_str()),
                kind,
                location
            ),
        }
    }

    fn recipients(&self) -> Vec<String> {
        match self {
            LeftCardNotice::SingleUser { user } | LeftCardNotice::Proxy { user } => vec![user.email.clone()],
            LeftCardNotice::TrainerAndTrainee { trainer, trainee } => std::iter::once(trainer.email.clone())
                .chain(trainee.map(|t| t.email.clone()))
                .collect(),
        }
    }
}

/// Compose the left-card email for `notice`.
///
/// # Examples
///
/// ```
/// use portalbox_backend::{EmailSettings, EquipmentProfile, LeftCardNotice, UserRecord, left_card_email};
///
/// let equipment = EquipmentProfile {
///     id: 1,
///     mac_address: "b827eb000001".parse().unwrap(),
///     type_id: 2,
///     type_name: "Band Saw".to_string(),
///     location: "Wood Shop".to_string(),
///     timeout_minutes: 0,
///     allow_proxy: false,
///     requires_training: true,
///     requires_payment: false,
/// };
/// let user = UserRecord::new(1, "Ada", "ada@example.edu");
///
/// let email = left_card_email(&LeftCardNotice::SingleUser { user: &user }, &equipment, &EmailSettings::default());
/// assert_eq!(email.subject, "Access Card left in PortalBox");
/// assert_eq!(
///     email.body,
///     "Ada it appears you left your access card in a badge box for the Band Saw in the Wood Shop"
/// );
/// ```
#[must_use]
pub fn left_card_email(notice: &LeftCardNotice<'_>, equipment: &EquipmentProfile, sender: &EmailSettings) -> Email {
    Email {
        from: sender.from_address.clone(),
        to: notice.recipients(),
        reply_to: sender.reply_to.clone(),
        subject: LEFT_CARD_SUBJECT.to_string(),
        body: notice.body(equipment),
    }
}

/// Outgoing email delivery.
pub trait Notifier: Send + Sync {
    async fn send(&self, email: &Email) -> Result<()>;
}

/// Notifier that only writes the email to the log.
///
/// Used by the emulated box, where no mail relay is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn send(&self, email: &Email) -> Result<()> {
        info!("Email to {}: {}: {}", email.to.join(", "), email.subject, email.body);
        Ok(())
    }
}
