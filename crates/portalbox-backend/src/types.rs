//! Records exchanged with the authorization backend.

use std::fmt;
use std::str::FromStr;

use portalbox_core::{AuthorityLevel, CardId, CardType};
use serde::{Deserialize, Serialize};

use crate::error::BackendError;

/// Hardware address identifying a box.
///
/// Accepts `b8:27:eb:12:34:56`, `B8-27-EB-12-34-56` or `b827eb123456` and
/// normalizes to twelve lowercase hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress(String);

impl MacAddress {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for MacAddress {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: String = s
            .trim()
            .chars()
            .filter(|c| *c != ':' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        if digits.len() != 12 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(BackendError::InvalidMac(s.to_string()));
        }
        Ok(MacAddress(digits))
    }
}

impl TryFrom<String> for MacAddress {
    type Error = BackendError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The role assigned to a box: which equipment it controls and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentProfile {
    pub id: i64,
    pub mac_address: MacAddress,
    pub type_id: i64,
    pub type_name: String,
    pub location: String,
    /// Session time limit; `0` means unlimited.
    #[serde(default)]
    pub timeout_minutes: u32,
    #[serde(default)]
    pub allow_proxy: bool,
    /// Users need an authorization for this equipment type.
    #[serde(default = "default_true")]
    pub requires_training: bool,
    /// Users need a positive balance.
    #[serde(default)]
    pub requires_payment: bool,
}

fn default_true() -> bool {
    true
}

/// Authorization verdict for one card on one equipment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CardDetails {
    pub card_type: CardType,
    pub user_is_authorized: bool,
    pub user_authority_level: AuthorityLevel,
}

impl CardDetails {
    /// Verdict used when the backend cannot answer: an unauthorized,
    /// invalid card.
    #[must_use]
    pub fn denied() -> Self {
        Self::default()
    }
}

/// A person known to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub authority_level: AuthorityLevel,
    /// Equipment types the user is authorized for.
    #[serde(default)]
    pub authorizations: Vec<i64>,
    #[serde(default)]
    pub balance: f64,
}

impl UserRecord {
    /// A plain user with no authorizations and no balance.
    #[must_use]
    pub fn new(id: i64, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            authority_level: AuthorityLevel::User,
            authorizations: Vec::new(),
            balance: 0.0,
        }
    }
}

/// A card issued by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRecord {
    pub id: CardId,
    pub card_type: CardType,
    /// Holder of a user card.
    #[serde(default)]
    pub user_id: Option<i64>,
    /// Equipment types a training card is valid for.
    #[serde(default)]
    pub equipment_types: Vec<i64>,
}
