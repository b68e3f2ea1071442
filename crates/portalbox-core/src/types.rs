use crate::{Result, error::Error};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// Proximity card identifier (4-byte UID, most significant byte first).
///
/// Zero is reserved for "no card" by the reader and is rejected.
///
/// # Security
/// Equality is constant-time so card comparisons during session
/// reclassification do not leak where two identifiers differ.
#[derive(Debug, Clone, Copy, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct CardId(u32);

impl CardId {
    /// Create a card id from its numeric value.
    ///
    /// # Errors
    /// Returns `Error::InvalidCardId` for zero.
    pub fn new(id: u32) -> Result<Self> {
        if id == 0 {
            return Err(Error::InvalidCardId("card id must be non-zero".to_string()));
        }
        Ok(CardId(id))
    }

    /// Build a card id from the 4 UID bytes returned by the reader's
    /// anticollision step.
    ///
    /// # Errors
    /// Returns `Error::InvalidCardId` if all bytes are zero.
    pub fn from_uid_bytes(uid: [u8; 4]) -> Result<Self> {
        CardId::new(u32::from_be_bytes(uid))
    }

    /// Raw numeric value.
    #[must_use]
    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// UID bytes, most significant first.
    #[must_use]
    pub fn uid_bytes(&self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    /// UID as uppercase hex, e.g. `04ABCDEF`.
    #[must_use]
    pub fn uid_hex(&self) -> String {
        format!("{:08X}", self.0)
    }
}

impl PartialEq for CardId {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_be_bytes().ct_eq(&other.0.to_be_bytes()).into()
    }
}

impl std::hash::Hash for CardId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CardId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let id = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => s.parse::<u32>(),
        }
        .map_err(|_| Error::InvalidCardId(s.to_string()))?;
        CardId::new(id)
    }
}

impl TryFrom<u32> for CardId {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        CardId::new(value)
    }
}

impl From<CardId> for u32 {
    fn from(id: CardId) -> Self {
        id.0
    }
}

/// Classification of a card as reported by the authorization backend.
///
/// `Invalid` is what a failed or unknown lookup produces; a present card
/// with this type is unauthorized, never "no card".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CardType {
    #[default]
    Invalid,
    Shutdown,
    Proxy,
    Training,
    User,
}

impl CardType {
    /// Backend integer code for this card type.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            CardType::Invalid => -1,
            CardType::Shutdown => 1,
            CardType::Proxy => 2,
            CardType::Training => 3,
            CardType::User => 4,
        }
    }

    /// Map a backend integer code to a card type. Unknown codes are `Invalid`.
    #[must_use]
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => CardType::Shutdown,
            2 => CardType::Proxy,
            3 => CardType::Training,
            4 => CardType::User,
            _ => CardType::Invalid,
        }
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            CardType::Invalid => "invalid",
            CardType::Shutdown => "shutdown",
            CardType::Proxy => "proxy",
            CardType::Training => "training",
            CardType::User => "user",
        };
        write!(f, "{s}")
    }
}

/// Authority of the card holder over the equipment type.
///
/// Ordered, so `level >= AuthorityLevel::Trainer` reads as expected.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum AuthorityLevel {
    #[default]
    None,
    User,
    Trainer,
    Admin,
}

impl AuthorityLevel {
    /// Numeric level (0=none, 1=user, 2=trainer, 3=admin).
    #[must_use]
    pub fn as_u8(&self) -> u8 {
        match self {
            AuthorityLevel::None => 0,
            AuthorityLevel::User => 1,
            AuthorityLevel::Trainer => 2,
            AuthorityLevel::Admin => 3,
        }
    }

    /// Whether this level may supervise a training card.
    #[must_use]
    pub fn can_train(&self) -> bool {
        *self >= AuthorityLevel::Trainer
    }
}

impl TryFrom<u8> for AuthorityLevel {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(AuthorityLevel::None),
            1 => Ok(AuthorityLevel::User),
            2 => Ok(AuthorityLevel::Trainer),
            3 => Ok(AuthorityLevel::Admin),
            other => Err(Error::InvalidAuthorityLevel(other)),
        }
    }
}

/// 24-bit color as used by the LED strip and the wire protocol.
///
/// Serialized as a `RRGGBB` hex string, the format used in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0x00, 0x00, 0x00);
    pub const RED: Rgb = Rgb::new(0xFF, 0x00, 0x00);
    pub const AMBER: Rgb = Rgb::new(0xFF, 0xFF, 0x00);
    pub const DARK_RED: Rgb = Rgb::new(0x10, 0x00, 0x00);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    #[must_use]
    pub fn is_black(&self) -> bool {
        *self == Rgb::BLACK
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl std::str::FromStr for Rgb {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(Error::InvalidColor(s.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| Error::InvalidColor(s.to_string()))
        };
        Ok(Rgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl TryFrom<String> for Rgb {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_string()
    }
}
