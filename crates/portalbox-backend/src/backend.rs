#![allow(async_fn_in_trait)]

use portalbox_core::{CardId, CardType};

use crate::error::Result;
use crate::types::{CardDetails, EquipmentProfile, MacAddress, UserRecord};

/// The authorization and usage-logging service a box reports to.
///
/// Every call may fail transiently. Callers treat a failed authorization
/// query as "not authorized" and a failed log call as dropped; nothing is
/// retried internally.
///
/// # Implementation Note
///
/// This trait uses native async trait methods (Edition 2024), so it is
/// used through generics rather than `dyn`.
pub trait AccessBackend: Send + Sync {
    /// Equipment profile assigned to the box with this MAC address.
    async fn get_equipment_profile(&self, mac: &MacAddress) -> Result<EquipmentProfile>;

    /// Card type; unknown cards are `CardType::Invalid`.
    async fn get_card_type(&self, card: CardId) -> Result<CardType>;

    /// Card type, authorization and authority for one equipment type.
    async fn get_card_details(&self, card: CardId, equipment_type_id: i64) -> Result<CardDetails>;

    /// Whether a training card may be used on this equipment type.
    async fn is_training_card_valid(&self, card: CardId, equipment_type_id: i64) -> Result<bool>;

    async fn log_access_attempt(&self, card: CardId, equipment_id: i64, success: bool) -> Result<()>;

    async fn log_access_completion(&self, card: CardId, equipment_id: i64) -> Result<()>;

    /// The box came online.
    async fn log_started(&self, equipment_id: i64) -> Result<()>;

    /// The box is going down, optionally because of a shutdown card.
    async fn log_shutdown(&self, equipment_id: i64, card: Option<CardId>) -> Result<()>;

    /// Holder of a user card.
    async fn get_user(&self, card: CardId) -> Result<UserRecord>;
}
