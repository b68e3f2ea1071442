//! In-memory backend for the emulated box and for tests.
//!
//! The directory is loaded once (typically from the `[backend]` section of
//! the service configuration). Log calls are recorded as [`BackendEvent`]s
//! so tests can assert on what the controller reported.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use portalbox_core::{CardId, CardType};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::backend::AccessBackend;
use crate::error::{BackendError, Result};
use crate::types::{CardDetails, CardRecord, EquipmentProfile, MacAddress, UserRecord};

/// Everything the in-memory backend knows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Directory {
    pub equipment: Vec<EquipmentProfile>,
    pub cards: Vec<CardRecord>,
    pub users: Vec<UserRecord>,
}

impl Directory {
    fn card(&self, id: CardId) -> Option<&CardRecord> {
        self.cards.iter().find(|card| card.id == id)
    }

    fn equipment_type(&self, type_id: i64) -> Option<&EquipmentProfile> {
        self.equipment.iter().find(|e| e.type_id == type_id)
    }

    fn holder(&self, card: CardId) -> Option<&UserRecord> {
        let user_id = self.card(card)?.user_id?;
        self.users.iter().find(|user| user.id == user_id)
    }

    /// Authorization rules of the equipment type: a required training means
    /// an authorization for the type, a required payment means a positive
    /// balance.
    fn is_authorized(&self, user: &UserRecord, type_id: i64) -> bool {
        let (requires_training, requires_payment) = self
            .equipment_type(type_id)
            .map_or((true, false), |e| (e.requires_training, e.requires_payment));

        let trained = !requires_training || user.authorizations.contains(&type_id);
        let paid = !requires_payment || user.balance > 0.0;
        trained && paid
    }
}

/// A log call recorded by [`InMemoryBackend`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum BackendEvent {
    Started {
        equipment_id: i64,
    },
    AccessAttempt {
        card: CardId,
        equipment_id: i64,
        success: bool,
    },
    AccessCompletion {
        card: CardId,
        equipment_id: i64,
    },
    Shutdown {
        equipment_id: i64,
        card: Option<CardId>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    pub event: BackendEvent,
    pub at: DateTime<Utc>,
}

/// [`AccessBackend`] over a fixed [`Directory`].
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    directory: Directory,
    events: Mutex<Vec<RecordedEvent>>,
    unreachable: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl InMemoryBackend {
    pub fn new(directory: Directory) -> Self {
        Self {
            directory,
            events: Mutex::new(Vec::new()),
            unreachable: AtomicBool::new(false),
        }
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// Simulate a network outage: every call fails until reset.
    pub fn set_reachable(&self, reachable: bool) {
        self.unreachable.store(!reachable, Ordering::Release);
    }

    /// Log calls received so far, oldest first.
    pub fn events(&self) -> Vec<BackendEvent> {
        lock(&self.events).iter().map(|r| r.event.clone()).collect()
    }

    pub fn recorded(&self) -> Vec<RecordedEvent> {
        lock(&self.events).clone()
    }

    fn check_reachable(&self) -> Result<()> {
        if self.unreachable.load(Ordering::Acquire) {
            return Err(BackendError::unreachable("in-memory backend set offline"));
        }
        Ok(())
    }

    fn record(&self, event: BackendEvent) -> Result<()> {
        self.check_reachable()?;
        info!("Backend event: {:?}", event);
        lock(&self.events).push(RecordedEvent { event, at: Utc::now() });
        Ok(())
    }
}

impl AccessBackend for InMemoryBackend {
    async fn get_equipment_profile(&self, mac: &MacAddress) -> Result<EquipmentProfile> {
        self.check_reachable()?;
        debug!("Looking up equipment profile for {}", mac);
        self.directory
            .equipment
            .iter()
            .find(|e| e.mac_address == *mac)
            .cloned()
            .ok_or_else(|| BackendError::NotRegistered { mac: mac.to_string() })
    }

    async fn get_card_type(&self, card: CardId) -> Result<CardType> {
        self.check_reachable()?;
        Ok(self.directory.card(card).map_or(CardType::Invalid, |c| c.card_type))
    }

    async fn get_card_details(&self, card: CardId, equipment_type_id: i64) -> Result<CardDetails> {
        self.check_reachable()?;
        let Some(record) = self.directory.card(card) else {
            return Ok(CardDetails::denied());
        };

        let mut details = CardDetails {
            card_type: record.card_type,
            ..CardDetails::default()
        };
        if let Some(user) = self.directory.holder(card) {
            details.user_authority_level = user.authority_level;
            details.user_is_authorized = self.directory.is_authorized(user, equipment_type_id);
        }
        Ok(details)
    }

    async fn is_training_card_valid(&self, card: CardId, equipment_type_id: i64) -> Result<bool> {
        self.check_reachable()?;
        Ok(self
            .directory
            .card(card)
            .is_some_and(|c| c.card_type == CardType::Training && c.equipment_types.contains(&equipment_type_id)))
    }

    async fn log_access_attempt(&self, card: CardId, equipment_id: i64, success: bool) -> Result<()> {
        self.record(BackendEvent::AccessAttempt {
            card,
            equipment_id,
            success,
        })
    }

    async fn log_access_completion(&self, card: CardId, equipment_id: i64) -> Result<()> {
        self.record(BackendEvent::AccessCompletion { card, equipment_id })
    }

    async fn log_started(&self, equipment_id: i64) -> Result<()> {
        self.record(BackendEvent::Started { equipment_id })
    }

    async fn log_shutdown(&self, equipment_id: i64, card: Option<CardId>) -> Result<()> {
        self.record(BackendEvent::Shutdown { equipment_id, card })
    }

    async fn get_user(&self, card: CardId) -> Result<UserRecord> {
        self.check_reachable()?;
        if self.directory.card(card).is_none() {
            return Err(BackendError::UnknownCard { card });
        }
        self.directory
            .holder(card)
            .cloned()
            .ok_or(BackendError::UnknownUser { card })
    }
}

