//! Card verdicts for the input snapshot.
//!
//! The reader reports the same card every tick while it rests in the box.
//! The backend is asked once, when the card id read changes, and the verdict
//! is reused until then. A failed lookup yields a denied verdict; the card
//! has to be presented again to retry.

use portalbox_backend::{AccessBackend, CardDetails};
use portalbox_controller::InputSnapshot;
use portalbox_core::{CardId, CardType};
use tracing::{debug, warn};

#[derive(Debug, Default)]
pub struct CardVerdicts {
    last: Option<(CardId, CardDetails)>,
}

impl CardVerdicts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot for the card read this tick. `button_pressed` is left
    /// unset.
    pub async fn snapshot<B: AccessBackend>(
        &mut self,
        card: Option<CardId>,
        backend: &B,
        equipment_type_id: i64,
    ) -> InputSnapshot {
        let Some(card) = card else {
            self.last = None;
            return InputSnapshot::no_card();
        };

        let details = match self.last {
            Some((cached, details)) if cached == card => details,
            _ => {
                let details = lookup(card, backend, equipment_type_id).await;
                self.last = Some((card, details));
                details
            }
        };

        InputSnapshot {
            card_id: Some(card),
            card_type: details.card_type,
            user_is_authorized: details.user_is_authorized,
            user_authority_level: details.user_authority_level,
            button_pressed: false,
        }
    }
}

async fn lookup<B: AccessBackend>(card: CardId, backend: &B, equipment_type_id: i64) -> CardDetails {
    let mut details = match backend.get_card_details(card, equipment_type_id).await {
        Ok(details) => details,
        Err(e) => {
            warn!("Card lookup for {} failed, treating it as unauthorized: {}", card, e);
            return CardDetails::denied();
        }
    };

    if details.card_type == CardType::Training {
        details.user_is_authorized = match backend.is_training_card_valid(card, equipment_type_id).await {
            Ok(valid) => valid,
            Err(e) => {
                warn!("Training card check for {} failed: {}", card, e);
                false
            }
        };
    }

    debug!(
        "Card {}: {} authorized={} authority={:?}",
        card, details.card_type, details.user_is_authorized, details.user_authority_level
    );
    details
}
