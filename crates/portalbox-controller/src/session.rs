//! Data that persists across states within one equipment session.

use std::time::{Duration, Instant};

use portalbox_core::{AuthorityLevel, CardId};

use crate::effects::NotificationMode;

/// Session bookkeeping owned by the access state machine.
///
/// At most one of `proxy_card_id` and `training_card_id` is set, and
/// `authorized_card_id` is set for as long as the equipment is powered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionContext {
    /// Card of the session owner.
    pub authorized_card_id: Option<CardId>,
    pub proxy_card_id: Option<CardId>,
    pub training_card_id: Option<CardId>,
    /// Authority of the session owner over this equipment type.
    pub user_authority_level: AuthorityLevel,
    /// First powered entry of the session.
    pub session_start: Option<Instant>,
    /// Start of the running grace period, if any.
    pub grace_start: Option<Instant>,
    /// Start of the equipment timeout, restarted on each powered entry.
    pub timeout_start: Option<Instant>,
}

impl SessionContext {
    /// Forget everything about the current session.
    pub fn reset(&mut self) {
        *self = SessionContext::default();
    }

    /// Whether no card is attached to the context.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.authorized_card_id.is_none()
            && self.proxy_card_id.is_none()
            && self.training_card_id.is_none()
            && self.user_authority_level == AuthorityLevel::None
    }

    /// Time since the grace period started.
    #[must_use]
    pub fn grace_elapsed(&self, now: Instant) -> Option<Duration> {
        self.grace_start.map(|start| now.saturating_duration_since(start))
    }

    /// Whether the equipment timeout has elapsed.
    ///
    /// Elapsed means strictly longer than `timeout`. A `timeout` of `None`
    /// never elapses.
    #[must_use]
    pub fn timed_out(&self, timeout: Option<Duration>, now: Instant) -> bool {
        match (timeout, self.timeout_start) {
            (Some(limit), Some(start)) => now.saturating_duration_since(start) > limit,
            _ => false,
        }
    }

    /// Which left-card template applies to this session, if it has an owner.
    #[must_use]
    pub fn notification_mode(&self) -> Option<NotificationMode> {
        let user = self.authorized_card_id?;
        let mode = match (self.training_card_id, self.proxy_card_id) {
            (Some(trainee), _) => NotificationMode::TrainerAndTrainee {
                trainer: user,
                trainee,
            },
            (None, Some(proxy)) => NotificationMode::Proxy { user, proxy },
            (None, None) => NotificationMode::SingleUser { user },
        };
        Some(mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: u32) -> CardId {
        CardId::new(id).unwrap()
    }

    #[test]
    fn test_reset_clears_everything() {
        let now = Instant::now();
        let mut session = SessionContext {
            authorized_card_id: Some(card(1)),
            proxy_card_id: Some(card(2)),
            training_card_id: None,
            user_authority_level: AuthorityLevel::Trainer,
            session_start: Some(now),
            grace_start: Some(now),
            timeout_start: Some(now),
        };
        assert!(!session.is_empty());
        session.reset();
        assert!(session.is_empty());
        assert_eq!(session, SessionContext::default());
    }

    #[test]
    fn test_timed_out() {
        let start = Instant::now();
        let session = SessionContext {
            timeout_start: Some(start),
            ..SessionContext::default()
        };
        let limit = Some(Duration::from_secs(60));
        assert!(!session.timed_out(limit, start + Duration::from_secs(59)));
        assert!(!session.timed_out(limit, start + Duration::from_secs(60)));
        assert!(session.timed_out(limit, start + Duration::from_millis(60_100)));
        assert!(!session.timed_out(None, start + Duration::from_secs(86_400)));
    }

    #[test]
    fn test_notification_mode() {
        let mut session = SessionContext::default();
        assert_eq!(session.notification_mode(), None);

        session.authorized_card_id = Some(card(1));
        assert_eq!(
            session.notification_mode(),
            Some(NotificationMode::SingleUser { user: card(1) })
        );

        session.proxy_card_id = Some(card(2));
        assert_eq!(
            session.notification_mode(),
            Some(NotificationMode::Proxy {
                user: card(1),
                proxy: card(2)
            })
        );

        session.proxy_card_id = None;
        session.training_card_id = Some(card(3));
        assert_eq!(
            session.notification_mode(),
            Some(NotificationMode::TrainerAndTrainee {
                trainer: card(1),
                trainee: card(3)
            })
        );
    }
}
