//! The access state machine.
//!
//! [`transition`] is a pure function of the current state, the session, one
//! [`InputSnapshot`], the current instant and the configuration. It returns a
//! [`Step`]: the new state and session, the side effects to execute in order,
//! and the path of states entered.
//!
//! A tick may pass through several states. After each entry the new state's
//! rule is evaluated again with the same input, so a card swap can close one
//! session and open the next within one tick:
//!
//! ```text
//! RunningAuthorizedUser ─card B─► RunningNoCard ─► AccessComplete ─► IdleNoCard
//!                                                   ─► IdleUnknownCard ─► RunningAuthorizedUser
//! ```
//!
//! # Examples
//!
//! ```
//! use std::time::Instant;
//! use portalbox_controller::{AccessState, AccessStateMachine, ControllerConfig, InputSnapshot, SideEffect};
//! use portalbox_core::{AuthorityLevel, CardId, CardType};
//!
//! let now = Instant::now();
//! let mut machine = AccessStateMachine::new(ControllerConfig::default());
//! machine.complete_setup(now);
//! assert_eq!(machine.state(), AccessState::IdleNoCard);
//!
//! let card = CardId::new(42).unwrap();
//! let step = machine.tick(&InputSnapshot::card(card, CardType::User).authorized(AuthorityLevel::User), now);
//! assert_eq!(step.path, vec![AccessState::IdleUnknownCard, AccessState::RunningAuthorizedUser]);
//! assert_eq!(step.effects[0], SideEffect::SetPower(true));
//! ```
//!
//! # Builder Pattern
//!
//! ```
//! use portalbox_controller::{AccessState, AccessStateMachine};
//!
//! let machine = AccessStateMachine::builder()
//!     .with_initial_state(AccessState::IdleNoCard)
//!     .build();
//! assert_eq!(machine.state(), AccessState::IdleNoCard);
//! ```

use std::collections::VecDeque;
use std::time::Instant;

use chrono::{DateTime, Utc};
use portalbox_core::CardType;
use portalbox_core::constants::MAX_TRANSITIONS_PER_TICK;
use portalbox_effects::{LightCommand, SoundCommand};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ControllerConfig;
use crate::effects::SideEffect;
use crate::input::InputSnapshot;
use crate::reclassify::reclassify;
use crate::session::SessionContext;
use crate::state::AccessState;

/// Maximum number of state transitions to keep in history.
///
/// A session passes through five or six states, so this covers the last
/// fifteen or so sessions.
const MAX_HISTORY_SIZE: usize = 100;

/// Stops a grace beep without touching a song or tone.
const STOP_BEEP: SoundCommand = SoundCommand::Stop {
    song: false,
    tone: false,
    beep: true,
};

/// Result of one call to [`transition`].
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// State after the tick.
    pub state: AccessState,
    pub session: SessionContext,
    /// Side effects to execute, in order.
    pub effects: Vec<SideEffect>,
    /// States entered during the tick, in order. Empty if nothing changed.
    pub path: Vec<AccessState>,
}

impl Step {
    fn start(state: AccessState, session: SessionContext) -> Self {
        Self {
            state,
            session,
            effects: Vec::new(),
            path: Vec::new(),
        }
    }

    /// Whether the tick changed state.
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.path.is_empty()
    }

    /// Whether the tick passed through `state`.
    #[must_use]
    pub fn visited(&self, state: AccessState) -> bool {
        self.path.contains(&state)
    }

    /// Evaluate rules until the state settles.
    fn settle(&mut self, input: &InputSnapshot, now: Instant, config: &ControllerConfig) {
        for _ in 0..MAX_TRANSITIONS_PER_TICK {
            match next_state(self.state, &self.session, input, now, config) {
                Some(target) => self.enter(target, input, now, config),
                None => return,
            }
        }
        warn!(
            "State machine did not settle within {} transitions, stopping in {}",
            MAX_TRANSITIONS_PER_TICK, self.state
        );
    }

    /// Leave the current state and run the entry actions of `target`.
    fn enter(&mut self, target: AccessState, input: &InputSnapshot, now: Instant, config: &ControllerConfig) {
        debug!("State transition: {} -> {}", self.state, target);

        if self.state.is_grace() {
            self.session.grace_start = None;
            if config.grace_beep.is_some() && !target.is_grace() {
                self.effects.push(SideEffect::Sound(STOP_BEEP));
            }
        }

        self.state = target;
        self.path.push(target);
        self.on_enter(input, now, config);
    }

    fn on_enter(&mut self, input: &InputSnapshot, now: Instant, config: &ControllerConfig) {
        let colors = &config.colors;
        let session = &mut self.session;
        let effects = &mut self.effects;

        match self.state {
            AccessState::Setup => {
                effects.push(SideEffect::Light(config.setup_wipe()));
            }
            AccessState::IdleNoCard => {
                effects.push(SideEffect::Light(LightCommand::Pulse {
                    rgb: colors.sleep_color,
                }));
            }
            AccessState::IdleUnknownCard => {}
            AccessState::IdleUnauthorizedCard => {
                effects.push(SideEffect::Light(config.flash(colors.unauth_color)));
                if let Some(card) = input.card_id {
                    effects.push(SideEffect::LogAccessAttempt { card, success: false });
                }
            }
            AccessState::RunningAuthorizedUser | AccessState::RunningProxy | AccessState::RunningTraining => {
                let Some(card) = input.card_id else {
                    return;
                };
                let color = match self.state {
                    AccessState::RunningAuthorizedUser => {
                        if session.authorized_card_id != Some(card) {
                            session.authorized_card_id = Some(card);
                            session.user_authority_level = input.user_authority_level;
                        }
                        session.proxy_card_id = None;
                        session.training_card_id = None;
                        colors.auth_color
                    }
                    AccessState::RunningProxy => {
                        session.proxy_card_id = Some(card);
                        session.training_card_id = None;
                        colors.proxy_color
                    }
                    _ => {
                        session.training_card_id = Some(card);
                        session.proxy_card_id = None;
                        colors.training_color
                    }
                };
                session.session_start.get_or_insert(now);
                session.timeout_start = Some(now);

                effects.push(SideEffect::SetPower(true));
                effects.push(SideEffect::Light(LightCommand::Color { rgb: color }));
                effects.push(SideEffect::LogAccessAttempt { card, success: true });
                if let Some(chirp) = config.chirp() {
                    effects.push(SideEffect::Sound(chirp));
                }
            }
            AccessState::RunningNoCard | AccessState::RunningTimedOut => {
                session.grace_start = Some(now);
                let color = if self.state == AccessState::RunningNoCard {
                    colors.no_card_grace_color
                } else {
                    colors.grace_timeout_color
                };
                effects.push(SideEffect::Light(config.flash(color)));
                if let Some(beep) = &config.grace_beep {
                    effects.push(SideEffect::Sound(beep.command()));
                }
            }
            AccessState::IdleCardLeftBehind => {
                effects.push(SideEffect::SetPower(false));
                if let Some(mode) = session.notification_mode() {
                    effects.push(SideEffect::EmailCardLeftBehind(mode));
                }
                effects.push(SideEffect::Light(LightCommand::Color {
                    rgb: colors.timeout_color,
                }));
            }
            AccessState::AccessComplete => {
                if let Some(card) = session.authorized_card_id {
                    effects.push(SideEffect::LogAccessCompletion { card });
                }
                effects.push(SideEffect::SetPower(false));
                session.reset();
            }
            AccessState::ShuttingDown => {
                effects.push(SideEffect::SetPower(false));
                effects.push(SideEffect::Light(LightCommand::Stop));
                let card = (input.card_type == CardType::Shutdown)
                    .then_some(input.card_id)
                    .flatten();
                effects.push(SideEffect::LogShutdown { card });
                effects.push(SideEffect::Exit);
            }
        }
    }
}

/// The rule of `state`: where to go given this input, if anywhere.
fn next_state(
    state: AccessState,
    session: &SessionContext,
    input: &InputSnapshot,
    now: Instant,
    config: &ControllerConfig,
) -> Option<AccessState> {
    match state {
        AccessState::Setup | AccessState::ShuttingDown => None,
        AccessState::IdleNoCard => input.has_card().then_some(AccessState::IdleUnknownCard),
        AccessState::IdleUnknownCard => Some(dispatch_card(input)),
        AccessState::IdleUnauthorizedCard | AccessState::IdleCardLeftBehind => {
            if input.has_card() {
                None
            } else if state == AccessState::IdleCardLeftBehind {
                Some(AccessState::AccessComplete)
            } else {
                Some(AccessState::IdleNoCard)
            }
        }
        AccessState::RunningAuthorizedUser | AccessState::RunningProxy | AccessState::RunningTraining => {
            let expected = match state {
                AccessState::RunningAuthorizedUser => session.authorized_card_id,
                AccessState::RunningProxy => session.proxy_card_id,
                _ => session.training_card_id,
            };
            if input.card_id.is_none() || input.card_id != expected {
                Some(AccessState::RunningNoCard)
            } else if session.timed_out(config.timeout(), now) {
                Some(AccessState::RunningTimedOut)
            } else {
                None
            }
        }
        AccessState::RunningNoCard => {
            if input.has_card() {
                Some(reclassify(session, input, config).target())
            } else if input.button_pressed || grace_expired(session, config.grace_period, now) {
                Some(AccessState::AccessComplete)
            } else {
                None
            }
        }
        AccessState::RunningTimedOut => {
            if !input.has_card() {
                Some(AccessState::AccessComplete)
            } else if input.button_pressed {
                Some(reclassify(session, input, config).target())
            } else if grace_expired(session, config.timeout_grace_period, now) {
                Some(AccessState::IdleCardLeftBehind)
            } else {
                None
            }
        }
        AccessState::AccessComplete => Some(AccessState::IdleNoCard),
    }
}

/// Classify a freshly presented card outside of a session.
fn dispatch_card(input: &InputSnapshot) -> AccessState {
    match (input.card_id, input.card_type) {
        (None, _) => AccessState::IdleNoCard,
        (Some(_), CardType::Shutdown) => AccessState::ShuttingDown,
        (Some(_), CardType::User) if input.user_is_authorized => AccessState::RunningAuthorizedUser,
        (Some(_), _) => AccessState::IdleUnauthorizedCard,
    }
}

fn grace_expired(session: &SessionContext, grace: std::time::Duration, now: Instant) -> bool {
    session.grace_elapsed(now).is_some_and(|elapsed| elapsed >= grace)
}

/// Advance the state machine by one tick.
///
/// Deterministic: the same arguments always produce the same [`Step`].
#[must_use]
pub fn transition(
    state: AccessState,
    session: SessionContext,
    input: &InputSnapshot,
    now: Instant,
    config: &ControllerConfig,
) -> Step {
    let mut step = Step::start(state, session);
    step.settle(input, now, config);
    step
}

/// Move to `target` regardless of the current state's rule, then settle.
///
/// Used for events that do not come from the input snapshot: setup
/// completion or failure, and a shutdown request. Terminal states are never
/// left.
#[must_use]
pub fn force(
    state: AccessState,
    session: SessionContext,
    target: AccessState,
    input: &InputSnapshot,
    now: Instant,
    config: &ControllerConfig,
) -> Step {
    let mut step = Step::start(state, session);
    if state.is_terminal() {
        return step;
    }
    step.enter(target, input, now, config);
    step.settle(input, now, config);
    step
}

/// One recorded state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: AccessState,
    pub to: AccessState,
    /// Wall-clock time of the change.
    pub at: DateTime<Utc>,
}

/// Stateful wrapper around [`transition`] with a bounded history.
///
/// Not thread-safe; the control loop owns it.
#[derive(Debug, Clone)]
pub struct AccessStateMachine {
    state: AccessState,
    session: SessionContext,
    config: ControllerConfig,
    history: VecDeque<StateTransition>,
}

impl AccessStateMachine {
    /// Create a machine in `Setup`.
    pub fn new(config: ControllerConfig) -> Self {
        Self::builder().with_config(config).build()
    }

    pub fn builder() -> AccessStateMachineBuilder {
        AccessStateMachineBuilder::default()
    }

    pub fn state(&self) -> AccessState {
        self.state
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Replace the configuration, e.g. once the equipment profile is known.
    pub fn set_config(&mut self, config: ControllerConfig) {
        self.config = config;
    }

    pub fn is_terminated(&self) -> bool {
        self.state.is_terminal()
    }

    /// Entry actions of the current state, for the first render after
    /// construction.
    pub fn start(&self) -> Vec<SideEffect> {
        let mut step = Step::start(self.state, self.session.clone());
        step.on_enter(&InputSnapshot::no_card(), Instant::now(), &self.config);
        step.effects
    }

    /// Run one control tick.
    pub fn tick(&mut self, input: &InputSnapshot, now: Instant) -> Step {
        let step = transition(self.state, self.session.clone(), input, now, &self.config);
        self.apply(&step);
        step
    }

    /// Setup succeeded: go to `IdleNoCard`.
    pub fn complete_setup(&mut self, now: Instant) -> Step {
        self.force(AccessState::IdleNoCard, &InputSnapshot::no_card(), now)
    }

    /// Setup failed: go to `ShuttingDown`.
    pub fn abort_setup(&mut self, now: Instant) -> Step {
        self.force(AccessState::ShuttingDown, &InputSnapshot::no_card(), now)
    }

    /// Shut down from any state, e.g. on a termination signal.
    pub fn shutdown(&mut self, now: Instant) -> Step {
        self.force(AccessState::ShuttingDown, &InputSnapshot::no_card(), now)
    }

    fn force(&mut self, target: AccessState, input: &InputSnapshot, now: Instant) -> Step {
        let step = force(self.state, self.session.clone(), target, input, now, &self.config);
        self.apply(&step);
        step
    }

    fn apply(&mut self, step: &Step) {
        let at = Utc::now();
        let mut from = self.state;
        for to in &step.path {
            self.add_to_history(StateTransition { from, to: *to, at });
            from = *to;
        }
        self.state = step.state;
        self.session = step.session.clone();
    }

    /// Recent transitions, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// The last `count` transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<StateTransition> {
        let skip = self.history.len().saturating_sub(count);
        self.history.iter().skip(skip).cloned().collect()
    }

    fn add_to_history(&mut self, transition: StateTransition) {
        self.history.push_back(transition);
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
    }
}

impl Default for AccessStateMachine {
    fn default() -> Self {
        Self::new(ControllerConfig::default())
    }
}

/// Builder for [`AccessStateMachine`], mostly for tests and recovery.
#[derive(Debug)]
pub struct AccessStateMachineBuilder {
    initial_state: AccessState,
    session: SessionContext,
    config: ControllerConfig,
    history: VecDeque<StateTransition>,
}

impl AccessStateMachineBuilder {
    pub fn with_initial_state(mut self, state: AccessState) -> Self {
        self.initial_state = state;
        self
    }

    pub fn with_session(mut self, session: SessionContext) -> Self {
        self.session = session;
        self
    }

    pub fn with_config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_history(mut self, history: VecDeque<StateTransition>) -> Self {
        self.history = history;
        self
    }

    pub fn build(self) -> AccessStateMachine {
        AccessStateMachine {
            state: self.initial_state,
            session: self.session,
            config: self.config,
            history: self.history,
        }
    }
}

impl Default for AccessStateMachineBuilder {
    fn default() -> Self {
        Self {
            initial_state: AccessState::Setup,
            session: SessionContext::default(),
            config: ControllerConfig::default(),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BeepPattern;
    use portalbox_core::{AuthorityLevel, CardId};
    use std::time::Duration;

    fn card(id: u32) -> CardId {
        CardId::new(id).unwrap()
    }

    fn user(id: u32) -> InputSnapshot {
        InputSnapshot::card(card(id), CardType::User).authorized(AuthorityLevel::User)
    }

    fn running(owner: u32, now: Instant) -> AccessStateMachine {
        let mut machine = AccessStateMachine::builder()
            .with_initial_state(AccessState::IdleNoCard)
            .build();
        machine.tick(&user(owner), now);
        machine
    }

    #[test]
    fn test_start_renders_setup_wipe() {
        let machine = AccessStateMachine::default();
        let effects = machine.start();
        assert!(matches!(effects.as_slice(), [SideEffect::Light(LightCommand::Wipe { .. })]));
    }

    #[test]
    fn test_setup_ignores_input() {
        let now = Instant::now();
        let mut machine = AccessStateMachine::default();
        let step = machine.tick(&user(1), now);
        assert!(!step.changed());
        assert_eq!(machine.state(), AccessState::Setup);
    }

    #[test]
    fn test_abort_setup_shuts_down() {
        let mut machine = AccessStateMachine::default();
        let step = machine.abort_setup(Instant::now());
        assert_eq!(machine.state(), AccessState::ShuttingDown);
        assert_eq!(
            step.effects,
            vec![
                SideEffect::SetPower(false),
                SideEffect::Light(LightCommand::Stop),
                SideEffect::LogShutdown { card: None },
                SideEffect::Exit,
            ]
        );
        assert!(machine.is_terminated());

        // terminal
        let step = machine.shutdown(Instant::now());
        assert!(!step.changed());
        assert!(step.effects.is_empty());
    }

    #[test]
    fn test_shutdown_card_logs_its_id() {
        let now = Instant::now();
        let mut machine = AccessStateMachine::builder()
            .with_initial_state(AccessState::IdleNoCard)
            .build();
        let step = machine.tick(&InputSnapshot::card(card(9), CardType::Shutdown), now);
        assert_eq!(step.path, vec![AccessState::IdleUnknownCard, AccessState::ShuttingDown]);
        assert!(step.effects.contains(&SideEffect::LogShutdown { card: Some(card(9)) }));
        assert_eq!(step.effects.last(), Some(&SideEffect::Exit));
    }

    #[test]
    fn test_invalid_card_is_unauthorized() {
        let now = Instant::now();
        let mut machine = AccessStateMachine::builder()
            .with_initial_state(AccessState::IdleNoCard)
            .build();
        let step = machine.tick(&InputSnapshot::card(card(5), CardType::Invalid), now);
        assert_eq!(machine.state(), AccessState::IdleUnauthorizedCard);
        assert!(step.effects.contains(&SideEffect::LogAccessAttempt {
            card: card(5),
            success: false
        }));

        // stays while the card is present, leaves on removal
        assert!(!machine.tick(&InputSnapshot::card(card(5), CardType::Invalid), now).changed());
        machine.tick(&InputSnapshot::no_card(), now);
        assert_eq!(machine.state(), AccessState::IdleNoCard);
    }

    #[test]
    fn test_unauthorized_user_and_stray_proxy_are_refused() {
        let now = Instant::now();
        for input in [
            InputSnapshot::card(card(5), CardType::User),
            InputSnapshot::card(card(5), CardType::Proxy),
            InputSnapshot::card(card(5), CardType::Training).authorized(AuthorityLevel::None),
        ] {
            let mut machine = AccessStateMachine::builder()
                .with_initial_state(AccessState::IdleNoCard)
                .build();
            machine.tick(&input, now);
            assert_eq!(machine.state(), AccessState::IdleUnauthorizedCard, "{:?}", input);
        }
    }

    #[test]
    fn test_repeated_input_does_not_relog_attempt() {
        let now = Instant::now();
        let mut machine = running(1, now);
        for i in 1..20 {
            let step = machine.tick(&user(1), now + Duration::from_millis(100 * i));
            assert!(step.effects.is_empty());
        }
        assert_eq!(machine.state(), AccessState::RunningAuthorizedUser);
    }

    #[test]
    fn test_timeout_then_left_behind() {
        let now = Instant::now();
        let config = ControllerConfig {
            timeout_minutes: 1,
            ..ControllerConfig::default()
        };
        let mut machine = AccessStateMachine::builder()
            .with_initial_state(AccessState::IdleNoCard)
            .with_config(config)
            .build();
        machine.tick(&user(1), now);

        machine.tick(&user(1), now + Duration::from_secs(59));
        assert_eq!(machine.state(), AccessState::RunningAuthorizedUser);

        machine.tick(&user(1), now + Duration::from_secs(60));
        assert_eq!(machine.state(), AccessState::RunningAuthorizedUser);

        machine.tick(&user(1), now + Duration::from_secs(61));
        assert_eq!(machine.state(), AccessState::RunningTimedOut);

        let step = machine.tick(&user(1), now + Duration::from_secs(91));
        assert_eq!(machine.state(), AccessState::IdleCardLeftBehind);
        assert_eq!(step.effects[0], SideEffect::SetPower(false));
        assert!(matches!(step.effects[1], SideEffect::EmailCardLeftBehind(_)));

        let step = machine.tick(&InputSnapshot::no_card(), now + Duration::from_secs(120));
        assert_eq!(step.path, vec![AccessState::AccessComplete, AccessState::IdleNoCard]);
        assert!(step.effects.contains(&SideEffect::LogAccessCompletion { card: card(1) }));
        assert!(machine.session().is_empty());
    }

    #[test]
    fn test_button_in_timeout_grace_resumes_session() {
        let now = Instant::now();
        let config = ControllerConfig {
            timeout_minutes: 1,
            ..ControllerConfig::default()
        };
        let mut machine = AccessStateMachine::builder()
            .with_initial_state(AccessState::IdleNoCard)
            .with_config(config)
            .build();
        machine.tick(&user(1), now);
        machine.tick(&user(1), now + Duration::from_secs(61));
        assert_eq!(machine.state(), AccessState::RunningTimedOut);

        let resumed = now + Duration::from_secs(65);
        machine.tick(&user(1).with_button(), resumed);
        assert_eq!(machine.state(), AccessState::RunningAuthorizedUser);
        assert_eq!(machine.session().timeout_start, Some(resumed));
        assert_eq!(machine.session().session_start, Some(now));
    }

    #[test]
    fn test_card_removed_during_timeout_grace_completes() {
        let now = Instant::now();
        let config = ControllerConfig {
            timeout_minutes: 1,
            ..ControllerConfig::default()
        };
        let mut machine = AccessStateMachine::builder()
            .with_initial_state(AccessState::IdleNoCard)
            .with_config(config)
            .build();
        machine.tick(&user(1), now);
        machine.tick(&user(1), now + Duration::from_secs(61));

        let step = machine.tick(&InputSnapshot::no_card(), now + Duration::from_secs(62));
        assert_eq!(step.path, vec![AccessState::AccessComplete, AccessState::IdleNoCard]);
    }

    #[test]
    fn test_button_ends_grace_early() {
        let now = Instant::now();
        let mut machine = running(1, now);
        machine.tick(&InputSnapshot::no_card(), now);
        assert_eq!(machine.state(), AccessState::RunningNoCard);

        let step = machine.tick(&InputSnapshot::no_card().with_button(), now + Duration::from_millis(100));
        assert_eq!(step.path, vec![AccessState::AccessComplete, AccessState::IdleNoCard]);
    }

    #[test]
    fn test_card_swap_opens_new_session_in_one_tick() {
        let now = Instant::now();
        let mut machine = running(1, now);
        let step = machine.tick(&user(2), now + Duration::from_secs(1));
        assert_eq!(
            step.path,
            vec![
                AccessState::RunningNoCard,
                AccessState::AccessComplete,
                AccessState::IdleNoCard,
                AccessState::IdleUnknownCard,
                AccessState::RunningAuthorizedUser,
            ]
        );
        assert!(step.effects.contains(&SideEffect::LogAccessCompletion { card: card(1) }));
        assert_eq!(machine.session().authorized_card_id, Some(card(2)));
    }

    #[test]
    fn test_grace_beep_starts_and_stops() {
        let now = Instant::now();
        let beep = BeepPattern::default();
        let config = ControllerConfig {
            grace_beep: Some(beep),
            ..ControllerConfig::default()
        };
        let mut machine = AccessStateMachine::builder()
            .with_initial_state(AccessState::IdleNoCard)
            .with_config(config)
            .build();
        machine.tick(&user(1), now);

        let step = machine.tick(&InputSnapshot::no_card(), now);
        assert!(step.effects.contains(&SideEffect::Sound(beep.command())));

        let step = machine.tick(&user(1), now + Duration::from_millis(500));
        assert_eq!(step.effects[0], SideEffect::Sound(STOP_BEEP));
        assert_eq!(machine.state(), AccessState::RunningAuthorizedUser);
        assert_eq!(machine.session().grace_start, None);
    }

    #[test]
    fn test_power_on_chirp() {
        let now = Instant::now();
        let config = ControllerConfig {
            power_on_chirp: true,
            ..ControllerConfig::default()
        };
        let mut machine = AccessStateMachine::builder()
            .with_initial_state(AccessState::IdleNoCard)
            .with_config(config)
            .build();
        let step = machine.tick(&user(1), now);
        assert!(matches!(step.effects.last(), Some(SideEffect::Sound(SoundCommand::Tone { .. }))));
    }

    #[test]
    fn test_history_records_each_state_and_is_bounded() {
        let now = Instant::now();
        let mut machine = AccessStateMachine::default();
        machine.complete_setup(now);
        machine.tick(&user(1), now);

        let recorded: Vec<_> = machine.history().iter().map(|t| (t.from, t.to)).collect();
        assert_eq!(
            recorded,
            vec![
                (AccessState::Setup, AccessState::IdleNoCard),
                (AccessState::IdleNoCard, AccessState::IdleUnknownCard),
                (AccessState::IdleUnknownCard, AccessState::RunningAuthorizedUser),
            ]
        );
        assert_eq!(machine.last_transitions(1)[0].to, AccessState::RunningAuthorizedUser);

        for i in 0..200 {
            let input = if i % 2 == 0 { InputSnapshot::no_card() } else { user(1) };
            machine.tick(&input, now);
        }
        assert_eq!(machine.history().len(), MAX_HISTORY_SIZE);
    }
}
