//! The badge box service.
//!
//! ```text
//!            ┌──────────── every tick (100 ms) ────────────┐
//!            ▼                                              │
//! reader ─► CardVerdicts ─► InputSnapshot ─► AccessStateMachine
//! button ─────────────────────────┘                │
//!                                                   ▼
//!                               [SideEffect] ─► relay, light, sound,
//!                                               backend log, email
//! ```
//!
//! The service owns the state machine and runs on the caller's task. It
//! stops when the machine reaches `ShuttingDown` (shutdown card, failed
//! setup) or when the cancellation token fires.

use std::time::Duration;

use portalbox_backend::{AccessBackend, BackendError, EquipmentProfile, LeftCardNotice, Notifier, UserRecord, left_card_email};
use portalbox_controller::{AccessStateMachine, InputSnapshot, NotificationMode, SideEffect, Step};
use portalbox_core::CardId;
use portalbox_hardware::CardRead;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::cards::CardVerdicts;
use crate::config::ServiceConfig;
use crate::error::Result;
use crate::facade::{HardwareFacade, Peripherals};
use crate::identity;
use crate::watchdog::Activity;

/// Time the effect workers get to apply queued commands and render their
/// final state.
const WORKER_SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Why [`PortalBoxService::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownCause {
    /// The cancellation token fired (signal or console).
    Interrupted,
    /// A shutdown card was presented.
    ShutdownCard,
    /// The box could not determine its identity.
    SetupFailed,
}

pub struct PortalBoxService<B, N> {
    config: ServiceConfig,
    backend: B,
    notifier: N,
    facade: HardwareFacade,
    machine: AccessStateMachine,
    verdicts: CardVerdicts,
    equipment: Option<EquipmentProfile>,
    cancel: CancellationToken,
}

impl<B: AccessBackend, N: Notifier> PortalBoxService<B, N> {
    /// Assemble a service. Effect workers start immediately; nothing else
    /// happens until [`run`](Self::run).
    pub fn new(
        config: ServiceConfig,
        backend: B,
        notifier: N,
        peripherals: Peripherals,
        cancel: CancellationToken,
    ) -> Self {
        let facade = HardwareFacade::new(peripherals, &config);
        let machine = AccessStateMachine::new(config.controller_config(None));
        Self {
            config,
            backend,
            notifier,
            facade,
            machine,
            verdicts: CardVerdicts::new(),
            equipment: None,
            cancel,
        }
    }

    pub fn machine(&self) -> &AccessStateMachine {
        &self.machine
    }

    /// Run until shutdown, then stop the effect workers.
    pub async fn run(mut self) -> ShutdownCause {
        info!("PortalBox service starting");
        let effects = self.machine.start();
        self.execute(effects).await;

        let cause = match self.setup().await {
            Ok(()) => self.control_loop().await,
            Err(cause) => cause,
        };

        if cause == ShutdownCause::Interrupted {
            self.facade.watchdog().record(Activity::ServiceInterrupt);
        }
        info!("Service exiting ({:?})", cause);
        self.facade.watchdog().record(Activity::ServiceExit);
        self.facade.watchdog().set_running(false);
        self.facade.shutdown(WORKER_SHUTDOWN_GRACE).await;
        cause
    }

    /// Discover the equipment profile and leave `Setup`.
    async fn setup(&mut self) -> std::result::Result<(), ShutdownCause> {
        match self.discover_profile().await {
            Ok(Some(profile)) => {
                info!(
                    "Discovered identity. Type: {}({}) Location: {} Timeout: {} m",
                    profile.type_name, profile.type_id, profile.location, profile.timeout_minutes
                );
                if let Err(e) = self.backend.log_started(profile.id).await {
                    warn!("Failed to log start: {}", e);
                }
                self.machine.set_config(self.config.controller_config(Some(&profile)));
                self.equipment = Some(profile);
                let step = self.machine.complete_setup(now());
                self.apply(step).await;
                Ok(())
            }
            Ok(None) => {
                info!("Shutdown requested before an identity was found");
                let step = self.machine.abort_setup(now());
                self.apply(step).await;
                Err(ShutdownCause::Interrupted)
            }
            Err(e) => {
                error!("Cannot start: {}", e);
                let step = self.machine.abort_setup(now());
                self.apply(step).await;
                Err(ShutdownCause::SetupFailed)
            }
        }
    }

    /// Ask the backend for this box's profile, retrying while the box is
    /// not registered.
    ///
    /// Returns `Ok(None)` if cancelled first. Any other backend error ends
    /// setup.
    async fn discover_profile(&self) -> Result<Option<EquipmentProfile>> {
        let mac = identity::mac_address(&self.config.identity)?;
        info!("Looking up equipment profile for {}", mac);

        loop {
            match self.backend.get_equipment_profile(&mac).await {
                Ok(profile) => return Ok(Some(profile)),
                Err(e @ BackendError::NotRegistered { .. }) => warn!(
                    "No equipment profile yet ({}), retrying in {}s",
                    e, self.config.timing.identity_retry_secs
                ),
                Err(e) => return Err(e.into()),
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(None),
                _ = tokio::time::sleep(self.config.timing.identity_retry()) => {}
            }
        }
    }

    async fn control_loop(&mut self) -> ShutdownCause {
        let mut ticker = interval(self.config.timing.tick());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    info!("Shutdown requested");
                    let step = self.machine.shutdown(now());
                    self.apply(step).await;
                    return ShutdownCause::Interrupted;
                }
                _ = ticker.tick() => {}
            }

            let Some(input) = self.read_inputs().await else {
                continue;
            };

            let step = self.machine.tick(&input, now());
            if self.apply(step).await {
                return ShutdownCause::ShutdownCard;
            }
        }
    }

    /// Build this tick's input snapshot.
    ///
    /// A hung reader runs the alert loop until cancelled and yields `None`.
    async fn read_inputs(&mut self) -> Option<InputSnapshot> {
        let card = match self.facade.read_card().await {
            CardRead::Card(card) => Some(card),
            CardRead::NoCard => None,
            CardRead::Hung(reason) => {
                self.facade.alert_loop(reason, &self.cancel).await;
                return None;
            }
        };

        let type_id = self.equipment.as_ref()?.type_id;
        let mut input = self.verdicts.snapshot(card, &self.backend, type_id).await;
        input.button_pressed = self.facade.button_pressed_since_last_check();
        Some(input)
    }

    /// Log the step and execute its side effects. Returns whether the
    /// machine asked the process to exit.
    async fn apply(&mut self, step: Step) -> bool {
        if step.changed() {
            debug!(
                "State transition: {} ({})",
                step.state,
                step.path.iter().map(ToString::to_string).collect::<Vec<_>>().join(" -> ")
            );
        }
        self.execute(step.effects).await
    }

    async fn execute(&mut self, effects: Vec<SideEffect>) -> bool {
        let mut exit = false;
        for effect in effects {
            trace!("Side effect: {}", effect);
            match effect {
                SideEffect::SetPower(on) => self.facade.set_power(on),
                SideEffect::Light(command) => self.facade.send_light(command),
                SideEffect::Sound(command) => self.facade.send_sound(command),
                SideEffect::LogAccessAttempt { card, success } => {
                    if let Some(id) = self.equipment_id() {
                        if let Err(e) = self.backend.log_access_attempt(card, id, success).await {
                            warn!("Failed to log access attempt for {}: {}", card, e);
                        }
                    }
                }
                SideEffect::LogAccessCompletion { card } => {
                    if let Some(id) = self.equipment_id() {
                        if let Err(e) = self.backend.log_access_completion(card, id).await {
                            warn!("Failed to log access completion for {}: {}", card, e);
                        }
                    }
                }
                SideEffect::LogShutdown { card } => match self.equipment_id() {
                    Some(id) => {
                        if let Err(e) = self.backend.log_shutdown(id, card).await {
                            warn!("Failed to log shutdown: {}", e);
                        }
                    }
                    None => debug!("No equipment profile, shutdown not logged"),
                },
                SideEffect::EmailCardLeftBehind(mode) => self.email_card_left_behind(mode).await,
                SideEffect::Exit => exit = true,
            }
        }
        exit
    }

    fn equipment_id(&self) -> Option<i64> {
        self.equipment.as_ref().map(|e| e.id)
    }

    async fn email_card_left_behind(&self, mode: NotificationMode) {
        let Some(equipment) = &self.equipment else {
            return;
        };

        let email = match mode {
            NotificationMode::SingleUser { user } => {
                let Some(user) = self.user(user).await else { return };
                left_card_email(&LeftCardNotice::SingleUser { user: &user }, equipment, &self.config.email)
            }
            NotificationMode::Proxy { user, .. } => {
                let Some(user) = self.user(user).await else { return };
                left_card_email(&LeftCardNotice::Proxy { user: &user }, equipment, &self.config.email)
            }
            NotificationMode::TrainerAndTrainee { trainer, trainee } => {
                let Some(trainer) = self.user(trainer).await else { return };
                let trainee = self.backend.get_user(trainee).await.ok();
                left_card_email(
                    &LeftCardNotice::TrainerAndTrainee {
                        trainer: &trainer,
                        trainee: trainee.as_ref(),
                    },
                    equipment,
                    &self.config.email,
                )
            }
        };

        debug!("Mailing {}", email.to.join(", "));
        if let Err(e) = self.notifier.send(&email).await {
            error!("Failed to send left-card email: {}", e);
        }
    }

    async fn user(&self, card: CardId) -> Option<UserRecord> {
        match self.backend.get_user(card).await {
            Ok(user) => Some(user),
            Err(e) => {
                warn!("Cannot email the holder of card {}: {}", card, e);
                None
            }
        }
    }
}

fn now() -> std::time::Instant {
    Instant::now().into_std()
}
