//! Light and sound effect workers.
//!
//! Each worker owns one peripheral and an engine, and runs a fixed-period
//! loop as a task in a shared [`JoinSet`]:
//!
//! ```text
//! ┌──────────────┐  LightCommand  ┌──────────────┐  frame  ┌──────────┐
//! │              │───────────────►│ light worker │────────►│ LedStrip │
//! │  controller  │                └──────────────┘         └──────────┘
//! │              │  SoundCommand  ┌──────────────┐  on/off ┌──────────┐
//! │              │───────────────►│ sound worker │────────►│ Buzzer   │
//! └──────────────┘                └──────────────┘         └──────────┘
//! ```
//!
//! Every tick a worker applies one queued command if there is one, and
//! otherwise advances the active effect. When cancelled, the light worker
//! leaves the strip dim dark red and the sound worker silences the buzzer.

use std::time::Duration;

use portalbox_core::constants::{LIGHT_TICK_MS, SOUND_TICK_MS};
use portalbox_hardware::{BuzzerOutput, LedStrip};
use tokio::task::JoinSet;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::channel::{CommandInbox, PeripheralChannel};
use crate::command::{LightCommand, SoundCommand};
use crate::light::LightEngine;
use crate::notes::read_song;
use crate::sound::BuzzerEngine;

/// Tick periods for the workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerConfig {
    pub light_tick: Duration,
    pub sound_tick: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            light_tick: Duration::from_millis(LIGHT_TICK_MS),
            sound_tick: Duration::from_millis(SOUND_TICK_MS),
        }
    }
}

/// Handle to the running light and sound workers.
#[derive(Debug)]
pub struct EffectWorkers {
    light: PeripheralChannel<LightCommand>,
    sound: PeripheralChannel<SoundCommand>,
    cancel: CancellationToken,
    tasks: JoinSet<()>,
}

impl EffectWorkers {
    /// Spawn both workers on the current runtime.
    ///
    /// The workers stop when `cancel` is cancelled or [`shutdown`] is called.
    ///
    /// [`shutdown`]: EffectWorkers::shutdown
    pub fn spawn(
        strip: Box<dyn LedStrip>,
        buzzer: Box<dyn BuzzerOutput>,
        config: WorkerConfig,
        cancel: CancellationToken,
    ) -> Self {
        let mut tasks = JoinSet::new();
        let light = spawn_light_worker(&mut tasks, strip, config.light_tick, cancel.clone());
        let sound = spawn_sound_worker(&mut tasks, buzzer, config.sound_tick, cancel.clone());
        Self {
            light,
            sound,
            cancel,
            tasks,
        }
    }

    #[must_use]
    pub fn light(&self) -> &PeripheralChannel<LightCommand> {
        &self.light
    }

    #[must_use]
    pub fn sound(&self) -> &PeripheralChannel<SoundCommand> {
        &self.sound
    }

    /// Wait until both workers have applied everything queued so far.
    pub async fn drain(&self) {
        self.light.drain().await;
        self.sound.drain().await;
    }

    /// Stop the workers and wait up to `grace` for them to finish.
    ///
    /// Workers still running after `grace` are aborted.
    pub async fn shutdown(mut self, grace: Duration) {
        self.cancel.cancel();

        let mut panic_count = 0;
        let mut cancelled_count = 0;
        let joined = tokio::time::timeout(grace, async {
            while let Some(result) = self.tasks.join_next().await {
                match classify_termination(&result) {
                    TaskTermination::Success => {}
                    TaskTermination::Panic => panic_count += 1,
                    TaskTermination::Cancelled => cancelled_count += 1,
                }
            }
        })
        .await;

        if joined.is_err() {
            warn!(
                "Effect workers did not stop within {:?}, aborting {} task(s)",
                grace,
                self.tasks.len()
            );
            self.tasks.abort_all();
            while self.tasks.join_next().await.is_some() {
                cancelled_count += 1;
            }
        }

        if panic_count > 0 {
            warn!("{} effect worker(s) panicked", panic_count);
        }
        debug!(
            "Effect workers stopped ({} cancelled, {} panicked)",
            cancelled_count, panic_count
        );
    }
}

/// Task termination classification for shutdown handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskTermination {
    Success,
    Panic,
    /// Aborted before finishing.
    Cancelled,
}

fn classify_termination(result: &Result<(), tokio::task::JoinError>) -> TaskTermination {
    match result {
        Ok(()) => TaskTermination::Success,
        Err(e) if e.is_cancelled() => TaskTermination::Cancelled,
        Err(_) => TaskTermination::Panic,
    }
}

/// Spawn a light worker into `tasks`.
pub fn spawn_light_worker(
    tasks: &mut JoinSet<()>,
    strip: Box<dyn LedStrip>,
    tick: Duration,
    cancel: CancellationToken,
) -> PeripheralChannel<LightCommand> {
    let (channel, inbox) = PeripheralChannel::new("light");
    let engine = LightEngine::with_tick(strip.len(), duration_ms(tick));
    tasks.spawn(run_light_worker(engine, strip, inbox, tick, cancel));
    channel
}

/// Spawn a sound worker into `tasks`.
pub fn spawn_sound_worker(
    tasks: &mut JoinSet<()>,
    buzzer: Box<dyn BuzzerOutput>,
    tick: Duration,
    cancel: CancellationToken,
) -> PeripheralChannel<SoundCommand> {
    let (channel, inbox) = PeripheralChannel::new("sound");
    let engine = BuzzerEngine::with_tick(duration_ms(tick));
    tasks.spawn(run_sound_worker(engine, buzzer, inbox, tick, cancel));
    channel
}

fn duration_ms(tick: Duration) -> u64 {
    u64::try_from(tick.as_millis()).unwrap_or(u64::MAX).max(1)
}

async fn run_light_worker(
    mut engine: LightEngine,
    mut strip: Box<dyn LedStrip>,
    mut inbox: CommandInbox<LightCommand>,
    tick: Duration,
    cancel: CancellationToken,
) {
    info!("Light effect worker started ({} pixels)", engine.len());
    show(&mut *strip, &engine);

    let mut ticker = interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        match inbox.try_next() {
            Some(command) => {
                debug!("Light command: {}", command);
                engine.apply(&command);
                show(&mut *strip, &engine);
                inbox.applied();
            }
            None => {
                engine.step();
                show(&mut *strip, &engine);
            }
        }
    }

    engine.last_gasp();
    show(&mut *strip, &engine);
    info!("Light effect worker stopped");
}

fn show(strip: &mut dyn LedStrip, engine: &LightEngine) {
    if let Err(e) = strip.show(engine.frame()) {
        warn!("Failed to update LED strip: {}", e);
    }
}

async fn run_sound_worker(
    mut engine: BuzzerEngine,
    mut buzzer: Box<dyn BuzzerOutput>,
    mut inbox: CommandInbox<SoundCommand>,
    tick: Duration,
    cancel: CancellationToken,
) {
    info!("Sound effect worker started");
    let mut ticker = interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        if let Some(command) = inbox.try_next() {
            debug!("Sound command: {}", command);
            let applied = match &command {
                SoundCommand::Sing {
                    file,
                    note_len_secs,
                    spacing_secs,
                } => read_song(file, *note_len_secs, *spacing_secs)
                    .await
                    .map(|steps| engine.sing(steps)),
                _ => engine.apply(&command),
            };
            if let Err(e) = applied {
                warn!("Ignoring sound command '{}': {}", command, e);
            }
            inbox.applied();
            continue;
        }

        let output = match engine.step() {
            Some(freq_hz) => buzzer.start(freq_hz),
            None => buzzer.stop(),
        };
        if let Err(e) = output {
            warn!("Failed to drive buzzer: {}", e);
        }
    }

    engine.silence();
    if let Err(e) = buzzer.stop() {
        warn!("Failed to silence buzzer: {}", e);
    }
    info!("Sound effect worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_classify_termination() {
        let mut tasks = JoinSet::new();

        tasks.spawn(async {});
        let finished = tasks.join_next().await.unwrap();
        assert_eq!(classify_termination(&finished), TaskTermination::Success);

        tasks.spawn(async { panic!("worker failure") });
        let panicked = tasks.join_next().await.unwrap();
        assert_eq!(classify_termination(&panicked), TaskTermination::Panic);

        tasks.spawn(std::future::pending::<()>());
        tasks.abort_all();
        let aborted = tasks.join_next().await.unwrap();
        assert_eq!(classify_termination(&aborted), TaskTermination::Cancelled);
    }
}
