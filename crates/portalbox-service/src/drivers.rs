//! Standalone effect drivers.
//!
//! Before the effect workers moved in-process, light and sound ran as
//! separate driver processes fed one command per line on standard input.
//! These drivers keep that wire form alive for bench testing a strip or a
//! buzzer by hand:
//!
//! ```text
//! $ portalbox light-driver --leds 15
//! color 255 0 0
//! blink 0 0 255 500 3
//! sparkle
//! errno 1
//! ```
//!
//! Accepted lines go to a worker. A rejected line is answered with
//! `errno N` on the output (1 unknown command, 2 bad arguments, 3 worker
//! gone). End of input or cancellation stops the worker, which renders its
//! final state: dim dark red for the strip, silence for the buzzer.

use std::str::FromStr;
use std::time::Duration;

use futures::StreamExt;
use portalbox_core::constants::{LIGHT_TICK_MS, SOUND_TICK_MS};
use portalbox_effects::worker::{spawn_light_worker, spawn_sound_worker};
use portalbox_effects::{CommandError, EffectLineCodec, PeripheralChannel};
use portalbox_hardware::{BuzzerOutput, LedStrip};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinSet;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::Result;

/// Time the worker gets to finish queued commands after input ends.
const DRIVER_STOP_GRACE: Duration = Duration::from_secs(2);

/// Drive `strip` from light command lines on `input`.
///
/// # Errors
///
/// Returns an error if `input` or `output` fails, or a line is too long.
pub async fn run_light_driver<R, W>(
    input: R,
    output: W,
    strip: Box<dyn LedStrip>,
    cancel: CancellationToken,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("Light driver ready ({} pixels)", strip.len());
    let worker_cancel = CancellationToken::new();
    let mut tasks = JoinSet::new();
    let channel = spawn_light_worker(
        &mut tasks,
        strip,
        Duration::from_millis(LIGHT_TICK_MS),
        worker_cancel.clone(),
    );

    let result = forward_lines(input, output, &channel, &cancel).await;
    stop_worker(&channel, tasks, worker_cancel).await;
    result
}

/// Drive `buzzer` from sound command lines on `input`.
///
/// # Errors
///
/// Returns an error if `input` or `output` fails, or a line is too long.
pub async fn run_sound_driver<R, W>(
    input: R,
    output: W,
    buzzer: Box<dyn BuzzerOutput>,
    cancel: CancellationToken,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("Sound driver ready");
    let worker_cancel = CancellationToken::new();
    let mut tasks = JoinSet::new();
    let channel = spawn_sound_worker(
        &mut tasks,
        buzzer,
        Duration::from_millis(SOUND_TICK_MS),
        worker_cancel.clone(),
    );

    let result = forward_lines(input, output, &channel, &cancel).await;
    stop_worker(&channel, tasks, worker_cancel).await;
    result
}

async fn forward_lines<C, R, W>(
    input: R,
    mut output: W,
    channel: &PeripheralChannel<C>,
    cancel: &CancellationToken,
) -> Result<()>
where
    C: FromStr<Err = CommandError> + std::fmt::Display,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = FramedRead::new(input, EffectLineCodec::<C>::new());

    loop {
        let item = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("{} driver interrupted", channel.name());
                break;
            }
            item = lines.next() => item,
        };

        let code = match item {
            None => {
                debug!("{} driver input closed", channel.name());
                break;
            }
            Some(Err(e)) => return Err(e.into()),
            Some(Ok(Err(e))) => {
                debug!("Rejected line: {}", e);
                e.code()
            }
            Some(Ok(Ok(command))) => {
                debug!("Accepted: {}", command);
                match channel.send(command) {
                    Ok(()) => continue,
                    Err(e) => {
                        warn!("{}", e);
                        e.code()
                    }
                }
            }
        };

        output.write_all(format!("errno {code}\n").as_bytes()).await?;
        output.flush().await?;
    }
    Ok(())
}

async fn stop_worker<C>(channel: &PeripheralChannel<C>, mut tasks: JoinSet<()>, worker_cancel: CancellationToken) {
    if tokio::time::timeout(DRIVER_STOP_GRACE, channel.drain()).await.is_err() {
        warn!("{} commands still queued at exit", channel.pending());
    }
    worker_cancel.cancel();

    let joined = tokio::time::timeout(DRIVER_STOP_GRACE, async {
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                warn!("{} worker failed: {}", channel.name(), e);
            }
        }
    })
    .await;
    if joined.is_err() {
        warn!("{} worker did not stop, aborting", channel.name());
        tasks.abort_all();
    }
}
