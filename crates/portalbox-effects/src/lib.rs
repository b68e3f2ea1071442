//! Light and sound effect engines for the PortalBox controller.
//!
//! The controller never renders effects itself. It sends typed commands over
//! a [`PeripheralChannel`] to a worker that owns the peripheral and renders
//! one effect at a time on a fixed tick:
//!
//! ```text
//! AccessStateMachine ──LightCommand──> PeripheralChannel ──> light worker ──> LedStrip
//!                    ──SoundCommand──> PeripheralChannel ──> sound worker ──> BuzzerOutput
//! ```
//!
//! Commands also have a line-oriented text form, byte-compatible with the
//! standalone driver processes that preceded these workers (see [`command`]
//! and [`codec`]).
//!
//! # Example
//!
//! ```
//! use portalbox_core::Rgb;
//! use portalbox_effects::{LightCommand, LightEngine, LightState};
//!
//! let mut engine = LightEngine::new(15);
//! engine.apply(&LightCommand::Blink { rgb: Rgb::RED, duration_ms: 1000, repeats: 5 });
//! assert_eq!(engine.state(), LightState::Blinking);
//!
//! for _ in 0..21 {
//!     engine.step();
//! }
//! assert_eq!(engine.state(), LightState::Idle);
//! ```

pub mod channel;
pub mod codec;
pub mod command;
pub mod error;
pub mod light;
pub mod notes;
pub mod sound;
pub mod timing;
pub mod worker;

pub use channel::{CommandInbox, PeripheralChannel};
pub use codec::EffectLineCodec;
pub use command::{Direction, LightCommand, SoundCommand};
pub use error::{ChannelError, CodecError, CommandError, SongError};
pub use light::{LightEngine, LightState};
pub use notes::SongStep;
pub use sound::{BuzzerEngine, SoundState};
pub use timing::StepTiming;
pub use worker::{EffectWorkers, WorkerConfig};
