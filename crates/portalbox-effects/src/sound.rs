//! Buzzer effect engine.
//!
//! At most one of beeping or singing is active. A tone (`buzz`) is an
//! overlay: it plays on top of a beep or song unless its stop flags cancel
//! them, and while it lasts the buzzer follows the tone. Starting a beep or
//! a song supersedes everything else.
//!
//! Like the light engine, [`BuzzerEngine`] has no clock. Each
//! [`BuzzerEngine::step`] advances one sound tick and returns what the
//! buzzer should do during it.

use std::collections::VecDeque;

use portalbox_core::constants::SOUND_TICK_MS;
use serde::{Deserialize, Serialize};

use crate::command::SoundCommand;
use crate::error::SongError;
use crate::notes::{SongStep, load_song};
use crate::timing::StepTiming;

/// Observable state of the buzzer engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundState {
    Idle,
    Tone,
    Beeping,
    Singing,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Tone {
    freq_hz: f32,
    loops_left: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Beep {
    freq_hz: f32,
    timing: StepTiming,
    elapsed: u64,
}

#[derive(Debug, Clone, PartialEq)]
enum Pattern {
    None,
    Beep(Beep),
    Song(VecDeque<SongStep>),
}

/// Beep, song and tone timers for one buzzer.
#[derive(Debug, Clone)]
pub struct BuzzerEngine {
    pattern: Pattern,
    tone: Option<Tone>,
    tick_ms: u64,
}

impl Default for BuzzerEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl BuzzerEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::with_tick(SOUND_TICK_MS)
    }

    #[must_use]
    pub fn with_tick(tick_ms: u64) -> Self {
        Self {
            pattern: Pattern::None,
            tone: None,
            tick_ms: tick_ms.max(1),
        }
    }

    /// Most prominent active effect; a tone overlay wins.
    #[must_use]
    pub fn state(&self) -> SoundState {
        if self.tone.is_some() {
            return SoundState::Tone;
        }
        match self.pattern {
            Pattern::None => SoundState::Idle,
            Pattern::Beep(_) => SoundState::Beeping,
            Pattern::Song(_) => SoundState::Singing,
        }
    }

    /// Apply a command. `sing` reads its song file here with blocking I/O;
    /// async callers load it with [`read_song`](crate::notes::read_song)
    /// and call [`sing`](Self::sing).
    ///
    /// # Errors
    ///
    /// Returns an error if a song file cannot be read or parsed. The engine
    /// is unchanged in that case.
    pub fn apply(&mut self, command: &SoundCommand) -> Result<(), SongError> {
        match command {
            SoundCommand::Tone {
                freq_hz,
                length_secs,
                stop_song,
                stop_beep,
            } => {
                match self.pattern {
                    Pattern::Song(_) if *stop_song => self.pattern = Pattern::None,
                    Pattern::Beep(_) if *stop_beep => self.pattern = Pattern::None,
                    _ => {}
                }
                let loops_left = (f64::from(*length_secs) * 1000.0) as u64 / self.tick_ms;
                self.tone = Some(Tone {
                    freq_hz: *freq_hz,
                    loops_left,
                });
            }
            SoundCommand::Beep {
                freq_hz,
                duration_ms,
                count,
            } => {
                let flips = 2 * u64::from(*count);
                self.tone = None;
                self.pattern = Pattern::Beep(Beep {
                    freq_hz: *freq_hz,
                    timing: StepTiming::calculate(u64::from(*duration_ms), flips, flips, self.tick_ms),
                    elapsed: 0,
                });
            }
            SoundCommand::Sing {
                file,
                note_len_secs,
                spacing_secs,
            } => {
                let steps = load_song(file, *note_len_secs, *spacing_secs)?;
                self.sing(steps);
            }
            SoundCommand::Stop { song, tone, beep } => {
                match self.pattern {
                    Pattern::Song(_) if *song => self.pattern = Pattern::None,
                    Pattern::Beep(_) if *beep => self.pattern = Pattern::None,
                    _ => {}
                }
                if *tone {
                    self.tone = None;
                }
            }
        }
        Ok(())
    }

    /// Start an already parsed song.
    pub fn sing(&mut self, steps: Vec<SongStep>) {
        self.tone = None;
        self.pattern = Pattern::Song(steps.into());
    }

    /// Cancel everything.
    pub fn silence(&mut self) {
        self.pattern = Pattern::None;
        self.tone = None;
    }

    /// Advance one tick. Returns the frequency to sound during it, or
    /// `None` for silence.
    pub fn step(&mut self) -> Option<f32> {
        let tick = self.tick_ms;

        let pattern_output = match &mut self.pattern {
            Pattern::None => None,
            Pattern::Beep(beep) => {
                if beep.elapsed < beep.timing.duration_ms {
                    let on = (beep.elapsed / beep.timing.wait_ms) % 2 == 0;
                    beep.elapsed += tick;
                    on.then_some(beep.freq_hz)
                } else {
                    self.pattern = Pattern::None;
                    None
                }
            }
            Pattern::Song(steps) => match steps.front_mut() {
                Some(step) => {
                    let output = step.freq_hz;
                    step.loops = step.loops.saturating_sub(1);
                    if step.loops == 0 {
                        steps.pop_front();
                    }
                    output
                }
                None => {
                    self.pattern = Pattern::None;
                    None
                }
            },
        };

        let tone_output = match &mut self.tone {
            Some(tone) if tone.loops_left > 0 => {
                tone.loops_left -= 1;
                Some(tone.freq_hz)
            }
            Some(_) => {
                self.tone = None;
                None
            }
            None => None,
        };

        tone_output.or(pattern_output)
    }
}
