//! Typed light and sound commands and their line-oriented text form.
//!
//! Each command is one line of whitespace-separated tokens. The first token
//! names the command, the rest are positional arguments.
//!
//! # Light Commands
//!
//! ```text
//! color  R G B
//! pulse  R G B
//! wipe   R G B DURATION_MS DIRECTION
//! blink  R G B DURATION_MS REPEATS
//! scroll R G B DURATION_MS SPACING DIRECTION CENTER
//! bounce R G B DURATION_MS
//! ```
//!
//! Light arguments are integers. Color channels are 0-255, `DIRECTION` is `0`
//! (towards the end of the strip) or `1` (towards the start). There is no
//! `stop` word on the wire; [`LightCommand::Stop`] is sent as `color 0 0 0`.
//!
//! # Sound Commands
//!
//! ```text
//! buzz FREQ_HZ LENGTH_S STOP_SONG STOP_BEEP
//! beep FREQ_HZ DURATION_MS COUNT
//! sing FILE NOTE_LEN_S SPACING_S
//! stop SONG TONE BEEP
//! ```
//!
//! Sound arguments may be floats. Booleans are written `True`/`False`;
//! `true`, `false`, `1` and `0` are also accepted.
//!
//! # Errors
//!
//! An unrecognized first token is reported with error number 1, a wrong
//! argument count or a malformed argument with error number 2 (see
//! [`CommandError::code`]).
//!
//! # Examples
//!
//! ```
//! use portalbox_core::Rgb;
//! use portalbox_effects::{Direction, LightCommand, SoundCommand};
//!
//! let cmd: LightCommand = "wipe 255 0 0 500 1".parse().unwrap();
//! assert_eq!(
//!     cmd,
//!     LightCommand::Wipe { rgb: Rgb::RED, duration_ms: 500, direction: Direction::Down }
//! );
//! assert_eq!(cmd.to_string(), "wipe 255 0 0 500 1");
//!
//! let beep: SoundCommand = "beep 800 1000 3".parse().unwrap();
//! assert_eq!(beep.to_string(), "beep 800 1000 3");
//!
//! let err = "sparkle 1 2 3".parse::<LightCommand>().unwrap_err();
//! assert_eq!(err.code(), 1);
//! ```

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use portalbox_core::Rgb;
use serde::{Deserialize, Serialize};

use crate::error::CommandError;

/// Direction of travel along the strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// From pixel 0 towards the last pixel. Wire value `0`.
    #[default]
    Up,
    /// From the last pixel towards pixel 0. Wire value `1`.
    Down,
}

impl Direction {
    fn wire(self) -> u8 {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
        }
    }

    #[must_use]
    pub fn reversed(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

/// A request to the light effect worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum LightCommand {
    /// Fill the strip at default brightness.
    Color { rgb: Rgb },

    /// Fill the strip and ramp brightness up and down.
    Pulse { rgb: Rgb },

    /// Color the strip one pixel at a time over `duration_ms`.
    Wipe {
        rgb: Rgb,
        duration_ms: u32,
        direction: Direction,
    },

    /// Flip between low and high brightness `repeats` times over `duration_ms`.
    Blink {
        rgb: Rgb,
        duration_ms: u32,
        repeats: u32,
    },

    /// Rotate every `spacing + 1`-th pixel along the strip. A non-zero
    /// `center` splits the strip and moves both halves.
    Scroll {
        rgb: Rgb,
        duration_ms: u32,
        spacing: u32,
        direction: Direction,
        center: u32,
    },

    /// Move a single pixel back and forth.
    Bounce { rgb: Rgb, duration_ms: u32 },

    /// Cancel the active effect and turn the strip off.
    Stop,
}

impl LightCommand {
    /// Command word as written on the wire.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            LightCommand::Color { .. } | LightCommand::Stop => "color",
            LightCommand::Pulse { .. } => "pulse",
            LightCommand::Wipe { .. } => "wipe",
            LightCommand::Blink { .. } => "blink",
            LightCommand::Scroll { .. } => "scroll",
            LightCommand::Bounce { .. } => "bounce",
        }
    }

    /// Color the command paints with; black for `Stop`.
    #[must_use]
    pub fn color(&self) -> Rgb {
        match self {
            LightCommand::Color { rgb }
            | LightCommand::Pulse { rgb }
            | LightCommand::Wipe { rgb, .. }
            | LightCommand::Blink { rgb, .. }
            | LightCommand::Scroll { rgb, .. }
            | LightCommand::Bounce { rgb, .. } => *rgb,
            LightCommand::Stop => Rgb::BLACK,
        }
    }
}

impl fmt::Display for LightCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Rgb { r, g, b } = self.color();
        write!(f, "{} {} {} {}", self.name(), r, g, b)?;
        match self {
            LightCommand::Color { .. } | LightCommand::Pulse { .. } | LightCommand::Stop => Ok(()),
            LightCommand::Wipe {
                duration_ms,
                direction,
                ..
            } => write!(f, " {} {}", duration_ms, direction.wire()),
            LightCommand::Blink {
                duration_ms,
                repeats,
                ..
            } => write!(f, " {duration_ms} {repeats}"),
            LightCommand::Scroll {
                duration_ms,
                spacing,
                direction,
                center,
                ..
            } => write!(f, " {} {} {} {}", duration_ms, spacing, direction.wire(), center),
            LightCommand::Bounce { duration_ms, .. } => write!(f, " {duration_ms}"),
        }
    }
}

impl FromStr for LightCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (word, args) = split_line(line)?;
        let command = match word {
            "color" => {
                let args = Args::new("color", args, 3)?;
                LightCommand::Color { rgb: args.rgb()? }
            }
            "pulse" => {
                let args = Args::new("pulse", args, 3)?;
                LightCommand::Pulse { rgb: args.rgb()? }
            }
            "wipe" => {
                let args = Args::new("wipe", args, 5)?;
                LightCommand::Wipe {
                    rgb: args.rgb()?,
                    duration_ms: args.int(3, "duration")?,
                    direction: args.direction(4)?,
                }
            }
            "blink" => {
                let args = Args::new("blink", args, 5)?;
                LightCommand::Blink {
                    rgb: args.rgb()?,
                    duration_ms: args.int(3, "duration")?,
                    repeats: args.positive_int(4, "repeats")?,
                }
            }
            "scroll" => {
                let args = Args::new("scroll", args, 7)?;
                LightCommand::Scroll {
                    rgb: args.rgb()?,
                    duration_ms: args.int(3, "duration")?,
                    spacing: args.positive_int(4, "spacing")?,
                    direction: args.direction(5)?,
                    center: args.int(6, "center")?,
                }
            }
            "bounce" => {
                let args = Args::new("bounce", args, 4)?;
                LightCommand::Bounce {
                    rgb: args.rgb()?,
                    duration_ms: args.int(3, "duration")?,
                }
            }
            other => {
                return Err(CommandError::Unknown {
                    token: other.to_string(),
                });
            }
        };
        Ok(command)
    }
}

/// A request to the sound effect worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum SoundCommand {
    /// Sound a tone for `length_secs`, on top of any beep or song unless
    /// told to stop them.
    Tone {
        freq_hz: f32,
        length_secs: f32,
        stop_song: bool,
        stop_beep: bool,
    },

    /// Sound `count` evenly spaced beeps over `duration_ms`.
    Beep {
        freq_hz: f32,
        duration_ms: u32,
        count: u32,
    },

    /// Play a song file of `NOTE+OCTAVE,LENGTH` lines.
    Sing {
        file: PathBuf,
        note_len_secs: f32,
        spacing_secs: f32,
    },

    /// Cancel the selected effects.
    Stop { song: bool, tone: bool, beep: bool },
}

impl SoundCommand {
    /// Cancel everything.
    pub const STOP_ALL: SoundCommand = SoundCommand::Stop {
        song: true,
        tone: true,
        beep: true,
    };

    /// Command word as written on the wire.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            SoundCommand::Tone { .. } => "buzz",
            SoundCommand::Beep { .. } => "beep",
            SoundCommand::Sing { .. } => "sing",
            SoundCommand::Stop { .. } => "stop",
        }
    }
}

impl fmt::Display for SoundCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SoundCommand::Tone {
                freq_hz,
                length_secs,
                stop_song,
                stop_beep,
            } => write!(
                f,
                "buzz {} {} {} {}",
                freq_hz,
                length_secs,
                wire_bool(*stop_song),
                wire_bool(*stop_beep)
            ),
            SoundCommand::Beep {
                freq_hz,
                duration_ms,
                count,
            } => write!(f, "beep {freq_hz} {duration_ms} {count}"),
            SoundCommand::Sing {
                file,
                note_len_secs,
                spacing_secs,
            } => write!(f, "sing {} {} {}", file.display(), note_len_secs, spacing_secs),
            SoundCommand::Stop { song, tone, beep } => write!(
                f,
                "stop {} {} {}",
                wire_bool(*song),
                wire_bool(*tone),
                wire_bool(*beep)
            ),
        }
    }
}

impl FromStr for SoundCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (word, args) = split_line(line)?;
        let command = match word {
            "buzz" => {
                let args = Args::new("buzz", args, 4)?;
                SoundCommand::Tone {
                    freq_hz: args.float(0, "frequency")?,
                    length_secs: args.float(1, "length")?,
                    stop_song: args.boolean(2, "stop_song")?,
                    stop_beep: args.boolean(3, "stop_beep")?,
                }
            }
            "beep" => {
                let args = Args::new("beep", args, 3)?;
                SoundCommand::Beep {
                    freq_hz: args.float(0, "frequency")?,
                    duration_ms: args.float_ms(1, "duration")?,
                    count: args.positive_int(2, "count")?,
                }
            }
            "sing" => {
                let args = Args::new("sing", args, 3)?;
                SoundCommand::Sing {
                    file: PathBuf::from(args.raw(0)),
                    note_len_secs: args.float(1, "note_len")?,
                    spacing_secs: args.float(2, "spacing")?,
                }
            }
            "stop" => {
                let args = Args::new("stop", args, 3)?;
                SoundCommand::Stop {
                    song: args.boolean(0, "song")?,
                    tone: args.boolean(1, "tone")?,
                    beep: args.boolean(2, "beep")?,
                }
            }
            other => {
                return Err(CommandError::Unknown {
                    token: other.to_string(),
                });
            }
        };
        Ok(command)
    }
}

fn wire_bool(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

fn split_line(line: &str) -> Result<(&str, Vec<&str>), CommandError> {
    let mut tokens = line.split_whitespace();
    let word = tokens.next().ok_or(CommandError::Empty)?;
    Ok((word, tokens.collect()))
}

/// Positional arguments of one command, count already checked.
struct Args<'a> {
    command: &'static str,
    tokens: Vec<&'a str>,
}

impl<'a> Args<'a> {
    fn new(command: &'static str, tokens: Vec<&'a str>, expected: usize) -> Result<Self, CommandError> {
        if tokens.len() != expected {
            return Err(CommandError::ArgumentCount {
                command,
                expected,
                found: tokens.len(),
            });
        }
        Ok(Self { command, tokens })
    }

    fn raw(&self, index: usize) -> &'a str {
        self.tokens[index]
    }

    fn parse<T: FromStr>(&self, index: usize, name: &'static str) -> Result<T, CommandError> {
        let token = self.raw(index);
        token
            .parse()
            .map_err(|_| CommandError::invalid(self.command, name, token))
    }

    fn rgb(&self) -> Result<Rgb, CommandError> {
        Ok(Rgb::new(
            self.parse(0, "red")?,
            self.parse(1, "green")?,
            self.parse(2, "blue")?,
        ))
    }

    fn int(&self, index: usize, name: &'static str) -> Result<u32, CommandError> {
        self.parse(index, name)
    }

    fn positive_int(&self, index: usize, name: &'static str) -> Result<u32, CommandError> {
        match self.int(index, name)? {
            0 => Err(CommandError::invalid(self.command, name, self.raw(index))),
            value => Ok(value),
        }
    }

    fn direction(&self, index: usize) -> Result<Direction, CommandError> {
        match self.raw(index) {
            "0" => Ok(Direction::Up),
            "1" => Ok(Direction::Down),
            other => Err(CommandError::invalid(self.command, "direction", other)),
        }
    }

    fn float(&self, index: usize, name: &'static str) -> Result<f32, CommandError> {
        let value: f32 = self.parse(index, name)?;
        if !value.is_finite() || value < 0.0 {
            return Err(CommandError::invalid(self.command, name, self.raw(index)));
        }
        Ok(value)
    }

    /// Milliseconds given as a float; the fraction is dropped.
    fn float_ms(&self, index: usize, name: &'static str) -> Result<u32, CommandError> {
        let value = self.float(index, name)?;
        if value > u32::MAX as f32 {
            return Err(CommandError::invalid(self.command, name, self.raw(index)));
        }
        Ok(value as u32)
    }

    fn boolean(&self, index: usize, name: &'static str) -> Result<bool, CommandError> {
        match self.raw(index) {
            "True" | "true" | "1" => Ok(true),
            "False" | "false" | "0" => Ok(false),
            other => Err(CommandError::invalid(self.command, name, other)),
        }
    }
}
