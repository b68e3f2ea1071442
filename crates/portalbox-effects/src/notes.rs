//! Song files for the buzzer.
//!
//! A song is a text file with one note per line, `NOTE OCTAVE , LENGTH`:
//!
//! ```text
//! E4,1
//! Eb4,0.5
//! G3,2
//! ```
//!
//! Notes are `C Db D Eb E F Gb G Ab A Bb B`. `LENGTH` is in note units; one
//! unit lasts `note_len_secs`. Every note is followed by a rest of
//! `spacing_secs`. Blank lines and lines starting with `#` are skipped.

use std::path::Path;

use portalbox_core::constants::SOUND_TICK_MS;

use crate::error::SongError;

/// Octave-4 frequencies in Hz.
const NOTES: [(&str, f32); 12] = [
    ("C", 261.63),
    ("Db", 277.18),
    ("D", 293.66),
    ("Eb", 311.13),
    ("E", 329.63),
    ("F", 349.23),
    ("Gb", 369.99),
    ("G", 392.0),
    ("Ab", 415.3),
    ("A", 440.0),
    ("Bb", 466.16),
    ("B", 493.88),
];

/// One step of a song: a tone (or a rest) held for `loops` engine ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SongStep {
    /// `None` for a rest.
    pub freq_hz: Option<f32>,
    pub loops: u32,
}

/// Frequency of `note` in `octave`, e.g. `("A", 4)` is 440 Hz.
#[must_use]
pub fn note_frequency(note: &str, octave: i32) -> Option<f32> {
    NOTES
        .iter()
        .find(|(name, _)| *name == note)
        .map(|(_, base)| base * 2f32.powi(octave - 4))
}

/// Number of ticks a duration lasts, at least one.
fn ticks(secs: f64) -> u32 {
    let loops = (secs * 1000.0 / SOUND_TICK_MS as f64).floor();
    (loops as u32).max(1)
}

/// Parse song text into tone and rest steps.
///
/// # Errors
///
/// Returns an error for a line that is not `NOTE OCTAVE , LENGTH` or names
/// an unknown note. Nothing of the song is kept in that case.
///
/// # Examples
///
/// ```
/// use portalbox_effects::notes::parse_song;
///
/// let steps = parse_song("A4,2\nA5,1\n", 0.25, 0.1).unwrap();
/// assert_eq!(steps.len(), 4);
/// assert_eq!(steps[0].freq_hz, Some(440.0));
/// assert_eq!(steps[0].loops, 5);
/// assert_eq!(steps[1].freq_hz, None);
/// assert_eq!(steps[2].freq_hz, Some(880.0));
/// ```
pub fn parse_song(text: &str, note_len_secs: f32, spacing_secs: f32) -> Result<Vec<SongStep>, SongError> {
    let rest = SongStep {
        freq_hz: None,
        loops: ticks(f64::from(spacing_secs)),
    };

    let mut steps = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let malformed = || SongError::Malformed {
            line: index + 1,
            text: line.to_string(),
        };

        let (pitch, length) = line.split_once(',').ok_or_else(malformed)?;
        let pitch = pitch.trim();
        let length: f64 = length.trim().parse().map_err(|_| malformed())?;
        if !length.is_finite() || length < 0.0 {
            return Err(malformed());
        }

        let split = pitch
            .find(|c: char| c.is_ascii_digit() || c == '-')
            .filter(|split| *split > 0)
            .ok_or_else(malformed)?;
        let (note, octave) = pitch.split_at(split);
        let octave: i32 = octave.parse().map_err(|_| malformed())?;
        let freq_hz = note_frequency(note, octave).ok_or_else(|| SongError::UnknownNote {
            line: index + 1,
            note: note.to_string(),
        })?;

        steps.push(SongStep {
            freq_hz: Some(freq_hz),
            loops: ticks(length * f64::from(note_len_secs)),
        });
        steps.push(rest);
    }
    Ok(steps)
}

/// Read and parse a song file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not parse.
pub fn load_song(path: &Path, note_len_secs: f32, spacing_secs: f32) -> Result<Vec<SongStep>, SongError> {
    let text = std::fs::read_to_string(path)?;
    parse_song(&text, note_len_secs, spacing_secs)
}

/// [`load_song`] for async callers: the file is read on tokio's blocking
/// pool.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not parse.
pub async fn read_song(path: &Path, note_len_secs: f32, spacing_secs: f32) -> Result<Vec<SongStep>, SongError> {
    let text = tokio::fs::read_to_string(path).await?;
    parse_song(&text, note_len_secs, spacing_secs)
}
