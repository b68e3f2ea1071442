//! Mock LED strip.

use std::sync::{Arc, Mutex};

use super::lock;
use crate::{HardwareError, Result, traits::LedStrip, types::Pixel};

#[derive(Debug, Default)]
struct StripState {
    last_frame: Vec<Pixel>,
    frames: u64,
}

/// Mock strip that keeps the most recent frame.
#[derive(Debug)]
pub struct MockStrip {
    len: usize,
    state: Arc<Mutex<StripState>>,
}

impl MockStrip {
    pub fn new(len: usize) -> (Self, MockStripHandle) {
        let state = Arc::new(Mutex::new(StripState {
            last_frame: vec![Pixel::OFF; len],
            frames: 0,
        }));
        (
            Self {
                len,
                state: Arc::clone(&state),
            },
            MockStripHandle { state },
        )
    }
}

impl LedStrip for MockStrip {
    fn len(&self) -> usize {
        self.len
    }

    fn show(&mut self, pixels: &[Pixel]) -> Result<()> {
        HardwareError::check_frame(self.len, pixels.len())?;
        let mut state = lock(&self.state);
        state.last_frame.clear();
        state.last_frame.extend_from_slice(pixels);
        state.frames += 1;
        Ok(())
    }
}

/// Handle for inspecting a mock strip.
#[derive(Debug, Clone)]
pub struct MockStripHandle {
    state: Arc<Mutex<StripState>>,
}

impl MockStripHandle {
    /// Most recently shown frame.
    pub fn last_frame(&self) -> Vec<Pixel> {
        lock(&self.state).last_frame.clone()
    }

    /// Number of frames shown so far.
    pub fn frames_shown(&self) -> u64 {
        lock(&self.state).frames
    }
}
