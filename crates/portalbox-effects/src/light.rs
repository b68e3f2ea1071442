//! LED strip effect engine.
//!
//! [`LightEngine`] holds the pixel buffer and at most one active effect. It
//! does no I/O and has no clock: the worker calls [`LightEngine::apply`] for
//! each command and [`LightEngine::step`] once per tick when there is none,
//! then sends [`LightEngine::frame`] to the strip.
//!
//! All times are in milliseconds and advance by the engine tick
//! ([`LIGHT_TICK_MS`] by default) per step.
//!
//! # Effects
//!
//! | Command | State       | Per step                                               |
//! |---------|-------------|--------------------------------------------------------|
//! | color   | SolidColor  | nothing                                                |
//! | pulse   | Pulsing     | brightness ±2 between 1 and 30                         |
//! | wipe    | Wiping      | colors the next pixel every step wait, then ends       |
//! | blink   | Blinking    | low/high brightness alternating every step wait, ends  |
//! | scroll  | Scrolling   | shifts colors one pixel every step wait                |
//! | bounce  | Bouncing    | swaps the moving pixel with its neighbor every wait    |
//!
//! A pulse, scroll or bounce identical to the running one is a
//! continuation and leaves the effect untouched, so the controller can
//! re-send its current state display every tick.

use portalbox_core::{
    Rgb,
    constants::{
        DEFAULT_BRIGHTNESS, LIGHT_TICK_MS, MAX_PULSE_BRIGHTNESS, MIN_PULSE_BRIGHTNESS,
        PULSE_BRIGHTNESS_STEP,
    },
};
use portalbox_hardware::Pixel;
use serde::{Deserialize, Serialize};

use crate::command::{Direction, LightCommand};
use crate::timing::StepTiming;

/// Observable state of the light engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightState {
    Idle,
    SolidColor,
    Pulsing,
    Wiping,
    Blinking,
    Scrolling,
    Bouncing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Effect {
    None,
    Solid,
    Pulse {
        rising: bool,
    },
    Wipe {
        rgb: Rgb,
        timing: StepTiming,
        elapsed: u64,
        direction: Direction,
    },
    Blink {
        timing: StepTiming,
        elapsed: u64,
    },
    Scroll {
        wait_ms: u64,
        elapsed: u64,
        spacing: usize,
        direction: Direction,
        center: usize,
    },
    Bounce {
        wait_ms: u64,
        elapsed: u64,
        index: usize,
        direction: Direction,
    },
}

/// Pixel buffer plus the active effect.
#[derive(Debug, Clone)]
pub struct LightEngine {
    pixels: Vec<Pixel>,
    effect: Effect,
    /// Command that started the active effect.
    active: Option<LightCommand>,
    tick_ms: u64,
}

impl LightEngine {
    /// Engine for a strip of `len` pixels (at least one) on the default tick.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self::with_tick(len, LIGHT_TICK_MS)
    }

    /// Engine with a custom tick length.
    #[must_use]
    pub fn with_tick(len: usize, tick_ms: u64) -> Self {
        Self {
            pixels: vec![Pixel::OFF; len.max(1)],
            effect: Effect::None,
            active: None,
            tick_ms: tick_ms.max(1),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    #[must_use]
    pub fn frame(&self) -> &[Pixel] {
        &self.pixels
    }

    #[must_use]
    pub fn state(&self) -> LightState {
        match self.effect {
            Effect::None => LightState::Idle,
            Effect::Solid => LightState::SolidColor,
            Effect::Pulse { .. } => LightState::Pulsing,
            Effect::Wipe { .. } => LightState::Wiping,
            Effect::Blink { .. } => LightState::Blinking,
            Effect::Scroll { .. } => LightState::Scrolling,
            Effect::Bounce { .. } => LightState::Bouncing,
        }
    }

    /// Start (or continue) the effect for `command`.
    ///
    /// Returns `false` when the command was a continuation of the running
    /// effect and nothing changed.
    pub fn apply(&mut self, command: &LightCommand) -> bool {
        let continuation = matches!(
            command,
            LightCommand::Pulse { .. } | LightCommand::Scroll { .. } | LightCommand::Bounce { .. }
        ) && self.active.as_ref() == Some(command)
            && self.state() != LightState::Idle;
        if continuation {
            return false;
        }

        let len = self.len() as u64;
        match *command {
            LightCommand::Color { rgb } => {
                self.set_brightness(DEFAULT_BRIGHTNESS);
                self.fill(rgb);
                self.effect = Effect::Solid;
            }
            LightCommand::Stop => {
                self.set_brightness(DEFAULT_BRIGHTNESS);
                self.fill(Rgb::BLACK);
                self.effect = Effect::None;
            }
            LightCommand::Pulse { rgb } => {
                self.fill(rgb);
                self.set_brightness(DEFAULT_BRIGHTNESS);
                self.effect = Effect::Pulse { rising: false };
            }
            LightCommand::Wipe {
                rgb,
                duration_ms,
                direction,
            } => {
                self.set_brightness(DEFAULT_BRIGHTNESS);
                let first = match direction {
                    Direction::Up => 0,
                    Direction::Down => self.len() - 1,
                };
                self.pixels[first].color = rgb;
                self.effect = Effect::Wipe {
                    rgb,
                    timing: StepTiming::calculate(u64::from(duration_ms), len, len, self.tick_ms),
                    elapsed: 0,
                    direction,
                };
            }
            LightCommand::Blink {
                rgb,
                duration_ms,
                repeats,
            } => {
                self.fill(rgb);
                self.set_brightness(MIN_PULSE_BRIGHTNESS);
                let flips = 2 * u64::from(repeats);
                self.effect = Effect::Blink {
                    timing: StepTiming::calculate(u64::from(duration_ms), flips, flips, self.tick_ms),
                    elapsed: 0,
                };
            }
            LightCommand::Scroll {
                rgb,
                duration_ms,
                spacing,
                direction,
                center,
            } => {
                let spacing = (spacing as usize).max(1);
                let center = (center as usize).min(self.len() - 1);
                let period = spacing + 1;
                for i in center..self.len() {
                    if (i - center) % period == 0 {
                        self.pixels[i] = Pixel::new(rgb, DEFAULT_BRIGHTNESS);
                    }
                }
                for i in 0..center {
                    if (center - 1 - i) % period == 0 {
                        self.pixels[i] = Pixel::new(rgb, DEFAULT_BRIGHTNESS);
                    }
                }
                let timing = StepTiming::calculate(u64::from(duration_ms), spacing as u64, len, self.tick_ms);
                self.effect = Effect::Scroll {
                    wait_ms: timing.wait_ms,
                    elapsed: 0,
                    spacing,
                    direction,
                    center,
                };
            }
            LightCommand::Bounce { rgb, duration_ms } => {
                self.pixels[0] = Pixel::new(rgb, DEFAULT_BRIGHTNESS);
                let timing = StepTiming::calculate(u64::from(duration_ms), len, len, self.tick_ms);
                self.effect = Effect::Bounce {
                    wait_ms: timing.wait_ms,
                    elapsed: 0,
                    index: 0,
                    direction: Direction::Up,
                };
            }
        }
        self.active = Some(*command);
        true
    }

    /// Advance the active effect by one tick.
    pub fn step(&mut self) {
        let tick = self.tick_ms;
        let len = self.len();
        match self.effect {
            Effect::None | Effect::Solid => {}
            Effect::Blink {
                timing,
                ref mut elapsed,
            } => {
                if *elapsed < timing.duration_ms {
                    let level = if (*elapsed / timing.wait_ms) % 2 == 0 {
                        MIN_PULSE_BRIGHTNESS
                    } else {
                        MAX_PULSE_BRIGHTNESS
                    };
                    *elapsed += tick;
                    self.set_brightness(level);
                } else {
                    self.finish();
                }
            }
            Effect::Wipe {
                rgb,
                timing,
                ref mut elapsed,
                direction,
            } => {
                if *elapsed < timing.duration_ms {
                    let offset = ((*elapsed / timing.wait_ms) as usize).min(len - 1);
                    let index = match direction {
                        Direction::Up => offset,
                        Direction::Down => len - offset - 1,
                    };
                    *elapsed += tick;
                    self.pixels[index].color = rgb;
                } else {
                    self.finish();
                }
            }
            Effect::Pulse { ref mut rising } => {
                let current = self.pixels[0].brightness;
                let next = if *rising {
                    let up = current.saturating_add(PULSE_BRIGHTNESS_STEP);
                    if up >= MAX_PULSE_BRIGHTNESS {
                        *rising = false;
                        MAX_PULSE_BRIGHTNESS
                    } else {
                        up
                    }
                } else {
                    let down = current.saturating_sub(PULSE_BRIGHTNESS_STEP);
                    if down <= MIN_PULSE_BRIGHTNESS {
                        *rising = true;
                        MIN_PULSE_BRIGHTNESS
                    } else {
                        down
                    }
                };
                self.set_brightness(next);
            }
            Effect::Scroll {
                wait_ms,
                ref mut elapsed,
                spacing,
                direction,
                center,
            } => {
                if *elapsed < wait_ms {
                    *elapsed += tick;
                } else {
                    *elapsed = 0;
                    self.scroll(spacing, direction, center);
                }
            }
            Effect::Bounce {
                wait_ms,
                ref mut elapsed,
                ref mut index,
                ref mut direction,
            } => {
                if *elapsed < wait_ms {
                    *elapsed += tick;
                } else {
                    *elapsed = 0;
                    let heading = *direction;
                    match heading {
                        Direction::Down if *index > 0 => {
                            self.pixels.swap(*index - 1, *index);
                            *index -= 1;
                        }
                        Direction::Up if *index + 1 < len => {
                            self.pixels.swap(*index + 1, *index);
                            *index += 1;
                        }
                        _ => *direction = heading.reversed(),
                    }
                }
            }
        }
    }

    /// Dim dark red on every pixel, shown when the worker stops.
    pub fn last_gasp(&mut self) {
        self.fill(Rgb::DARK_RED);
        self.set_brightness(MIN_PULSE_BRIGHTNESS);
        self.finish();
    }

    fn finish(&mut self) {
        self.effect = Effect::None;
        self.active = None;
    }

    fn fill(&mut self, rgb: Rgb) {
        for pixel in &mut self.pixels {
            pixel.color = rgb;
        }
    }

    fn set_brightness(&mut self, brightness: u8) {
        for pixel in &mut self.pixels {
            pixel.brightness = brightness;
        }
    }

    /// Shift colors one pixel. With a center, both halves move: towards the
    /// center for [`Direction::Up`], away from it for [`Direction::Down`].
    fn scroll(&mut self, spacing: usize, direction: Direction, center: usize) {
        let last = self.len() - 1;
        let split = center != 0;

        if direction == Direction::Up || split {
            let (left, right) = match (split, direction) {
                (true, Direction::Up) => (0, center - 1),
                (true, Direction::Down) => (center, last),
                (false, _) => (0, last),
            };
            self.shift_up(left, right, spacing);
        }
        if direction == Direction::Down || split {
            let (left, right) = match (split, direction) {
                (true, Direction::Down) => (0, center - 1),
                (true, Direction::Up) => (center, last),
                (false, _) => (0, last),
            };
            self.shift_down(left, right, spacing);
        }
    }

    /// Move colors in `left..=right` one pixel towards `right`, refilling
    /// `left` from the pattern period.
    fn shift_up(&mut self, left: usize, right: usize, spacing: usize) {
        if left >= right {
            return;
        }
        for i in (left + 1..=right).rev() {
            self.pixels[i].color = self.pixels[i - 1].color;
        }
        if let Some(source) = self.pixels.get(left + spacing + 1).map(|p| p.color) {
            self.pixels[left].color = source;
        }
    }

    /// Move colors in `left..=right` one pixel towards `left`, refilling
    /// `right` from the pattern period.
    fn shift_down(&mut self, left: usize, right: usize, spacing: usize) {
        if left >= right {
            return;
        }
        for i in left..right {
            self.pixels[i].color = self.pixels[i + 1].color;
        }
        if let Some(source) = right
            .checked_sub(spacing + 1)
            .map(|i| self.pixels[i].color)
        {
            self.pixels[right].color = source;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GREEN: Rgb = Rgb::new(0, 255, 0);

    fn colors(engine: &LightEngine) -> Vec<Rgb> {
        engine.frame().iter().map(|p| p.color).collect()
    }

    fn brightness(engine: &LightEngine) -> u8 {
        engine.frame()[0].brightness
    }

    #[test]
    fn test_color_fills_at_default_brightness() {
        let mut engine = LightEngine::new(15);
        engine.apply(&LightCommand::Color { rgb: Rgb::RED });

        assert_eq!(engine.state(), LightState::SolidColor);
        assert!(engine.frame().iter().all(|p| *p == Pixel::new(Rgb::RED, DEFAULT_BRIGHTNESS)));
        engine.step();
        assert_eq!(engine.state(), LightState::SolidColor);
    }

    #[test]
    fn test_stop_turns_strip_off() {
        let mut engine = LightEngine::new(4);
        engine.apply(&LightCommand::Pulse { rgb: Rgb::AMBER });
        engine.apply(&LightCommand::Stop);

        assert_eq!(engine.state(), LightState::Idle);
        assert!(engine.frame().iter().all(|p| p.color.is_black()));
    }

    #[test]
    fn test_blink_flips_ten_times_then_idles() {
        let mut engine = LightEngine::new(15);
        engine.apply(&LightCommand::Blink {
            rgb: Rgb::RED,
            duration_ms: 1000,
            repeats: 5,
        });

        let mut levels = Vec::new();
        while engine.state() == LightState::Blinking {
            engine.step();
            levels.push(brightness(&engine));
            assert!(levels.len() <= 21, "blink never finished");
        }
        levels.dedup();

        let expected: Vec<u8> = [MIN_PULSE_BRIGHTNESS, MAX_PULSE_BRIGHTNESS].repeat(5);
        assert_eq!(levels, expected);
        assert_eq!(colors(&engine), vec![Rgb::RED; 15]);
    }

    #[test]
    fn test_pulse_stays_in_bounds_and_reverses() {
        let mut engine = LightEngine::new(3);
        engine.apply(&LightCommand::Pulse { rgb: GREEN });

        let mut seen = Vec::new();
        for _ in 0..40 {
            engine.step();
            let b = brightness(&engine);
            assert!((MIN_PULSE_BRIGHTNESS..=MAX_PULSE_BRIGHTNESS).contains(&b));
            seen.push(b);
        }
        // 16 -> 14 ... 2 -> 1 (floor) -> 3 ...
        assert_eq!(&seen[..9], &[14, 12, 10, 8, 6, 4, 2, 1, 3]);
        assert!(seen.contains(&MAX_PULSE_BRIGHTNESS));
    }

    #[test]
    fn test_identical_pulse_is_continuation() {
        let mut engine = LightEngine::new(3);
        let pulse = LightCommand::Pulse { rgb: GREEN };
        assert!(engine.apply(&pulse));
        engine.step();
        engine.step();
        let before = brightness(&engine);

        assert!(!engine.apply(&pulse));
        assert_eq!(brightness(&engine), before);

        assert!(engine.apply(&LightCommand::Pulse { rgb: Rgb::RED }));
        assert_eq!(brightness(&engine), DEFAULT_BRIGHTNESS);
    }

    #[test]
    fn test_wipe_up_colors_every_pixel_then_ends() {
        let mut engine = LightEngine::new(5);
        engine.apply(&LightCommand::Wipe {
            rgb: GREEN,
            duration_ms: 500,
            direction: Direction::Up,
        });
        assert_eq!(colors(&engine)[0], GREEN);
        assert_eq!(colors(&engine)[1], Rgb::BLACK);

        // wait 100 ms = 2 ticks per pixel
        engine.step();
        engine.step();
        engine.step();
        assert_eq!(&colors(&engine)[..3], &[GREEN, GREEN, Rgb::BLACK]);

        for _ in 0..20 {
            engine.step();
        }
        assert_eq!(colors(&engine), vec![GREEN; 5]);
        assert_eq!(engine.state(), LightState::Idle);
    }

    #[test]
    fn test_wipe_down_starts_at_last_pixel() {
        let mut engine = LightEngine::new(4);
        engine.apply(&LightCommand::Wipe {
            rgb: Rgb::RED,
            duration_ms: 200,
            direction: Direction::Down,
        });
        assert_eq!(colors(&engine)[3], Rgb::RED);
        assert_eq!(colors(&engine)[0], Rgb::BLACK);

        engine.step();
        engine.step();
        assert_eq!(colors(&engine), vec![Rgb::BLACK, Rgb::BLACK, Rgb::RED, Rgb::RED]);
    }

    #[test]
    fn test_bounce_reverses_at_ends() {
        let mut engine = LightEngine::new(3);
        engine.apply(&LightCommand::Bounce {
            rgb: Rgb::RED,
            duration_ms: 150,
        });

        // wait = 50 ms: one idle tick then one move per cycle
        let mut positions = Vec::new();
        for _ in 0..12 {
            engine.step();
            let pos = colors(&engine).iter().position(|c| *c == Rgb::RED).unwrap();
            positions.push(pos);
        }
        positions.dedup();
        assert_eq!(positions, vec![0, 1, 2, 1, 0]);
    }

    #[test]
    fn test_scroll_seeds_every_period() {
        let mut engine = LightEngine::new(7);
        engine.apply(&LightCommand::Scroll {
            rgb: GREEN,
            duration_ms: 100,
            spacing: 2,
            direction: Direction::Up,
            center: 0,
        });
        let lit: Vec<usize> = colors(&engine)
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == GREEN)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(lit, vec![0, 3, 6]);
    }

    #[test]
    fn test_scroll_up_moves_pattern() {
        let mut engine = LightEngine::new(6);
        engine.apply(&LightCommand::Scroll {
            rgb: GREEN,
            duration_ms: 100,
            spacing: 2,
            direction: Direction::Up,
            center: 0,
        });

        // wait 50 ms: first step accumulates, second shifts
        engine.step();
        engine.step();
        let lit: Vec<bool> = colors(&engine).iter().map(|c| *c == GREEN).collect();
        assert_eq!(lit, vec![false, true, false, false, true, false]);
    }

    #[test]
    fn test_scroll_with_center_moves_both_halves() {
        let mut engine = LightEngine::new(12);
        engine.apply(&LightCommand::Scroll {
            rgb: GREEN,
            duration_ms: 100,
            spacing: 2,
            direction: Direction::Up,
            center: 6,
        });
        let lit = |e: &LightEngine| -> Vec<usize> {
            colors(e)
                .iter()
                .enumerate()
                .filter(|(_, c)| **c == GREEN)
                .map(|(i, _)| i)
                .collect()
        };
        assert_eq!(lit(&engine), vec![2, 5, 6, 9]);

        engine.step();
        engine.step();
        // both halves move one pixel towards the center and refill at the ends
        assert_eq!(lit(&engine), vec![0, 3, 8, 11]);
    }

    #[test]
    fn test_identical_scroll_does_not_restart() {
        let mut engine = LightEngine::new(6);
        let scroll = LightCommand::Scroll {
            rgb: GREEN,
            duration_ms: 100,
            spacing: 2,
            direction: Direction::Up,
            center: 0,
        };
        engine.apply(&scroll);
        engine.step();
        engine.step();
        let moved = colors(&engine);

        assert!(!engine.apply(&scroll));
        assert_eq!(colors(&engine), moved);
    }

    #[test]
    fn test_last_gasp() {
        let mut engine = LightEngine::new(5);
        engine.apply(&LightCommand::Pulse { rgb: GREEN });
        engine.last_gasp();

        assert_eq!(engine.state(), LightState::Idle);
        assert!(engine.frame().iter().all(|p| *p == Pixel::new(Rgb::DARK_RED, MIN_PULSE_BRIGHTNESS)));
    }
}
