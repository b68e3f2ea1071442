//! Step timing shared by the light and sound engines.
//!
//! Effects advance on a fixed engine tick. An effect that needs `divisor`
//! visible steps over `numerator_ms` gets a per-step wait rounded to the
//! nearest whole tick (never less than one tick), and a total duration of
//! `multiplier` waits.

/// Per-step wait and total effect duration, both multiples of the tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepTiming {
    pub wait_ms: u64,
    pub duration_ms: u64,
}

impl StepTiming {
    /// Compute timing for `divisor` steps over `numerator_ms`.
    ///
    /// A zero divisor is treated as one step.
    ///
    /// # Examples
    ///
    /// ```
    /// use portalbox_effects::StepTiming;
    ///
    /// // blink 1000 ms, 5 repeats => 10 flips on a 50 ms tick
    /// let timing = StepTiming::calculate(1000, 10, 10, 50);
    /// assert_eq!(timing.wait_ms, 100);
    /// assert_eq!(timing.duration_ms, 1000);
    ///
    /// // too fast for the tick: clamped to one tick per step
    /// assert_eq!(StepTiming::calculate(100, 15, 15, 50).wait_ms, 50);
    /// ```
    #[must_use]
    pub fn calculate(numerator_ms: u64, divisor: u64, multiplier: u64, tick_ms: u64) -> Self {
        let wait_ms = round_to_tick(numerator_ms / divisor.max(1), tick_ms);
        Self {
            wait_ms,
            duration_ms: wait_ms.saturating_mul(multiplier),
        }
    }
}

/// Round to the nearest multiple of `tick_ms`, at least one tick.
#[must_use]
pub fn round_to_tick(ms: u64, tick_ms: u64) -> u64 {
    let tick_ms = tick_ms.max(1);
    let rounded = ms.saturating_add(tick_ms / 2) / tick_ms * tick_ms;
    rounded.max(tick_ms)
}
