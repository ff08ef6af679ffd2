//! Debounce and repeat timing for held directional input.
//!
//! A held direction fires on the tick it is first seen, stays quiet for
//! `initial_delay` ticks, then fires every `rate` ticks until it is released
//! or replaced. With delay 3 and rate 1 a continuous hold fires at ticks
//! 0, 3, 4, 5, ...

/// Default ticks of silence after the first fire.
pub const DEFAULT_INITIAL_DELAY: u32 = 3;

/// Default ticks between repeats once the delay has elapsed.
pub const DEFAULT_REPEAT_RATE: u32 = 1;

/// Per-input hold counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatTimer<D> {
    initial_delay: u32,
    rate: u32,
    held: Option<D>,
    ticks: u32,
}

impl<D: Copy + PartialEq> Default for RepeatTimer<D> {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_DELAY, DEFAULT_REPEAT_RATE)
    }
}

impl<D: Copy + PartialEq> RepeatTimer<D> {
    /// Create a timer. A `rate` of 0 is treated as 1.
    #[must_use]
    pub fn new(initial_delay: u32, rate: u32) -> Self {
        Self {
            initial_delay,
            rate: rate.max(1),
            held: None,
            ticks: 0,
        }
    }

    /// Advance one polling tick with the currently held input, returning the
    /// input when it should fire on this tick.
    pub fn tick(&mut self, input: Option<D>) -> Option<D> {
        let Some(current) = input else {
            self.reset();
            return None;
        };

        if self.held != Some(current) {
            self.held = Some(current);
            self.ticks = 0;
            return Some(current);
        }

        self.ticks = self.ticks.saturating_add(1);
        if self.ticks >= self.initial_delay && (self.ticks - self.initial_delay) % self.rate == 0 {
            Some(current)
        } else {
            None
        }
    }

    /// Forget the held input.
    pub fn reset(&mut self) {
        self.held = None;
        self.ticks = 0;
    }

    /// Currently held input.
    pub fn held(&self) -> Option<D> {
        self.held
    }

    /// Ticks since the held input was first seen.
    pub fn ticks_held(&self) -> u32 {
        self.ticks
    }
}
