//! Absolute-count to per-poll delta tracking.
//!
//! A [`QuadratureTracker`] sits on top of a [`QuadratureCounter`] (the piece of
//! hardware, or ISR, that actually decodes the A/B phases) and turns its
//! absolute count into a signed delta per poll.
//!
//! ## Orientation
//! With `reversed` set, every count read from the counter is negated before it
//! is compared, and every position written back is negated before it is stored.
//! Positions handed to and returned from this type are therefore always in the
//! caller's orientation, and the sum of all reported deltas equals the change in
//! oriented position.

use crate::backends::QuadratureCounter;
use tracing::trace;

pub struct QuadratureTracker {
    counter: Box<dyn QuadratureCounter>,
    reversed: bool,
    last_position: i64,
    delta: i64,
    new_input: bool,
}

impl QuadratureTracker {
    pub fn new(counter: impl QuadratureCounter + 'static, reversed: bool) -> Self {
        let counter: Box<dyn QuadratureCounter> = Box::new(counter);
        Self {
            counter,
            reversed,
            last_position: 0,
            delta: 0,
            new_input: false,
        }
    }

    /// Attach the counter to its phase pins and start from zero.
    pub fn attach(&mut self, pin_a: u8, pin_b: u8, pull_up: bool) {
        self.counter.attach(pin_a, pin_b, pull_up);
        self.counter.clear_count();
        self.last_position = 0;
        self.delta = 0;
        self.new_input = false;
    }

    #[inline]
    fn orient(&self, raw: i64) -> i64 {
        if self.reversed {
            raw.wrapping_neg()
        } else {
            raw
        }
    }

    /// Sample the counter once.
    ///
    /// Returns the delta since the previous sample, zero if the position did not
    /// change. A non-zero delta also raises the new-input flag.
    pub fn update(&mut self) -> i64 {
        let position = self.orient(self.counter.count());
        let delta = position.wrapping_sub(self.last_position);
        self.delta = delta;
        if delta != 0 {
            self.last_position = position;
            self.new_input = true;
            trace!(position, delta, "quadrature moved");
        }
        delta
    }

    /// Oriented absolute position as currently reported by the counter.
    pub fn position(&self) -> i64 {
        self.orient(self.counter.count())
    }

    /// Delta observed by the most recent [`update`](Self::update).
    #[inline]
    pub fn delta(&self) -> i64 {
        self.delta
    }

    /// Zero the counter and the tracked position.
    pub fn reset_position(&mut self) {
        self.counter.clear_count();
        self.last_position = 0;
        self.delta = 0;
    }

    /// Seed counter and tracked position to `position` (caller orientation).
    pub fn set_position(&mut self, position: i64) {
        let raw = self.orient(position);
        self.counter.set_count(raw);
        self.last_position = position;
        self.delta = 0;
    }

    #[inline]
    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// Flip the direction convention.
    ///
    /// The tracked position is re-read in the new orientation, so the flip
    /// itself never shows up as movement.
    pub fn set_reversed(&mut self, reversed: bool) {
        self.reversed = reversed;
        self.last_position = self.orient(self.counter.count());
        self.delta = 0;
    }

    #[inline]
    pub fn has_new_input(&self) -> bool {
        self.new_input
    }

    pub fn clear_flags(&mut self) {
        self.new_input = false;
        self.delta = 0;
    }
}

impl std::fmt::Debug for QuadratureTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuadratureTracker")
            .field("reversed", &self.reversed)
            .field("last_position", &self.last_position)
            .field("delta", &self.delta)
            .field("new_input", &self.new_input)
            .finish_non_exhaustive()
    }
}
