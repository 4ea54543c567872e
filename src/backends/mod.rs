//! Hardware collaborators for `inputkit`.
//!
//! The devices in this crate never touch registers directly. They talk to the
//! board through three small traits:
//! - [`DigitalInput`]: a single input pin (`read_level`), polarity-agnostic.
//! - [`QuadratureCounter`]: a hardware (or software) quadrature decoder that
//!   maintains an absolute count. Devices only difference successive reads.
//! - [`Clock`]: monotonic time since boot, used for every debounce comparison.
//!
//! A [`Hal`] hands those out per pin number, which is what the
//! configuration layer ([`InputConfig::register`](crate::config::InputConfig::register))
//! uses to build devices from a config document.
//!
//! The [`virtual_input`] backend implements all of them in memory and is what the
//! test suite and the demo run against.

use std::time::{Duration, Instant};

pub mod virtual_input;

/// A single digital input line.
pub trait DigitalInput {
    /// Configure the line as an input, optionally with the internal pull-up enabled.
    ///
    /// Pin-mode setup is owned by the board layer; the default does nothing.
    fn configure(&mut self, _pull_up: bool) {}

    /// Read the raw electrical level (`true` = high).
    ///
    /// Active-low correction is applied by the device, not here.
    fn read_level(&mut self) -> bool;
}

/// An externally maintained absolute quadrature position.
pub trait QuadratureCounter {
    /// Bind the counter to its two phase pins.
    fn attach(&mut self, _pin_a: u8, _pin_b: u8, _pull_up: bool) {}

    /// Current absolute count.
    fn count(&self) -> i64;

    /// Reset the count to zero.
    fn clear_count(&mut self);

    /// Overwrite the count.
    fn set_count(&mut self, value: i64);
}

/// Monotonically non-decreasing time source.
pub trait Clock {
    /// Time elapsed since boot (or since the clock was created).
    fn now(&self) -> Duration;
}

/// Board factory: hands out collaborators by pin number.
pub trait Hal {
    /// Digital input for `pin`.
    fn input(&mut self, pin: u8) -> Box<dyn DigitalInput>;

    /// A quadrature counter instance (one per encoder).
    fn quadrature_counter(&mut self) -> Box<dyn QuadratureCounter>;

    /// The clock shared by every device built from this board.
    fn clock(&self) -> Box<dyn Clock>;
}

/// [`Clock`] backed by [`std::time::Instant`], counting from construction.
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }
}

impl<C: Clock + ?Sized> Clock for Box<C> {
    #[inline]
    fn now(&self) -> Duration {
        (**self).now()
    }
}

impl<D: DigitalInput + ?Sized> DigitalInput for Box<D> {
    fn configure(&mut self, pull_up: bool) {
        (**self).configure(pull_up)
    }

    #[inline]
    fn read_level(&mut self) -> bool {
        (**self).read_level()
    }
}

impl<Q: QuadratureCounter + ?Sized> QuadratureCounter for Box<Q> {
    fn attach(&mut self, pin_a: u8, pin_b: u8, pull_up: bool) {
        (**self).attach(pin_a, pin_b, pull_up)
    }

    fn count(&self) -> i64 {
        (**self).count()
    }

    fn clear_count(&mut self) {
        (**self).clear_count()
    }

    fn set_count(&mut self, value: i64) {
        (**self).set_count(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_clock_never_goes_backwards() {
        let clock = MonotonicClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    struct Toggle(bool);

    impl DigitalInput for Toggle {
        fn read_level(&mut self) -> bool {
            self.0 = !self.0;
            self.0
        }
    }

    #[test]
    fn boxed_inputs_forward_reads() {
        let mut input: Box<dyn DigitalInput> = Box::new(Toggle(false));
        input.configure(true);
        assert!(input.read_level());
        assert!(!input.read_level());
    }
}
