//! In-memory backend.
//!
//! Every handle here is a cheap clone around shared state: give one copy to a
//! device and keep the other to drive it. This is what the test suite and the
//! demo use in place of real GPIO and a hardware pulse counter.
//!
//! ```
//! use inputkit::backends::virtual_input::{VirtualClock, VirtualPin};
//! use inputkit::{Button, ButtonConfig, InputDevice};
//! use std::time::Duration;
//!
//! let pin = VirtualPin::new(true); // idle high, active-low wiring
//! let clock = VirtualClock::new();
//! let mut button = Button::new("fire", ButtonConfig::default(), pin.clone(), clock.clone());
//! button.initialize();
//!
//! pin.set_level(false);
//! button.update();
//! clock.advance(Duration::from_millis(51));
//! button.update();
//! assert!(button.was_pressed());
//! ```

use super::{Clock, DigitalInput, Hal, QuadratureCounter};
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

/// Simulated input pin.
#[derive(Clone, Debug, Default)]
pub struct VirtualPin {
    level: Rc<Cell<bool>>,
    pull_up: Rc<Cell<Option<bool>>>,
}

impl VirtualPin {
    /// New pin resting at `level`.
    pub fn new(level: bool) -> Self {
        Self {
            level: Rc::new(Cell::new(level)),
            pull_up: Rc::new(Cell::new(None)),
        }
    }

    /// Drive the electrical level seen by the next read.
    pub fn set_level(&self, level: bool) {
        self.level.set(level);
    }

    pub fn level(&self) -> bool {
        self.level.get()
    }

    /// Pull-up setting from the last `configure` call, `None` if never configured.
    pub fn pull_up(&self) -> Option<bool> {
        self.pull_up.get()
    }
}

impl DigitalInput for VirtualPin {
    fn configure(&mut self, pull_up: bool) {
        self.pull_up.set(Some(pull_up));
    }

    fn read_level(&mut self) -> bool {
        self.level.get()
    }
}

/// Simulated quadrature counter.
#[derive(Clone, Debug, Default)]
pub struct VirtualCounter {
    count: Rc<Cell<i64>>,
    attached: Rc<Cell<Option<(u8, u8)>>>,
}

impl VirtualCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate `steps` detents of rotation (negative = counter-clockwise).
    pub fn rotate(&self, steps: i64) {
        self.count.set(self.count.get().wrapping_add(steps));
    }

    /// Pins from the last `attach` call.
    pub fn attached_pins(&self) -> Option<(u8, u8)> {
        self.attached.get()
    }
}

impl QuadratureCounter for VirtualCounter {
    fn attach(&mut self, pin_a: u8, pin_b: u8, _pull_up: bool) {
        self.attached.set(Some((pin_a, pin_b)));
    }

    fn count(&self) -> i64 {
        self.count.get()
    }

    fn clear_count(&mut self) {
        self.count.set(0);
    }

    fn set_count(&mut self, value: i64) {
        self.count.set(value);
    }
}

/// Manually advanced clock.
#[derive(Clone, Debug, Default)]
pub struct VirtualClock {
    now: Rc<Cell<Duration>>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get().saturating_add(by));
    }

    /// Jump to an absolute time. Callers must keep it non-decreasing.
    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Simulated board.
///
/// Pins are created on first request and can be looked up afterwards to drive
/// them; counters are handed out in creation order.
#[derive(Clone, Debug, Default)]
pub struct VirtualHal {
    clock: VirtualClock,
    idle_level: bool,
    pins: HashMap<u8, VirtualPin>,
    counters: Vec<VirtualCounter>,
}

impl VirtualHal {
    /// Board whose pins rest at `idle_level` until driven.
    pub fn new(idle_level: bool) -> Self {
        Self {
            idle_level,
            ..Self::default()
        }
    }

    pub fn clock_handle(&self) -> &VirtualClock {
        &self.clock
    }

    /// Handle to an already requested pin.
    pub fn pin(&self, pin: u8) -> Option<&VirtualPin> {
        self.pins.get(&pin)
    }

    /// Handle to the `n`-th counter handed out.
    pub fn counter(&self, n: usize) -> Option<&VirtualCounter> {
        self.counters.get(n)
    }
}

impl Hal for VirtualHal {
    fn input(&mut self, pin: u8) -> Box<dyn DigitalInput> {
        let idle = self.idle_level;
        let handle = self
            .pins
            .entry(pin)
            .or_insert_with(|| VirtualPin::new(idle))
            .clone();
        Box::new(handle)
    }

    fn quadrature_counter(&mut self) -> Box<dyn QuadratureCounter> {
        let counter = VirtualCounter::new();
        self.counters.push(counter.clone());
        Box::new(counter)
    }

    fn clock(&self) -> Box<dyn Clock> {
        Box::new(self.clock.clone())
    }
}
