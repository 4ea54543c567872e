//! Rotary encoder with an optional shaft push switch.

use crate::backends::{Clock, DigitalInput, QuadratureCounter};
use crate::config::RotaryEncoderConfig;
use crate::debounce::Debouncer;
use crate::device::{DeviceKind, InputDevice};
use crate::event::{ButtonCallback, DeltaCallback};
use crate::quadrature::QuadratureTracker;
use std::fmt;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// The encoder's push switch: pin plus its debouncer.
struct Switch {
    pin: Box<dyn DigitalInput>,
    active_low: bool,
    pull_up: bool,
    debouncer: Debouncer,
}

impl Switch {
    fn read_raw(&mut self) -> bool {
        self.pin.read_level() != self.active_low
    }
}

/// Incremental rotary encoder.
///
/// Rotation is read from a [`QuadratureCounter`]; each `update()` reports the
/// signed change since the previous poll. If the config declares a push switch
/// *and* a pin is supplied for it, that switch is debounced exactly like a
/// [`Button`](crate::button::Button).
///
/// `has_new_input()` is raised by either movement or a switch edge;
/// `clear_input_flags()` clears both.
pub struct RotaryEncoder {
    id: String,
    config: RotaryEncoderConfig,
    tracker: QuadratureTracker,
    switch: Option<Switch>,
    clock: Box<dyn Clock>,
    initialized: bool,
    encoder_callback: Option<DeltaCallback>,
    button_callback: Option<ButtonCallback>,
}

impl RotaryEncoder {
    pub fn new(
        id: impl Into<String>,
        mut config: RotaryEncoderConfig,
        counter: impl QuadratureCounter + 'static,
        button_pin: Option<impl DigitalInput + 'static>,
        clock: impl Clock + 'static,
    ) -> Self {
        let id = id.into();
        let switch = match (config.button.clone(), button_pin) {
            (Some(button), Some(pin)) => Some(Switch {
                pin: Box::new(pin),
                active_low: button.active_low,
                pull_up: button.enable_pullup,
                debouncer: Debouncer::new(button.debounce),
            }),
            (Some(_), None) => {
                warn!(id = %id, "encoder switch configured but no pin supplied; ignoring switch");
                config.button = None;
                None
            }
            (None, _) => None,
        };
        Self {
            tracker: QuadratureTracker::new(counter, config.reversed),
            id,
            config,
            switch,
            clock: Box::new(clock),
            initialized: false,
            encoder_callback: None,
            button_callback: None,
        }
    }

    /// Absolute position in the configured direction; zero before initialization.
    pub fn position(&self) -> i64 {
        if self.initialized {
            self.tracker.position()
        } else {
            0
        }
    }

    /// Movement observed by the most recent `update()`.
    #[inline]
    pub fn delta(&self) -> i64 {
        self.tracker.delta()
    }

    /// Zero the position. Does not fire the encoder callback.
    pub fn reset_position(&mut self) {
        if self.initialized {
            self.tracker.reset_position();
        }
    }

    /// Jump to `position` without firing the encoder callback.
    pub fn set_position(&mut self, position: i64) {
        if self.initialized {
            self.tracker.set_position(position);
        }
    }

    #[inline]
    pub fn has_button(&self) -> bool {
        self.switch.is_some()
    }

    /// Debounced switch state; always `false` without a switch.
    pub fn is_button_pressed(&self) -> bool {
        self.switch.as_ref().is_some_and(|s| s.debouncer.is_active())
    }

    /// Read-and-clear switch press edge.
    pub fn was_button_pressed(&mut self) -> bool {
        self.switch
            .as_mut()
            .is_some_and(|s| s.debouncer.was_pressed())
    }

    /// Read-and-clear switch release edge.
    pub fn was_button_released(&mut self) -> bool {
        self.switch
            .as_mut()
            .is_some_and(|s| s.debouncer.was_released())
    }

    /// How long the switch has been held; zero while released or absent.
    pub fn button_pressed_duration(&self) -> Duration {
        self.switch
            .as_ref()
            .map_or(Duration::ZERO, |s| s.debouncer.active_duration(self.clock.now()))
    }

    pub fn set_reversed(&mut self, reversed: bool) {
        self.config.reversed = reversed;
        self.tracker.set_reversed(reversed);
    }

    pub fn set_button_debounce(&mut self, window: Duration) {
        if let Some(button) = self.config.button.as_mut() {
            button.debounce = window;
        }
        if let Some(switch) = self.switch.as_mut() {
            switch.debouncer.set_window(window);
        }
    }

    /// Subscribe to movement. Replaces any previous callback.
    pub fn set_encoder_callback(&mut self, callback: impl FnMut(i64) + 'static) {
        self.encoder_callback = Some(Box::new(callback));
    }

    /// Subscribe to switch edges. Replaces any previous callback.
    pub fn set_button_callback(&mut self, callback: impl FnMut(bool) + 'static) {
        self.button_callback = Some(Box::new(callback));
    }

    pub fn config(&self) -> &RotaryEncoderConfig {
        &self.config
    }
}

impl InputDevice for RotaryEncoder {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::RotaryEncoder
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn initialize(&mut self) -> bool {
        if self.initialized {
            return true;
        }
        let cfg = &self.config;
        self.tracker.attach(cfg.pin_a, cfg.pin_b, cfg.enable_pullups);
        if let Some(switch) = self.switch.as_mut() {
            switch.pin.configure(switch.pull_up);
            let raw = switch.read_raw();
            switch.debouncer.seed(raw, self.clock.now());
        }
        self.initialized = true;
        debug!(
            id = %self.id,
            pin_a = cfg.pin_a,
            pin_b = cfg.pin_b,
            switch = self.switch.is_some(),
            "rotary encoder initialized"
        );
        true
    }

    fn shutdown(&mut self) {
        self.initialized = false;
    }

    fn update(&mut self) {
        if !self.initialized {
            return;
        }

        let delta = self.tracker.update();
        if delta != 0 {
            if let Some(cb) = self.encoder_callback.as_mut() {
                cb(delta);
            }
        }

        if let Some(switch) = self.switch.as_mut() {
            let now = self.clock.now();
            let raw = switch.read_raw();
            if let Some(edge) = switch.debouncer.sample(raw, now) {
                trace!(id = %self.id, ?edge, "encoder switch edge");
                if let Some(cb) = self.button_callback.as_mut() {
                    cb(edge.level());
                }
            }
        }
    }

    fn has_new_input(&self) -> bool {
        self.tracker.has_new_input()
            || self
                .switch
                .as_ref()
                .is_some_and(|s| s.debouncer.has_new_input())
    }

    fn clear_input_flags(&mut self) {
        self.tracker.clear_flags();
        if let Some(switch) = self.switch.as_mut() {
            switch.debouncer.clear_flags();
        }
    }
}

impl fmt::Debug for RotaryEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RotaryEncoder")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("initialized", &self.initialized)
            .field("tracker", &self.tracker)
            .field("switch", &self.switch.as_ref().map(|s| &s.debouncer))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::virtual_input::{VirtualClock, VirtualCounter, VirtualPin};
    use crate::config::ButtonConfig;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Rig {
        encoder: RotaryEncoder,
        counter: VirtualCounter,
        pin: VirtualPin,
        clock: VirtualClock,
    }

    fn rig(config: RotaryEncoderConfig) -> Rig {
        let counter = VirtualCounter::new();
        let pin = VirtualPin::new(true);
        let clock = VirtualClock::new();
        let encoder = RotaryEncoder::new(
            "enc",
            config,
            counter.clone(),
            Some(pin.clone()),
            clock.clone(),
        );
        Rig {
            encoder,
            counter,
            pin,
            clock,
        }
    }

    #[test]
    fn rotation_fires_delta_callback() {
        let mut r = rig(RotaryEncoderConfig::default());
        let deltas = Rc::new(RefCell::new(Vec::new()));
        let sink = deltas.clone();
        r.encoder.set_encoder_callback(move |d| sink.borrow_mut().push(d));
        r.encoder.initialize();
        assert_eq!(r.counter.attached_pins(), Some((32, 33)));

        r.counter.rotate(2);
        r.encoder.update();
        r.encoder.update();
        r.counter.rotate(-5);
        r.encoder.update();

        assert_eq!(*deltas.borrow(), vec![2, -5]);
        assert_eq!(r.encoder.position(), -3);
        assert_eq!(r.encoder.delta(), -5);
        assert!(r.encoder.has_new_input());
    }

    #[test]
    fn set_and_reset_position_are_silent() {
        let mut r = rig(RotaryEncoderConfig::default());
        let fired = Rc::new(RefCell::new(0));
        let sink = fired.clone();
        r.encoder.set_encoder_callback(move |_| *sink.borrow_mut() += 1);
        r.encoder.initialize();

        r.encoder.set_position(100);
        r.encoder.update();
        assert_eq!(r.encoder.position(), 100);
        r.encoder.reset_position();
        r.encoder.update();
        assert_eq!(r.encoder.position(), 0);
        assert_eq!(*fired.borrow(), 0);
        assert!(!r.encoder.has_new_input());
    }

    #[test]
    fn reversed_encoder_negates_direction() {
        let config = RotaryEncoderConfig {
            reversed: true,
            ..RotaryEncoderConfig::default()
        };
        let mut r = rig(config);
        r.encoder.initialize();
        r.counter.rotate(4);
        r.encoder.update();
        assert_eq!(r.encoder.delta(), -4);
        assert_eq!(r.encoder.position(), -4);

        r.encoder.set_reversed(false);
        r.encoder.update();
        assert_eq!(r.encoder.delta(), 0);
        assert_eq!(r.encoder.position(), 4);
    }

    #[test]
    fn switch_is_debounced_and_flags_combine() {
        let mut r = rig(RotaryEncoderConfig::default());
        let edges = Rc::new(RefCell::new(Vec::new()));
        let sink = edges.clone();
        r.encoder.set_button_callback(move |p| sink.borrow_mut().push(p));
        r.encoder.initialize();
        assert_eq!(r.pin.pull_up(), Some(true));

        r.pin.set_level(false);
        r.encoder.update();
        r.clock.advance(Duration::from_millis(51));
        r.encoder.update();

        assert!(r.encoder.is_button_pressed());
        assert!(r.encoder.has_new_input());
        assert_eq!(*edges.borrow(), vec![true]);

        r.counter.rotate(1);
        r.encoder.update();
        r.encoder.clear_input_flags();
        assert!(!r.encoder.has_new_input());
        assert!(!r.encoder.was_button_pressed());
        assert_eq!(r.encoder.delta(), 0);
        assert!(r.encoder.is_button_pressed());
    }

    #[test]
    fn encoder_without_switch() {
        let config = RotaryEncoderConfig {
            button: None,
            ..RotaryEncoderConfig::default()
        };
        let mut r = rig(config);
        r.encoder.initialize();
        r.pin.set_level(false);
        r.clock.advance(Duration::from_secs(1));
        r.encoder.update();
        r.clock.advance(Duration::from_secs(1));
        r.encoder.update();

        assert!(!r.encoder.has_button());
        assert!(!r.encoder.is_button_pressed());
        assert!(!r.encoder.was_button_pressed());
        assert!(!r.encoder.has_new_input());
    }

    #[test]
    fn switch_config_without_pin_is_dropped() {
        let encoder = RotaryEncoder::new(
            "enc",
            RotaryEncoderConfig::default(),
            VirtualCounter::new(),
            None::<VirtualPin>,
            VirtualClock::new(),
        );
        assert!(!encoder.has_button());
        assert!(encoder.config().button.is_none());
    }

    #[test]
    fn accessors_are_inert_before_initialize() {
        let mut r = rig(RotaryEncoderConfig::default());
        r.counter.rotate(3);
        r.encoder.update();
        r.encoder.set_position(50);
        assert_eq!(r.encoder.position(), 0);
        assert_eq!(r.encoder.delta(), 0);
        assert!(!r.encoder.has_new_input());
    }

    #[test]
    fn button_debounce_can_be_tuned() {
        let config = RotaryEncoderConfig {
            button: Some(ButtonConfig::on_pin(4)),
            ..RotaryEncoderConfig::default()
        };
        let mut r = rig(config);
        r.encoder.set_button_debounce(Duration::from_millis(5));
        r.encoder.initialize();
        r.pin.set_level(false);
        r.encoder.update();
        r.clock.advance(Duration::from_millis(6));
        r.encoder.update();
        assert!(r.encoder.was_button_pressed());
        assert_eq!(
            r.encoder.config().button.as_ref().map(|b| b.debounce),
            Some(Duration::from_millis(5))
        );
    }
}
