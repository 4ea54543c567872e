//! Debounced push button.

use crate::backends::{Clock, DigitalInput};
use crate::config::ButtonConfig;
use crate::debounce::Debouncer;
use crate::device::{DeviceKind, InputDevice};
use crate::event::ButtonCallback;
use std::fmt;
use std::time::Duration;
use tracing::{debug, trace};

/// A single momentary switch on one input pin.
///
/// Polarity is applied here: with `active_low` set (the usual pull-up wiring),
/// a low electrical level reads as pressed.
pub struct Button {
    id: String,
    config: ButtonConfig,
    pin: Box<dyn DigitalInput>,
    clock: Box<dyn Clock>,
    debouncer: Debouncer,
    initialized: bool,
    callback: Option<ButtonCallback>,
}

impl Button {
    pub fn new(
        id: impl Into<String>,
        config: ButtonConfig,
        pin: impl DigitalInput + 'static,
        clock: impl Clock + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            debouncer: Debouncer::new(config.debounce),
            config,
            pin: Box::new(pin),
            clock: Box::new(clock),
            initialized: false,
            callback: None,
        }
    }

    fn read_raw(&mut self) -> bool {
        let level = self.pin.read_level();
        level != self.config.active_low
    }

    /// Debounced logical state.
    #[inline]
    pub fn is_pressed(&self) -> bool {
        self.debouncer.is_active()
    }

    /// Read-and-clear press edge.
    pub fn was_pressed(&mut self) -> bool {
        self.debouncer.was_pressed()
    }

    /// Read-and-clear release edge.
    pub fn was_released(&mut self) -> bool {
        self.debouncer.was_released()
    }

    /// How long the button has been held; zero while released.
    pub fn pressed_duration(&self) -> Duration {
        self.debouncer.active_duration(self.clock.now())
    }

    /// How long the button has been released; zero while held.
    pub fn released_duration(&self) -> Duration {
        self.debouncer.inactive_duration(self.clock.now())
    }

    pub fn set_debounce(&mut self, window: Duration) {
        self.config.debounce = window;
        self.debouncer.set_window(window);
    }

    /// Subscribe to committed edges. Replaces any previous callback.
    pub fn set_callback(&mut self, callback: impl FnMut(bool) + 'static) {
        self.callback = Some(Box::new(callback));
    }

    pub fn config(&self) -> &ButtonConfig {
        &self.config
    }
}

impl InputDevice for Button {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::Button
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn initialize(&mut self) -> bool {
        if self.initialized {
            return true;
        }
        self.pin.configure(self.config.enable_pullup);
        let raw = self.read_raw();
        self.debouncer.seed(raw, self.clock.now());
        self.initialized = true;
        debug!(id = %self.id, pin = self.config.pin, pressed = raw, "button initialized");
        true
    }

    fn shutdown(&mut self) {
        self.initialized = false;
    }

    fn update(&mut self) {
        if !self.initialized {
            return;
        }
        let now = self.clock.now();
        let raw = self.read_raw();
        if let Some(edge) = self.debouncer.sample(raw, now) {
            trace!(id = %self.id, ?edge, "button edge");
            if let Some(cb) = self.callback.as_mut() {
                cb(edge.level());
            }
        }
    }

    fn has_new_input(&self) -> bool {
        self.debouncer.has_new_input()
    }

    fn clear_input_flags(&mut self) {
        self.debouncer.clear_flags();
    }
}

impl fmt::Debug for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Button")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("initialized", &self.initialized)
            .field("debouncer", &self.debouncer)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}
