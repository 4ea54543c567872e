//! Device registry.
//!
//! [`DeviceManager`] owns every input device on the board, keyed by id, and
//! drives them from the application's control loop:
//!
//! ```
//! use inputkit::backends::virtual_input::{VirtualClock, VirtualPin};
//! use inputkit::{Button, ButtonConfig, DeviceKind, DeviceManager};
//!
//! let clock = VirtualClock::new();
//! let mut io = DeviceManager::new();
//! io.add(Button::new("select", ButtonConfig::on_pin(14), VirtualPin::new(true), clock.clone()))
//!     .expect("unique id");
//! io.set_global_callback(|id: &str, kind: DeviceKind| println!("{id} ({kind}) has input"));
//! io.initialize();
//!
//! // once per loop iteration:
//! io.update();
//! if let Some(select) = io.button_mut("select") {
//!     if select.was_pressed() { /* ... */ }
//! }
//! ```
//!
//! # Ordering and identity
//! - Devices are updated, initialized and enumerated in insertion order.
//! - Ids are unique; adding a colliding id is rejected without touching the
//!   existing device. An id becomes free again only after `remove_device`.
//!
//! # Lifecycle
//! - Devices added before [`initialize`](DeviceManager::initialize) are
//!   initialized by it; devices added afterwards are initialized on insertion.
//! - `update()` does nothing until the manager is initialized.
//! - Removed devices are shut down before they are dropped.
//!
//! # Fan-out
//! After each device's own `update()`, the global listener is invoked with
//! `(id, kind)` if the device reports new input. The listener never clears
//! flags; call the device's read-and-clear accessors or
//! [`clear_all_input_flags`](DeviceManager::clear_all_input_flags).

use crate::button::Button;
use crate::device::{AnyDevice, DeviceKind, DeviceVariant, InputDevice};
use crate::error::{Error, Result};
use crate::listener::InputListener;
use crate::rotary_encoder::RotaryEncoder;
use crate::snapshot::{DeviceState, Snapshot};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

#[derive(Default)]
pub struct DeviceManager {
    devices: Vec<AnyDevice>,
    index: HashMap<String, usize>,
    initialized: bool,
    listener: Option<Box<dyn InputListener>>,
}

impl DeviceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device of a concrete kind and get a typed handle back.
    pub fn add<D: DeviceVariant>(&mut self, device: D) -> Result<&mut D> {
        let id = device.id().to_owned();
        let slot = self.insert(device.into_any())?;
        D::from_any_mut(&mut self.devices[slot]).ok_or(Error::UnknownDevice(id))
    }

    /// Register any device, including custom [`InputDevice`] implementations.
    ///
    /// Fails with [`Error::DuplicateId`] if the id is taken; nothing is changed
    /// in that case.
    pub fn add_device(&mut self, device: impl Into<AnyDevice>) -> Result<&mut dyn InputDevice> {
        let slot = self.insert(device.into())?;
        Ok(self.devices[slot].as_dyn_mut())
    }

    fn insert(&mut self, mut device: AnyDevice) -> Result<usize> {
        let id = device.id().to_owned();
        if self.index.contains_key(&id) {
            warn!(id = %id, "rejected device with duplicate id");
            return Err(Error::DuplicateId(id));
        }

        if self.initialized {
            device.initialize();
        }
        debug!(id = %id, kind = %device.kind(), initialized = device.is_initialized(), "device added");

        let slot = self.devices.len();
        self.devices.push(device);
        self.index.insert(id, slot);
        Ok(slot)
    }

    /// Shut down and drop the device with `id`. `false` if there is none.
    pub fn remove_device(&mut self, id: &str) -> bool {
        let Some(slot) = self.index.remove(id) else {
            return false;
        };
        let mut device = self.devices.remove(slot);
        device.shutdown();
        self.reindex();
        debug!(id = %id, remaining = self.devices.len(), "device removed");
        true
    }

    /// Rebuild `id → position` after positions shifted.
    fn reindex(&mut self) {
        self.index.clear();
        for (slot, device) in self.devices.iter().enumerate() {
            self.index.insert(device.id().to_owned(), slot);
        }
    }

    pub fn get_device(&self, id: &str) -> Option<&AnyDevice> {
        self.index.get(id).and_then(|&slot| self.devices.get(slot))
    }

    /// Mutable access through the device interface.
    ///
    /// Devices are handed out as trait objects so the entry itself cannot be
    /// swapped for one with a different id.
    pub fn get_device_mut(&mut self, id: &str) -> Option<&mut dyn InputDevice> {
        self.slot_mut(id).map(AnyDevice::as_dyn_mut)
    }

    fn slot_mut(&mut self, id: &str) -> Option<&mut AnyDevice> {
        let slot = *self.index.get(id)?;
        self.devices.get_mut(slot)
    }

    pub fn has_device(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Typed lookup; `None` if the id is unknown or names another kind.
    pub fn get<D: DeviceVariant>(&self, id: &str) -> Option<&D> {
        self.get_device(id).and_then(D::from_any)
    }

    pub fn get_mut<D: DeviceVariant>(&mut self, id: &str) -> Option<&mut D> {
        self.slot_mut(id).and_then(D::from_any_mut)
    }

    pub fn button(&self, id: &str) -> Option<&Button> {
        self.get(id)
    }

    pub fn button_mut(&mut self, id: &str) -> Option<&mut Button> {
        self.get_mut(id)
    }

    pub fn rotary_encoder(&self, id: &str) -> Option<&RotaryEncoder> {
        self.get(id)
    }

    pub fn rotary_encoder_mut(&mut self, id: &str) -> Option<&mut RotaryEncoder> {
        self.get_mut(id)
    }

    /// Every device of variant `D`, in insertion order.
    ///
    /// Matches on the [`AnyDevice`] arm, not on [`InputDevice::kind`]: a custom
    /// device reporting [`DeviceKind::Button`] is not a [`Button`] here. Use
    /// [`devices_of_kind`](Self::devices_of_kind) to select by tag.
    ///
    /// The returned vector is a snapshot; it does not follow later additions
    /// or removals.
    pub fn devices_of_type<D: DeviceVariant>(&self) -> Vec<&D> {
        self.devices.iter().filter_map(D::from_any).collect()
    }

    /// Mutable counterpart of [`devices_of_type`](Self::devices_of_type).
    pub fn devices_of_type_mut<D: DeviceVariant>(&mut self) -> Vec<&mut D> {
        self.devices.iter_mut().filter_map(D::from_any_mut).collect()
    }

    /// Every device whose tag is `kind`, including custom devices that report
    /// one of the built-in tags.
    pub fn devices_of_kind(&self, kind: DeviceKind) -> Vec<&AnyDevice> {
        self.devices.iter().filter(|d| d.kind() == kind).collect()
    }

    /// Built-in [`Button`]s only; see [`devices_of_type`](Self::devices_of_type).
    pub fn buttons(&self) -> Vec<&Button> {
        self.devices_of_type()
    }

    pub fn rotary_encoders(&self) -> Vec<&RotaryEncoder> {
        self.devices_of_type()
    }

    pub fn devices(&self) -> impl Iterator<Item = &AnyDevice> {
        self.devices.iter()
    }

    pub fn devices_mut(&mut self) -> impl Iterator<Item = &mut dyn InputDevice> {
        self.devices.iter_mut().map(AnyDevice::as_dyn_mut)
    }

    pub fn device_ids(&self) -> Vec<&str> {
        self.devices.iter().map(|d| d.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Initialize every device (insertion order). Idempotent.
    pub fn initialize(&mut self) {
        if self.initialized {
            return;
        }
        for device in &mut self.devices {
            device.initialize();
        }
        self.initialized = true;
        debug!(devices = self.devices.len(), "device manager initialized");
    }

    /// Shut every device down and stop updating. Devices stay registered.
    pub fn shutdown(&mut self) {
        if !self.initialized {
            return;
        }
        for device in &mut self.devices {
            device.shutdown();
        }
        self.initialized = false;
        debug!("device manager shut down");
    }

    /// Run one polling cycle.
    ///
    /// Each device is updated in insertion order; the global listener is then
    /// told about it if it has unread input.
    pub fn update(&mut self) {
        if !self.initialized {
            return;
        }
        for device in &mut self.devices {
            device.update();
            if device.has_new_input() {
                if let Some(listener) = self.listener.as_mut() {
                    listener.on_input(device.id(), device.kind());
                }
            }
        }
    }

    /// `true` iff any owned device has unread input.
    pub fn has_new_input(&self) -> bool {
        self.devices.iter().any(|d| d.has_new_input())
    }

    pub fn clear_all_input_flags(&mut self) {
        for device in &mut self.devices {
            device.clear_input_flags();
        }
    }

    /// Install the process-wide listener. Replaces any previous one.
    ///
    /// Closures `FnMut(&str, DeviceKind)` work directly.
    pub fn set_global_callback(&mut self, listener: impl InputListener + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn clear_global_callback(&mut self) {
        self.listener = None;
    }

    /// Owned view of every device's readable state.
    ///
    /// Edge flags are reported as pending, not consumed.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.devices.iter().map(DeviceState::capture).collect())
    }
}

impl fmt::Debug for DeviceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceManager")
            .field("devices", &self.devices)
            .field("initialized", &self.initialized)
            .field("has_listener", &self.listener.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::virtual_input::{VirtualClock, VirtualCounter, VirtualPin};
    use crate::config::{ButtonConfig, RotaryEncoderConfig};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    fn button(id: &str, pin: &VirtualPin, clock: &VirtualClock) -> Button {
        Button::new(id, ButtonConfig::default(), pin.clone(), clock.clone())
    }

    fn encoder(id: &str, counter: &VirtualCounter, clock: &VirtualClock) -> RotaryEncoder {
        let config = RotaryEncoderConfig {
            button: None,
            ..RotaryEncoderConfig::default()
        };
        RotaryEncoder::new(id, config, counter.clone(), None::<VirtualPin>, clock.clone())
    }

    #[test]
    fn duplicate_ids_are_rejected_without_side_effects() {
        let clock = VirtualClock::new();
        let pin = VirtualPin::new(true);
        let counter = VirtualCounter::new();
        let mut io = DeviceManager::new();
        io.add(button("a", &pin, &clock)).unwrap();
        io.add(button("b", &pin, &clock)).unwrap();

        let err = io.add(encoder("a", &counter, &clock)).unwrap_err();
        assert!(matches!(err, Error::DuplicateId(ref id) if id == "a"));
        assert_eq!(io.len(), 2);
        assert_eq!(io.get_device("a").map(|d| d.kind()), Some(DeviceKind::Button));
        assert_eq!(io.device_ids(), vec!["a", "b"]);
    }

    #[test]
    fn removal_keeps_lookups_consistent() {
        let clock = VirtualClock::new();
        let pin = VirtualPin::new(true);
        let mut io = DeviceManager::new();
        for id in ["a", "b", "c", "d"] {
            io.add(button(id, &pin, &clock)).unwrap();
        }
        io.initialize();

        assert!(io.remove_device("b"));
        assert!(!io.remove_device("b"));
        assert!(!io.has_device("b"));
        for id in ["a", "c", "d"] {
            assert_eq!(io.get_device(id).map(|d| d.id()), Some(id));
        }

        // A removed id may be reused.
        io.add(button("b", &pin, &clock)).unwrap();
        assert_eq!(io.device_ids(), vec!["a", "c", "d", "b"]);
    }

    #[test]
    fn late_additions_are_initialized_immediately() {
        let clock = VirtualClock::new();
        let pin = VirtualPin::new(true);
        let mut io = DeviceManager::new();
        let early = io.add(button("early", &pin, &clock)).unwrap();
        assert!(!early.is_initialized());

        io.initialize();
        assert!(io.button("early").is_some_and(|b| b.is_initialized()));

        let late = io.add(button("late", &pin, &clock)).unwrap();
        assert!(late.is_initialized());
    }

    #[test]
    fn update_requires_initialize() {
        let clock = VirtualClock::new();
        let counter = VirtualCounter::new();
        let mut io = DeviceManager::new();
        io.add(encoder("e", &counter, &clock)).unwrap();
        counter.rotate(3);
        io.update();
        assert!(!io.has_new_input());
    }

    #[test]
    fn global_callback_fires_once_per_device_per_cycle() {
        let clock = VirtualClock::new();
        let pin = VirtualPin::new(true);
        let counter = VirtualCounter::new();
        let mut io = DeviceManager::new();
        io.add(button("a", &pin, &clock)).unwrap();
        io.add(encoder("e", &counter, &clock)).unwrap();

        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = calls.clone();
        io.set_global_callback(move |id: &str, kind: DeviceKind| {
            sink.borrow_mut().push((id.to_owned(), kind));
        });
        io.initialize();

        pin.set_level(false);
        io.update();
        clock.advance(Duration::from_millis(51));
        counter.rotate(1);
        io.update();

        assert_eq!(
            *calls.borrow(),
            vec![
                ("a".to_owned(), DeviceKind::Button),
                ("e".to_owned(), DeviceKind::RotaryEncoder),
            ]
        );
        assert!(io.has_new_input());
        io.clear_all_input_flags();
        assert!(!io.has_new_input());
    }

    #[test]
    fn typed_queries_filter_by_variant() {
        let clock = VirtualClock::new();
        let pin = VirtualPin::new(true);
        let counter = VirtualCounter::new();
        let mut io = DeviceManager::new();
        io.add(button("b1", &pin, &clock)).unwrap();
        io.add(encoder("e1", &counter, &clock)).unwrap();
        io.add(button("b2", &pin, &clock)).unwrap();

        let buttons: Vec<&str> = io.buttons().iter().map(|b| b.id()).collect();
        assert_eq!(buttons, vec!["b1", "b2"]);
        assert_eq!(io.rotary_encoders().len(), 1);
        assert_eq!(io.devices_of_kind(DeviceKind::Button).len(), 2);
        assert!(io.rotary_encoder("b1").is_none());
        assert!(io.button_mut("b2").is_some());
        assert_eq!(io.devices_of_type_mut::<Button>().len(), 2);
    }

    #[test]
    fn untyped_handles_cannot_change_ids() {
        let clock = VirtualClock::new();
        let pin = VirtualPin::new(true);
        let counter = VirtualCounter::new();
        let mut io = DeviceManager::new();
        io.add_device(button("a", &pin, &clock)).unwrap().initialize();
        io.add(encoder("b", &counter, &clock)).unwrap();

        if let Some(a) = io.get_device_mut("a") {
            a.shutdown();
        }
        for device in io.devices_mut() {
            device.initialize();
            device.clear_input_flags();
        }

        assert_eq!(io.device_ids(), vec!["a", "b"]);
        assert_eq!(io.get_device("a").map(|d| d.id()), Some("a"));
        assert_eq!(io.get_device("b").map(|d| d.kind()), Some(DeviceKind::RotaryEncoder));
        assert!(io.devices().all(|d| d.is_initialized()));
    }

    #[test]
    fn restart_keeps_unread_edges() {
        let clock = VirtualClock::new();
        let pin = VirtualPin::new(true);
        let mut io = DeviceManager::new();
        io.add(button("a", &pin, &clock)).unwrap();
        io.initialize();

        pin.set_level(false);
        io.update();
        clock.advance(Duration::from_millis(51));
        io.update();

        io.shutdown();
        io.initialize();
        assert!(io.has_new_input());
        let a = io.button_mut("a").unwrap();
        assert!(a.is_pressed());
        assert!(a.was_pressed());
    }

    #[test]
    fn shutdown_stops_devices() {
        let clock = VirtualClock::new();
        let pin = VirtualPin::new(true);
        let mut io = DeviceManager::new();
        io.add(button("a", &pin, &clock)).unwrap();
        io.initialize();
        io.shutdown();
        assert!(!io.is_initialized());
        assert!(io.devices().all(|d| !d.is_initialized()));

        io.initialize();
        assert!(io.devices().all(|d| d.is_initialized()));
    }
}
