//! Per-cycle snapshot of device state.
//!
//! [`Snapshot`] is an **owned**, read-only view of every registered device at a
//! point in time (typically "after this cycle's `update()`"). It is produced by
//! [`DeviceManager::snapshot`](crate::manager::DeviceManager::snapshot), is
//! cheap to clone, and serializes to JSON for diagnostics or a host link.
//!
//! # Semantics
//! - Entries are in manager insertion order.
//! - Pending edges are *reported*, not consumed: taking a snapshot never
//!   clears a read-and-clear flag.
//! - A snapshot does not poll; it reflects the last `update()`.
//!
//! ```
//! use inputkit::DeviceManager;
//!
//! let io = DeviceManager::new();
//! let json = io.snapshot().to_json().unwrap();
//! assert_eq!(json, "{\"devices\":[]}");
//! ```

use crate::device::{AnyDevice, DeviceKind, InputDevice};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Readable state of a single device.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceState {
    pub id: String,
    pub kind: DeviceKind,
    pub initialized: bool,
    pub has_new_input: bool,
    /// Debounced button (or encoder switch) state, if the device has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressed: Option<bool>,
    /// Oriented encoder position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
    /// Delta from the last `update()`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<i64>,
}

impl DeviceState {
    pub fn capture(device: &AnyDevice) -> Self {
        let (pressed, position, delta) = match device {
            AnyDevice::Button(b) => (Some(b.is_pressed()), None, None),
            AnyDevice::RotaryEncoder(e) => (
                e.has_button().then(|| e.is_button_pressed()),
                Some(e.position()),
                Some(e.delta()),
            ),
            AnyDevice::Custom(_) => (None, None, None),
        };
        Self {
            id: device.id().to_owned(),
            kind: device.kind(),
            initialized: device.is_initialized(),
            has_new_input: device.has_new_input(),
            pressed,
            position,
            delta,
        }
    }
}

/// Owned snapshot of every device's state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    devices: Vec<DeviceState>,
}

impl Snapshot {
    pub fn new(devices: Vec<DeviceState>) -> Self {
        Self { devices }
    }

    /// State for a specific device id.
    pub fn get(&self, device_id: &str) -> Option<&DeviceState> {
        self.devices.iter().find(|d| d.id == device_id)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &DeviceState> {
        self.devices.iter()
    }

    /// Devices with unread input at capture time.
    pub fn with_new_input(&self) -> impl Iterator<Item = &DeviceState> {
        self.devices.iter().filter(|d| d.has_new_input)
    }

    #[inline]
    pub fn into_inner(self) -> Vec<DeviceState> {
        self.devices
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
