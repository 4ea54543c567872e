//! Device interface and the closed set of device kinds.
//!
//! Every input source implements [`InputDevice`]: a lifecycle
//! (`initialize`/`shutdown`), one polled sampling step (`update`), and the
//! new-input flag protocol (`has_new_input`/`clear_input_flags`).
//!
//! The [`DeviceManager`](crate::manager::DeviceManager) stores devices as
//! [`AnyDevice`], a sum type over the kinds this crate ships plus a `Custom`
//! arm for user implementations. Typed queries (`get::<Button>`,
//! `devices_of_type::<RotaryEncoder>`) go through [`DeviceVariant`], which
//! matches on the arm instead of inspecting runtime type identity.

use crate::button::Button;
use crate::rotary_encoder::RotaryEncoder;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Variant tag identifying which kind of device an instance is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Button,
    RotaryEncoder,
    Joystick,
    Potentiometer,
    Custom,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeviceKind::Button => "button",
            DeviceKind::RotaryEncoder => "rotary_encoder",
            DeviceKind::Joystick => "joystick",
            DeviceKind::Potentiometer => "potentiometer",
            DeviceKind::Custom => "custom",
        })
    }
}

/// Capability contract for polled input devices.
///
/// # Sequencing
/// - `initialize` and `shutdown` are idempotent.
/// - `update` on a device that is not initialized is a silent no-op.
/// - Edge and delta flags stay raised until read through the device's typed
///   accessors or cleared in bulk with `clear_input_flags`.
pub trait InputDevice {
    /// Stable identifier, unique within a manager.
    fn id(&self) -> &str;

    fn kind(&self) -> DeviceKind;

    fn is_initialized(&self) -> bool;

    /// One-time hardware setup; seeds internal state from the first raw read.
    ///
    /// Returns `true` once the device is ready (including when it already was).
    fn initialize(&mut self) -> bool;

    /// Mark the device inactive. No hardware teardown is implied.
    fn shutdown(&mut self);

    /// One sampling step. Fires per-device callbacks on transitions.
    fn update(&mut self);

    /// `true` iff an edge or delta is pending and unread.
    fn has_new_input(&self) -> bool;

    /// Drop every pending edge/delta flag without touching stable state.
    fn clear_input_flags(&mut self);
}

/// A device owned by the manager.
pub enum AnyDevice {
    Button(Button),
    RotaryEncoder(RotaryEncoder),
    /// Any other [`InputDevice`] (joysticks, potentiometers, bespoke sensors).
    Custom(Box<dyn InputDevice>),
}

impl AnyDevice {
    pub fn as_dyn(&self) -> &dyn InputDevice {
        match self {
            AnyDevice::Button(b) => b,
            AnyDevice::RotaryEncoder(e) => e,
            AnyDevice::Custom(d) => d.as_ref(),
        }
    }

    pub fn as_dyn_mut(&mut self) -> &mut dyn InputDevice {
        match self {
            AnyDevice::Button(b) => b,
            AnyDevice::RotaryEncoder(e) => e,
            AnyDevice::Custom(d) => d.as_mut(),
        }
    }

    /// Typed view, `None` if this device is a different variant.
    #[inline]
    pub fn downcast_ref<D: DeviceVariant>(&self) -> Option<&D> {
        D::from_any(self)
    }

    #[inline]
    pub fn downcast_mut<D: DeviceVariant>(&mut self) -> Option<&mut D> {
        D::from_any_mut(self)
    }
}

impl InputDevice for AnyDevice {
    fn id(&self) -> &str {
        self.as_dyn().id()
    }

    fn kind(&self) -> DeviceKind {
        self.as_dyn().kind()
    }

    fn is_initialized(&self) -> bool {
        self.as_dyn().is_initialized()
    }

    fn initialize(&mut self) -> bool {
        self.as_dyn_mut().initialize()
    }

    fn shutdown(&mut self) {
        self.as_dyn_mut().shutdown()
    }

    fn update(&mut self) {
        self.as_dyn_mut().update()
    }

    fn has_new_input(&self) -> bool {
        self.as_dyn().has_new_input()
    }

    fn clear_input_flags(&mut self) {
        self.as_dyn_mut().clear_input_flags()
    }
}

impl fmt::Debug for AnyDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnyDevice::Button(b) => f.debug_tuple("Button").field(b).finish(),
            AnyDevice::RotaryEncoder(e) => f.debug_tuple("RotaryEncoder").field(e).finish(),
            AnyDevice::Custom(d) => f
                .debug_struct("Custom")
                .field("id", &d.id())
                .field("kind", &d.kind())
                .finish(),
        }
    }
}

impl From<Button> for AnyDevice {
    fn from(device: Button) -> Self {
        AnyDevice::Button(device)
    }
}

impl From<RotaryEncoder> for AnyDevice {
    fn from(device: RotaryEncoder) -> Self {
        AnyDevice::RotaryEncoder(device)
    }
}

impl From<Box<dyn InputDevice>> for AnyDevice {
    fn from(device: Box<dyn InputDevice>) -> Self {
        AnyDevice::Custom(device)
    }
}

/// A concrete device type with its own [`AnyDevice`] arm.
pub trait DeviceVariant: InputDevice + Sized {
    const KIND: DeviceKind;

    fn from_any(device: &AnyDevice) -> Option<&Self>;

    fn from_any_mut(device: &mut AnyDevice) -> Option<&mut Self>;

    fn into_any(self) -> AnyDevice;
}

impl DeviceVariant for Button {
    const KIND: DeviceKind = DeviceKind::Button;

    fn from_any(device: &AnyDevice) -> Option<&Self> {
        match device {
            AnyDevice::Button(b) => Some(b),
            _ => None,
        }
    }

    fn from_any_mut(device: &mut AnyDevice) -> Option<&mut Self> {
        match device {
            AnyDevice::Button(b) => Some(b),
            _ => None,
        }
    }

    fn into_any(self) -> AnyDevice {
        AnyDevice::Button(self)
    }
}

impl DeviceVariant for RotaryEncoder {
    const KIND: DeviceKind = DeviceKind::RotaryEncoder;

    fn from_any(device: &AnyDevice) -> Option<&Self> {
        match device {
            AnyDevice::RotaryEncoder(e) => Some(e),
            _ => None,
        }
    }

    fn from_any_mut(device: &mut AnyDevice) -> Option<&mut Self> {
        match device {
            AnyDevice::RotaryEncoder(e) => Some(e),
            _ => None,
        }
    }

    fn into_any(self) -> AnyDevice {
        AnyDevice::RotaryEncoder(self)
    }
}
