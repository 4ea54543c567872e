//! Polled input device manager for embedded control loops.
//!
//! Turns noisy raw digital levels and quadrature counts into clean,
//! edge-triggered events (press/release, rotation delta), and manages an
//! arbitrary set of such devices under one [`DeviceManager`].
//!
//! Everything is single-threaded and cooperative: call
//! [`DeviceManager::update`] from the control loop at a cadence shorter than the
//! shortest debounce window. Callbacks run inline inside that call.

pub mod backends;
pub mod button;
pub mod config;
pub mod debounce;
pub mod device;
pub mod error;
pub mod event;
pub mod listener;
pub mod manager;
pub mod quadrature;
pub mod rotary_encoder;
pub mod snapshot;

pub use button::Button;
pub use config::{ButtonConfig, InputConfig, RotaryEncoderConfig};
pub use debounce::Debouncer;
pub use device::*;
pub use error::{Error, Result};
pub use event::*;
pub use listener::*;
pub use manager::*;
pub use quadrature::QuadratureTracker;
pub use rotary_encoder::RotaryEncoder;
pub use snapshot::{DeviceState, Snapshot};
