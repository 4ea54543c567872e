//! Global input listeners.
//!
//! The [`DeviceManager`](crate::manager::DeviceManager) fans out one
//! notification per device per cycle to a single [`InputListener`]. Any
//! `FnMut(&str, DeviceKind)` closure is a listener; [`FilteredListener`] and
//! [`LogListener`] cover the common "only these devices" and "just trace it"
//! cases.

use crate::device::DeviceKind;
use tracing::info;

/// Receives `(device id, device kind)` for every device with unread input.
pub trait InputListener {
    fn on_input(&mut self, device_id: &str, kind: DeviceKind);
}

impl<F> InputListener for F
where
    F: FnMut(&str, DeviceKind),
{
    fn on_input(&mut self, device_id: &str, kind: DeviceKind) {
        self(device_id, kind)
    }
}

/// Which notifications a [`FilteredListener`] lets through.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputFilter {
    All,
    Kind(DeviceKind),
    /// Exact device id.
    Device(String),
}

impl InputFilter {
    pub fn matches(&self, device_id: &str, kind: DeviceKind) -> bool {
        match self {
            InputFilter::All => true,
            InputFilter::Kind(k) => *k == kind,
            InputFilter::Device(id) => id == device_id,
        }
    }
}

/// Forwards to `inner` only what passes `filter`.
pub struct FilteredListener<L> {
    filter: InputFilter,
    inner: L,
}

impl<L: InputListener> FilteredListener<L> {
    pub fn new(filter: InputFilter, inner: L) -> Self {
        Self { filter, inner }
    }
}

impl<L: InputListener> InputListener for FilteredListener<L> {
    fn on_input(&mut self, device_id: &str, kind: DeviceKind) {
        if self.filter.matches(device_id, kind) {
            self.inner.on_input(device_id, kind);
        }
    }
}

/// Logs every notification at `info` level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogListener;

impl InputListener for LogListener {
    fn on_input(&mut self, device_id: &str, kind: DeviceKind) {
        info!(device = device_id, %kind, "input detected");
    }
}
