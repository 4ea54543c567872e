//! Edges and per-device callbacks.
//!
//! Devices in this crate report changes in two shapes:
//! - **Binary edges** ([`Edge`]) from anything debounced: standalone buttons and
//!   the push switch on an encoder. Callbacks receive the new logical state
//!   (`true` = active/pressed).
//! - **Signed deltas** from rotary encoders: the change in absolute position
//!   since the previous poll, after direction reversal.
//!
//! All callbacks run synchronously inside the `update()` call that observed the
//! change. Keep them short; a slow callback stalls the whole polling cycle.

/// A committed transition of a debounced input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Edge {
    /// Inactive → active.
    Pressed,
    /// Active → inactive.
    Released,
}

impl Edge {
    /// Logical level after the edge.
    #[inline]
    pub fn level(self) -> bool {
        matches!(self, Edge::Pressed)
    }

    #[inline]
    pub fn from_level(active: bool) -> Self {
        if active {
            Edge::Pressed
        } else {
            Edge::Released
        }
    }
}

/// Callback fired with the new logical state on every committed button edge.
pub type ButtonCallback = Box<dyn FnMut(bool)>;

/// Callback fired with the signed position delta whenever an encoder moves.
pub type DeltaCallback = Box<dyn FnMut(i64)>;
