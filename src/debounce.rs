//! Time-window debouncer.
//!
//! [`Debouncer`] turns a stream of raw boolean samples into a stable logical
//! state with edge-triggered press/release flags. It is shared by
//! [`Button`](crate::button::Button) and the optional push switch embedded in
//! [`RotaryEncoder`](crate::rotary_encoder::RotaryEncoder).
//!
//! # Algorithm
//! Every call to [`sample`](Debouncer::sample) does two things:
//! 1. If the raw value differs from the previous raw sample, the debounce timer
//!    restarts at `now`. This happens on *every* raw change, including changes
//!    that arrive while an earlier change is still waiting out its window.
//! 2. If the raw value has been constant for strictly longer than the window and
//!    differs from the stable state, the transition commits: the stable state
//!    flips, the matching edge flag and the new-input flag are set, and the
//!    edge is returned to the caller.
//!
//! A bounce that returns to the stable value before the window elapses never
//! commits.
//!
//! The debouncer is pure state: it never reads hardware or a clock itself, and
//! it does not own callbacks. Owners feed it samples and act on the returned
//! [`Edge`].

use crate::event::Edge;
use std::time::Duration;

/// Default debounce window used by button configs.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(50);

#[derive(Clone, Debug)]
pub struct Debouncer {
    window: Duration,
    raw_last: bool,
    stable: bool,
    last_transition: Duration,
    last_activated: Duration,
    last_deactivated: Duration,
    pressed: bool,
    released: bool,
    new_input: bool,
}

impl Debouncer {
    /// Debouncer resting in the inactive state at time zero.
    ///
    /// Call [`seed`](Self::seed) with the first real reading before sampling.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            raw_last: false,
            stable: false,
            last_transition: Duration::ZERO,
            last_activated: Duration::ZERO,
            last_deactivated: Duration::ZERO,
            pressed: false,
            released: false,
            new_input: false,
        }
    }

    /// Adopt `raw` as both the last sample and the stable state without
    /// producing an edge. Unread flags survive; only the caller clears them.
    pub fn seed(&mut self, raw: bool, now: Duration) {
        self.raw_last = raw;
        self.stable = raw;
        self.last_transition = now;
        if raw {
            self.last_activated = now;
        } else {
            self.last_deactivated = now;
        }
    }

    /// Feed one raw sample taken at `now`.
    ///
    /// Returns the committed edge, if this sample completed one.
    pub fn sample(&mut self, raw: bool, now: Duration) -> Option<Edge> {
        if raw != self.raw_last {
            self.last_transition = now;
            self.raw_last = raw;
        }

        if now.saturating_sub(self.last_transition) <= self.window || raw == self.stable {
            return None;
        }

        self.stable = raw;
        self.new_input = true;
        let edge = Edge::from_level(raw);
        match edge {
            Edge::Pressed => {
                self.pressed = true;
                self.last_activated = now;
            }
            Edge::Released => {
                self.released = true;
                self.last_deactivated = now;
            }
        }
        Some(edge)
    }

    /// Confirmed logical state.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.stable
    }

    /// Read-and-clear: `true` once per committed press.
    pub fn was_pressed(&mut self) -> bool {
        std::mem::take(&mut self.pressed)
    }

    /// Read-and-clear: `true` once per committed release.
    pub fn was_released(&mut self) -> bool {
        std::mem::take(&mut self.released)
    }

    /// `true` while any edge is unread.
    #[inline]
    pub fn has_new_input(&self) -> bool {
        self.new_input
    }

    /// Drop every pending flag. The stable state is untouched.
    pub fn clear_flags(&mut self) {
        self.pressed = false;
        self.released = false;
        self.new_input = false;
    }

    /// Time spent active since the last press edge; zero while inactive.
    pub fn active_duration(&self, now: Duration) -> Duration {
        if self.stable {
            now.saturating_sub(self.last_activated)
        } else {
            Duration::ZERO
        }
    }

    /// Time spent inactive since the last release edge; zero while active.
    pub fn inactive_duration(&self, now: Duration) -> Duration {
        if self.stable {
            Duration::ZERO
        } else {
            now.saturating_sub(self.last_deactivated)
        }
    }

    #[inline]
    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn set_window(&mut self, window: Duration) {
        self.window = window;
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}
