//! Time sources
//!
//! The playback state machine reads time through [`Clock`]. Hosts implement
//! it over their own frame timestamps; controllers use the frame scheduler's
//! handle and tests use a manually advanced clock.

use std::cell::Cell;
use std::rc::Rc;

/// A monotonic millisecond time source
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// A clock that only moves when told to
///
/// Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, now_ms: f64) {
        self.now.set(now_ms);
    }

    pub fn advance(&self, delta_ms: f64) {
        self.now.set(self.now.get() + delta_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}
