//! Time sources.
//!
//! The simulation never reads wall time directly. `tick` takes an explicit
//! `now`, and `Simulation` asks its `Clock` for it.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Milliseconds since an arbitrary monotonic origin.
pub type Millis = u64;

/// A source of monotonic milliseconds.
pub trait Clock {
    /// Current time in milliseconds.
    fn now_ms(&self) -> Millis;
}

/// Production clock backed by `std::time::Instant`.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
    offset: Millis,
}

impl MonotonicClock {
    /// Clock starting at zero.
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Clock whose first reading is `offset`.
    pub fn starting_at(offset: Millis) -> Self {
        Self { origin: Instant::now(), offset }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> Millis {
        self.offset + self.origin.elapsed().as_millis() as Millis
    }
}

/// Manually advanced clock for tests, demos and replays.
///
/// Clones share the same time cell, so a test can keep a handle while the
/// simulation owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Millis>>,
}

impl ManualClock {
    /// Clock frozen at `start`.
    pub fn new(start: Millis) -> Self {
        Self { now: Rc::new(Cell::new(start)) }
    }

    /// Jump to an absolute time. Moving backwards is ignored.
    pub fn set(&self, now: Millis) {
        if now >= self.now.get() {
            self.now.set(now);
        }
    }

    /// Advance by `delta` milliseconds.
    pub fn advance(&self, delta: Millis) {
        self.now.set(self.now.get().saturating_add(delta));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Millis {
        self.now.get()
    }
}
