//! Time management utilities
//!
//! The frame loop never reads the system clock directly. It asks a [`Clock`]
//! for monotonic nanoseconds, which lets tests drive the loop with a
//! synthetic time source.

use std::cell::Cell;
use std::time::Instant;

/// Nanoseconds in one second
pub const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Monotonic time source for the frame loop
pub trait Clock {
    /// Nanoseconds elapsed since an arbitrary, fixed starting point
    fn now_nanos(&self) -> u64;
}

/// Wall-clock time source backed by [`Instant`]
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    /// Create a new clock starting at zero
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn now_nanos(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }
}

/// Synthetic clock that advances by a fixed step every time it is read
///
/// The first read returns zero.
pub struct SteppingClock {
    now: Cell<u64>,
    step: u64,
}

impl SteppingClock {
    /// Create a clock that advances `step_nanos` per read
    pub fn new(step_nanos: u64) -> Self {
        Self {
            now: Cell::new(0),
            step: step_nanos,
        }
    }

    /// Create a clock that advances one millisecond per read
    pub fn millis() -> Self {
        Self::new(1_000_000)
    }

    /// Total synthetic time handed out so far
    pub fn elapsed_nanos(&self) -> u64 {
        self.now.get().saturating_sub(self.step)
    }
}

impl Clock for SteppingClock {
    fn now_nanos(&self) -> u64 {
        let now = self.now.get();
        self.now.set(now + self.step);
        now
    }
}

/// Nanoseconds per tick for a rate cap, as used by the fixed-step loop
///
/// A cap of zero is treated as one tick per second.
pub fn nanos_per_tick(cap: u32) -> f64 {
    NANOS_PER_SECOND as f64 / f64::from(cap.max(1))
}
