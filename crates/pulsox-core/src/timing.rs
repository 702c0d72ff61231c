//! Millisecond clocks for pacing the detection pipeline
//!
//! The beat detector and the bias controller are driven by wall-clock
//! timestamps, not sample counts. Every stage takes its time from a
//! [`MillisClock`] so tests and simulations can run on a hand-advanced
//! clock while production code uses the monotonic system timer.
//!
//! ## Example
//!
//! ```
//! use pulsox_core::timing::{ManualClock, MillisClock};
//!
//! let clock = ManualClock::new();
//! let view = clock.clone();
//! clock.advance(250);
//! assert_eq!(view.now_ms(), 250);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Source of monotonic milliseconds.
pub trait MillisClock {
    /// Milliseconds elapsed since the clock's origin. Never decreases.
    fn now_ms(&self) -> u64;
}

/// Monotonic system clock, anchored at construction time.
#[derive(Debug, Clone)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MillisClock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Hand-advanced clock for tests and simulation.
///
/// Clones share the same underlying counter, so one handle can pace a
/// simulated sensor while another drives the oximeter.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock starting at 0 ms.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clock starting at the given timestamp.
    pub fn at(ms: u64) -> Self {
        Self { now: Arc::new(AtomicU64::new(ms)) }
    }

    /// Moves the clock forward by `ms` milliseconds.
    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::Relaxed);
    }

    /// Jumps the clock to an absolute timestamp.
    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::Relaxed);
    }
}

impl MillisClock for ManualClock {
    #[inline]
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let view = clock.clone();
        assert_eq!(view.now_ms(), 0);

        clock.advance(120);
        assert_eq!(clock.now_ms(), 120);
        assert_eq!(view.now_ms(), 120, "clone must see the advanced time");

        view.advance(30);
        assert_eq!(clock.now_ms(), 150, "advances through either handle accumulate");
    }

    #[test]
    fn test_manual_clock_at_and_set() {
        let clock = ManualClock::at(1_000);
        assert_eq!(clock.now_ms(), 1_000);

        clock.set(5_000);
        assert_eq!(clock.now_ms(), 5_000);
    }

    #[test]
    fn test_system_clock_advances() {
        let clock = SystemClock::new();
        let t0 = clock.now_ms();
        sleep(Duration::from_millis(10));
        let t1 = clock.now_ms();
        assert!(t1 >= t0, "system clock went backwards: {t0} -> {t1}");
        assert!(t1 - t0 >= 5, "expected at least 5 ms to pass, got {}", t1 - t0);
    }
}
