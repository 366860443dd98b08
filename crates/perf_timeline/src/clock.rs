//! Clock sources for the in-process host

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// A monotonic millisecond clock.
pub trait HostClock: Send + Sync {
    /// Current time in fractional milliseconds since the clock's origin.
    fn now_ms(&self) -> f64;
}

/// Wall-independent clock backed by [`Instant`], with its origin at construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Create a clock whose time origin is now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl HostClock for MonotonicClock {
    #[inline]
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// A clock that only moves when told to.
///
/// Used to drive the host deterministically, e.g. in tests and replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    bits: AtomicU64,
}

impl ManualClock {
    /// Create a clock reading `start_ms`.
    pub fn new(start_ms: f64) -> Self {
        Self {
            bits: AtomicU64::new(start_ms.to_bits()),
        }
    }

    /// Jump to an absolute time. Moving backwards is ignored.
    pub fn set(&self, ms: f64) {
        let _ = self
            .bits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                (ms >= f64::from_bits(current)).then(|| ms.to_bits())
            });
    }

    /// Move forward by `delta_ms`.
    pub fn advance(&self, delta_ms: f64) {
        let _ = self
            .bits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                let next = f64::from_bits(current) + delta_ms.max(0.0);
                Some(next.to_bits())
            });
    }
}

impl HostClock for ManualClock {
    #[inline]
    fn now_ms(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn test_monotonic_clock_advances() {
        let clock = MonotonicClock::new();
        let first = clock.now_ms();
        sleep(Duration::from_millis(5));
        let second = clock.now_ms();
        assert!(second - first >= 4.0, "expected >= 4ms, got {}", second - first);
    }

    #[test]
    fn test_manual_clock_set_and_advance() {
        let clock = ManualClock::new(100.0);
        assert_eq!(clock.now_ms(), 100.0);

        clock.set(250.5);
        assert_eq!(clock.now_ms(), 250.5);

        clock.advance(0.25);
        assert_eq!(clock.now_ms(), 250.75);
    }

    #[test]
    fn test_manual_clock_never_goes_back() {
        let clock = ManualClock::new(10.0);
        clock.set(5.0);
        assert_eq!(clock.now_ms(), 10.0);

        clock.advance(-3.0);
        assert_eq!(clock.now_ms(), 10.0);
    }
}
