//! Simulated clock
//!
//! Protocol timing never looks at the wall clock. Time is a monotonic offset
//! from the start of the run that only moves when the tick loop advances a
//! running [`Clock`]. Paused time therefore never counts toward a timeout.

use std::fmt;
use std::ops::{Add, Sub};
use std::time::Duration;

/// Point on the simulated timeline, measured from the start of the run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SimInstant(Duration);

impl SimInstant {
    /// Start of the run
    pub const ZERO: SimInstant = SimInstant(Duration::ZERO);

    /// Create an instant from an offset since the start of the run
    #[inline]
    pub fn from_duration(offset: Duration) -> Self {
        SimInstant(offset)
    }

    /// Create an instant from a millisecond offset
    #[inline]
    pub fn from_millis(millis: u64) -> Self {
        SimInstant(Duration::from_millis(millis))
    }

    /// Offset since the start of the run
    #[inline]
    pub fn as_duration(&self) -> Duration {
        self.0
    }

    /// Offset since the start of the run in whole milliseconds
    pub fn as_millis(&self) -> u64 {
        self.0.as_millis().try_into().unwrap_or(u64::MAX)
    }

    /// Time elapsed from `earlier` to `self`, zero if `earlier` is later
    #[inline]
    pub fn duration_since(&self, earlier: SimInstant) -> Duration {
        self.0.saturating_sub(earlier.0)
    }
}

impl Add<Duration> for SimInstant {
    type Output = SimInstant;

    fn add(self, rhs: Duration) -> SimInstant {
        SimInstant(self.0.saturating_add(rhs))
    }
}

impl Sub<Duration> for SimInstant {
    type Output = SimInstant;

    fn sub(self, rhs: Duration) -> SimInstant {
        SimInstant(self.0.saturating_sub(rhs))
    }
}

impl Sub for SimInstant {
    type Output = Duration;

    fn sub(self, rhs: SimInstant) -> Duration {
        self.duration_since(rhs)
    }
}

impl fmt::Display for SimInstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.0.as_secs_f64())
    }
}

/// Stepper that owns simulated time
///
/// A new clock is paused at [`SimInstant::ZERO`]. `advance` is a no-op
/// while paused.
#[derive(Debug, Clone, Default)]
pub struct Clock {
    now: SimInstant,
    running: bool,
}

impl Clock {
    /// Create a paused clock at the start of the run
    pub fn new() -> Self {
        Clock::default()
    }

    /// Current simulated time
    #[inline]
    pub fn now(&self) -> SimInstant {
        self.now
    }

    /// Whether ticks currently move time forward
    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Let subsequent ticks advance time
    pub fn start(&mut self) {
        if !self.running {
            tracing::trace!(now = %self.now, "clock started");
            self.running = true;
        }
    }

    /// Freeze simulated time
    pub fn pause(&mut self) {
        if self.running {
            tracing::trace!(now = %self.now, "clock paused");
            self.running = false;
        }
    }

    /// Advance time by `delta` if running
    ///
    /// Returns true if time moved.
    pub fn advance(&mut self, delta: Duration) -> bool {
        if !self.running {
            return false;
        }
        self.now = self.now + delta;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instant_arithmetic() {
        let a = SimInstant::from_millis(1500);
        let b = a + Duration::from_millis(500);

        assert_eq!(b.as_millis(), 2000);
        assert_eq!(b - a, Duration::from_millis(500));
        // Saturates instead of panicking when reversed
        assert_eq!(a - b, Duration::ZERO);
        assert_eq!((a - Duration::from_secs(10)), SimInstant::ZERO);
    }

    #[test]
    fn test_instant_display() {
        assert_eq!(SimInstant::from_millis(1234).to_string(), "1.234s");
    }

    #[test]
    fn test_clock_starts_paused() {
        let mut clock = Clock::new();
        assert!(!clock.is_running());
        assert!(!clock.advance(Duration::from_millis(100)));
        assert_eq!(clock.now(), SimInstant::ZERO);
    }

    #[test]
    fn test_clock_excludes_paused_time() {
        let mut clock = Clock::new();
        clock.start();
        assert!(clock.advance(Duration::from_millis(100)));

        clock.pause();
        clock.advance(Duration::from_secs(60));

        clock.start();
        clock.advance(Duration::from_millis(50));

        assert_eq!(clock.now().as_millis(), 150);
    }
}
