//! Timers on the simulated timeline
//!
//! [`RetransmitTimer`] is the sender's single Go-Back-N timer: armed while
//! data is outstanding, expired once strictly more than the timeout has
//! elapsed since it was armed. [`Interval`] fires periodically and paces
//! auto-send attempts.

use crate::time::SimInstant;
use std::time::Duration;

/// One-shot retransmission timer
#[derive(Debug, Clone)]
pub struct RetransmitTimer {
    timeout: Duration,
    armed_at: Option<SimInstant>,
}

impl RetransmitTimer {
    /// Create an unarmed timer
    pub fn new(timeout: Duration) -> Self {
        RetransmitTimer {
            timeout,
            armed_at: None,
        }
    }

    /// Configured timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Change the timeout; an armed timer keeps its arming time
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Arm (or re-arm) the timer at `now`
    pub fn arm(&mut self, now: SimInstant) {
        self.armed_at = Some(now);
    }

    /// Stop the timer
    pub fn disarm(&mut self) {
        self.armed_at = None;
    }

    /// Whether the timer is running
    #[inline]
    pub fn is_armed(&self) -> bool {
        self.armed_at.is_some()
    }

    /// Time the timer was last armed
    pub fn armed_at(&self) -> Option<SimInstant> {
        self.armed_at
    }

    /// Time elapsed since arming
    pub fn elapsed(&self, now: SimInstant) -> Option<Duration> {
        self.armed_at.map(|armed| now.duration_since(armed))
    }

    /// Check if strictly more than the timeout has elapsed
    pub fn expired(&self, now: SimInstant) -> bool {
        self.elapsed(now)
            .map_or(false, |elapsed| elapsed > self.timeout)
    }

    /// Fraction of the timeout consumed, in `[0, 1]`; zero when unarmed
    pub fn elapsed_fraction(&self, now: SimInstant) -> f64 {
        match self.elapsed(now) {
            Some(elapsed) if !self.timeout.is_zero() => {
                (elapsed.as_secs_f64() / self.timeout.as_secs_f64()).min(1.0)
            }
            Some(_) => 1.0,
            None => 0.0,
        }
    }
}

/// Periodic timer
#[derive(Debug, Clone)]
pub struct Interval {
    period: Duration,
    last_fire: SimInstant,
}

impl Interval {
    /// Create an interval whose first period starts at `now`
    pub fn new(period: Duration, now: SimInstant) -> Self {
        Interval {
            period,
            last_fire: now,
        }
    }

    /// Configured period
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Change the period without restarting the current one
    pub fn set_period(&mut self, period: Duration) {
        self.period = period;
    }

    /// Restart the current period at `now`
    pub fn reset(&mut self, now: SimInstant) {
        self.last_fire = now;
    }

    /// Check if a full period has elapsed
    pub fn expired(&self, now: SimInstant) -> bool {
        now.duration_since(self.last_fire) >= self.period
    }

    /// Fire the interval if expired, returning true if it fired
    pub fn try_fire(&mut self, now: SimInstant) -> bool {
        if self.expired(now) {
            self.reset(now);
            true
        } else {
            false
        }
    }
}
