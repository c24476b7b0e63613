//! Simulated Time for the Go-Back-N Simulator
//!
//! This crate provides the clock/stepper that drives a simulation run and
//! the timers that hang off it: the sender's retransmission timer and the
//! fixed-period auto-send interval.

pub mod time;
pub mod timer;

pub use time::{Clock, SimInstant};
pub use timer::{Interval, RetransmitTimer};
