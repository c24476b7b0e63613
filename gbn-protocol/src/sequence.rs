//! Sequence Number Handling
//!
//! A run numbers its DATA packets `0..total_packets`. The space never wraps,
//! so ordering is plain integer ordering and the arithmetic here only adds
//! convenience and type safety over a bare `u32`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// Sequence number carried by a DATA packet or acknowledged by an ACK
#[derive(
    Copy, Clone, Default, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SeqNumber(u32);

impl SeqNumber {
    /// First sequence number of every run
    pub const ZERO: SeqNumber = SeqNumber(0);

    /// Create a new sequence number
    #[inline]
    pub const fn new(value: u32) -> Self {
        SeqNumber(value)
    }

    /// Get the raw sequence number value
    #[inline]
    pub fn as_raw(self) -> u32 {
        self.0
    }

    /// Increment the sequence number by 1
    #[inline]
    pub fn increment(&mut self) {
        self.0 = self.0.saturating_add(1);
    }

    /// Get the next sequence number
    #[inline]
    pub fn next(self) -> Self {
        SeqNumber(self.0.saturating_add(1))
    }

    /// Get the previous sequence number, if any
    #[inline]
    pub fn prev(self) -> Option<Self> {
        self.0.checked_sub(1).map(SeqNumber)
    }
}

impl fmt::Debug for SeqNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SeqNumber({})", self.0)
    }
}

impl fmt::Display for SeqNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SeqNumber {
    fn from(value: u32) -> Self {
        SeqNumber(value)
    }
}

impl From<SeqNumber> for u32 {
    fn from(seq: SeqNumber) -> u32 {
        seq.0
    }
}

impl Add<u32> for SeqNumber {
    type Output = SeqNumber;

    fn add(self, rhs: u32) -> SeqNumber {
        SeqNumber(self.0.saturating_add(rhs))
    }
}
