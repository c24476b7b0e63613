//! Run statistics
//!
//! Counters only ever increase during a run and are zeroed by reset.
//! `retransmit_count` counts timeout events, not the packets resent after
//! each one.

use gbn_clock::SimInstant;

/// Running counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// DATA packets put on the link, retransmissions included
    pub total_sent: u64,
    /// DATA packets dropped by the fault injector
    pub lost_count: u64,
    /// Retransmission timeouts
    pub retransmit_count: u64,
}

/// Summary of a completed run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Report {
    pub total_packets: u32,
    pub stats: Stats,
    /// Simulated time at which the last ACK arrived
    pub finished_at: SimInstant,
}

impl Report {
    /// Useful packets over packets sent, as a rounded percentage
    pub fn efficiency_percent(&self) -> u32 {
        let sent = self.stats.total_sent.max(1) as f64;
        (f64::from(self.total_packets) / sent * 100.0).round() as u32
    }

    /// No packet was lost during the run
    pub fn is_perfect(&self) -> bool {
        self.stats.lost_count == 0
    }
}
