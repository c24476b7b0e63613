//! Read-only view of a simulation
//!
//! A [`Snapshot`] is plain owned data: observers can keep it, send it to
//! another thread, or render it without holding on to the simulation.

use crate::config::SimulationConfig;
use crate::log::LogEntry;
use crate::packet::Packet;
use crate::sender::SenderState;
use crate::stats::Stats;
use gbn_clock::SimInstant;

/// Point-in-time copy of the simulation state
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub now: SimInstant,
    pub is_running: bool,
    pub is_complete: bool,
    pub sender_state: SenderState,
    pub sender_base: u32,
    pub next_seq_num: u32,
    pub receiver_expected: u32,
    /// Active packets, including fading lost ones
    pub packets: Vec<Packet>,
    pub stats: Stats,
    /// Retained log entries, oldest first
    pub logs: Vec<LogEntry>,
    /// Log entries recorded since the run began, evicted ones included
    pub logs_recorded: u64,
    /// Fraction of the retransmission timeout consumed, zero when unarmed
    pub timeout_elapsed_fraction: f64,
    pub config: SimulationConfig,
}

impl Snapshot {
    /// One past the last sequence number the window admits
    pub fn window_end(&self) -> u32 {
        self.sender_base
            .saturating_add(self.config.window_size)
            .min(self.config.total_packets)
    }

    /// Retained entries recorded after the first `seen` entries of the log
    pub fn logs_since(&self, seen: u64) -> &[LogEntry] {
        let fresh = self.logs_recorded.saturating_sub(seen) as usize;
        &self.logs[self.logs.len().saturating_sub(fresh)..]
    }

    /// Packets still travelling (lost ones excluded)
    pub fn in_flight(&self) -> impl Iterator<Item = &Packet> {
        self.packets.iter().filter(|p| p.is_in_flight())
    }
}
