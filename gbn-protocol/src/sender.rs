//! Go-Back-N sender state machine
//!
//! The sender owns the left edge of the window (`base`, the oldest
//! unacknowledged sequence number), the next sequence number to transmit,
//! and the single retransmission timer.
//!
//! ```text
//!      base           next_seq       base + window
//!       │                │                 │
//!  ─────┼────────────────┼─────────────────┼──────▶ seq space
//!  acked│ <─ in flight ─>│ <── sendable ──>│
//! ```
//!
//! On timeout the sender goes back to `base`: `next_seq` is rewound and
//! the whole outstanding window becomes sendable again. The state machine
//! never builds packets itself; callers put the returned sequence numbers
//! on the channel.

use crate::sequence::SeqNumber;
use gbn_clock::{RetransmitTimer, SimInstant};
use std::time::Duration;

/// Sender state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderState {
    /// Nothing outstanding, timer stopped
    Idle,
    /// Retransmission timer running
    AwaitingAck,
    /// Every packet acknowledged (terminal)
    Complete,
}

/// Result of processing an ACK
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// The window slid forward
    Advanced {
        previous_base: SeqNumber,
        base: SeqNumber,
    },
    /// The ACK acknowledges nothing new
    Duplicate,
    /// The ACK names data that was never transmitted
    Unsent,
}

/// Go-Back-N send-side state for one run
#[derive(Debug, Clone)]
pub struct GbnSender {
    /// Oldest unacknowledged sequence number
    base: SeqNumber,
    /// Sequence number of the next DATA packet
    next_seq: SeqNumber,
    /// One past the highest sequence number ever transmitted
    high_water: SeqNumber,
    window_size: u32,
    total_packets: u32,
    timer: RetransmitTimer,
    /// The timer was running when the run was paused
    armed_at_pause: bool,
}

impl GbnSender {
    /// Create a sender at the start of a run
    pub fn new(window_size: u32, total_packets: u32, timeout: Duration) -> Self {
        GbnSender {
            base: SeqNumber::ZERO,
            next_seq: SeqNumber::ZERO,
            high_water: SeqNumber::ZERO,
            window_size,
            total_packets,
            timer: RetransmitTimer::new(timeout),
            armed_at_pause: false,
        }
    }

    pub fn base(&self) -> SeqNumber {
        self.base
    }

    pub fn next_seq(&self) -> SeqNumber {
        self.next_seq
    }

    pub fn high_water(&self) -> SeqNumber {
        self.high_water
    }

    pub fn window_size(&self) -> u32 {
        self.window_size
    }

    pub fn total_packets(&self) -> u32 {
        self.total_packets
    }

    pub fn timer(&self) -> &RetransmitTimer {
        &self.timer
    }

    /// Number of sequence numbers between `base` and `next_seq`
    pub fn outstanding(&self) -> u32 {
        self.next_seq.as_raw() - self.base.as_raw()
    }

    /// Current state
    pub fn state(&self) -> SenderState {
        if self.is_complete() {
            SenderState::Complete
        } else if self.timer.is_armed() {
            SenderState::AwaitingAck
        } else {
            SenderState::Idle
        }
    }

    /// Every packet has been acknowledged
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.base.as_raw() >= self.total_packets
    }

    /// Window admission: `next_seq` fits in the window and in the run
    pub fn can_send(&self) -> bool {
        !self.is_complete()
            && self.next_seq < self.base + self.window_size
            && self.next_seq.as_raw() < self.total_packets
    }

    /// Claim the next sequence number for transmission
    ///
    /// Returns `None` when the window is full or the run is complete. Arms
    /// the timer if it is not already running.
    pub fn try_send(&mut self, now: SimInstant) -> Option<SeqNumber> {
        if !self.can_send() {
            return None;
        }

        let seq = self.next_seq;
        self.next_seq.increment();
        self.high_water = self.high_water.max(self.next_seq);

        if !self.timer.is_armed() {
            self.timer.arm(now);
        }

        Some(seq)
    }

    /// Process a cumulative ACK for `seq`
    pub fn on_ack(&mut self, seq: SeqNumber, now: SimInstant) -> AckOutcome {
        if seq < self.base {
            return AckOutcome::Duplicate;
        }
        if seq >= self.high_water {
            return AckOutcome::Unsent;
        }

        let previous_base = self.base;
        self.base = seq.next();
        // An ACK for data sent before a rewind can overtake next_seq
        if self.next_seq < self.base {
            self.next_seq = self.base;
        }

        if self.is_complete() {
            self.timer.disarm();
        } else if self.outstanding() > 0 {
            // The new oldest unacked packet gets a fresh deadline
            self.timer.arm(now);
        } else {
            self.timer.disarm();
        }

        AckOutcome::Advanced {
            previous_base,
            base: self.base,
        }
    }

    /// Go back to `base`
    ///
    /// Only meaningful while awaiting an ACK. Returns true if the window was
    /// rewound and the timer re-armed.
    pub fn on_timeout(&mut self, now: SimInstant) -> bool {
        if self.state() != SenderState::AwaitingAck {
            return false;
        }

        self.next_seq = self.base;
        self.timer.arm(now);
        true
    }

    /// Fire `on_timeout` if the timer has expired
    pub fn poll_timeout(&mut self, now: SimInstant) -> bool {
        self.timer.expired(now) && self.on_timeout(now)
    }

    /// Change the retransmission timeout
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timer.set_timeout(timeout);
    }

    /// Stop the timer while the simulation is paused
    pub fn pause(&mut self) {
        self.armed_at_pause |= self.timer.is_armed();
        self.timer.disarm();
    }

    /// Restart the timer at `now`
    ///
    /// The timer comes back if it was running at pause time, which covers a
    /// window just rewound by a timeout, or if data is still outstanding.
    pub fn resume(&mut self, now: SimInstant) {
        let rearm = self.armed_at_pause || self.outstanding() > 0;
        self.armed_at_pause = false;
        if !self.is_complete() && rearm && !self.timer.is_armed() {
            self.timer.arm(now);
        }
    }
}
