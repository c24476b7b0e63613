//! Go-Back-N receiver
//!
//! The receiver keeps a single number, the next in-order sequence number it
//! will accept. Anything else is discarded without buffering and answered
//! with a duplicate cumulative ACK for the last in-order packet.

use crate::sequence::SeqNumber;

/// Result of a DATA arrival
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOutcome {
    /// In-order packet accepted; `ack` acknowledges it
    Accepted { ack: SeqNumber },
    /// Out-of-order packet discarded
    Rejected {
        expected: SeqNumber,
        /// Re-sent ACK for `expected - 1`, absent if nothing was ever accepted
        duplicate_ack: Option<SeqNumber>,
    },
}

impl DataOutcome {
    /// The ACK to put on the channel, if any
    pub fn ack(&self) -> Option<SeqNumber> {
        match *self {
            DataOutcome::Accepted { ack } => Some(ack),
            DataOutcome::Rejected { duplicate_ack, .. } => duplicate_ack,
        }
    }
}

/// Go-Back-N receive-side state for one run
#[derive(Debug, Clone)]
pub struct GbnReceiver {
    expected: SeqNumber,
    total_packets: u32,
}

impl GbnReceiver {
    pub fn new(total_packets: u32) -> Self {
        GbnReceiver {
            expected: SeqNumber::ZERO,
            total_packets,
        }
    }

    /// Next in-order sequence number
    pub fn expected(&self) -> SeqNumber {
        self.expected
    }

    /// All packets of the run have been accepted
    pub fn is_complete(&self) -> bool {
        self.expected.as_raw() >= self.total_packets
    }

    /// Handle a DATA packet carrying `seq`
    pub fn on_data(&mut self, seq: SeqNumber) -> DataOutcome {
        if seq == self.expected && !self.is_complete() {
            self.expected.increment();
            return DataOutcome::Accepted { ack: seq };
        }

        DataOutcome::Rejected {
            expected: self.expected,
            duplicate_ack: self.expected.prev(),
        }
    }
}
