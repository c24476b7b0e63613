//! Simulated packets
//!
//! A packet carries no payload. It is a sequence number, a direction, and a
//! continuous transit `progress` in `[0, 1]` that the channel advances every
//! tick.

use crate::sequence::SeqNumber;
use std::fmt;
use std::time::Duration;

/// Progress past which a lost packet is discarded
///
/// Lost packets keep moving for visual fade-out and vanish at 60% of the
/// path. They never reach their destination.
pub const LOST_FADE_THRESHOLD: f64 = 0.6;

/// Identifier unique within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PacketId(u64);

impl PacketId {
    pub fn new(raw: u64) -> Self {
        PacketId(raw)
    }

    pub fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PacketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pkt-{}", self.0)
    }
}

/// Packet type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketKind {
    /// Data packet (sender to receiver)
    Data,
    /// Cumulative acknowledgment (receiver to sender)
    Ack,
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacketKind::Data => f.write_str("DATA"),
            PacketKind::Ack => f.write_str("ACK"),
        }
    }
}

/// End of the simulated link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Sender,
    Receiver,
}

impl Endpoint {
    /// The other end of the link
    pub fn opposite(self) -> Endpoint {
        match self {
            Endpoint::Sender => Endpoint::Receiver,
            Endpoint::Receiver => Endpoint::Sender,
        }
    }
}

/// Transit status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketStatus {
    /// Travelling toward its destination
    InFlight,
    /// Reached its destination; only seen on packets handed out by the channel
    Delivered,
    /// Dropped by the fault injector; fading out
    Lost,
}

/// A packet travelling on the channel
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    pub id: PacketId,
    pub kind: PacketKind,
    pub seq: SeqNumber,
    pub origin: Endpoint,
    pub destination: Endpoint,
    /// Fraction of transit completed, in `[0, 1]`
    pub progress: f64,
    pub status: PacketStatus,
}

impl Packet {
    /// Create a DATA packet leaving the sender
    pub fn data(id: PacketId, seq: SeqNumber) -> Self {
        Packet::new(id, PacketKind::Data, seq, Endpoint::Sender)
    }

    /// Create an ACK packet leaving the receiver
    pub fn ack(id: PacketId, seq: SeqNumber) -> Self {
        Packet::new(id, PacketKind::Ack, seq, Endpoint::Receiver)
    }

    fn new(id: PacketId, kind: PacketKind, seq: SeqNumber, origin: Endpoint) -> Self {
        Packet {
            id,
            kind,
            seq,
            origin,
            destination: origin.opposite(),
            progress: 0.0,
            status: PacketStatus::InFlight,
        }
    }

    #[inline]
    pub fn is_data(&self) -> bool {
        self.kind == PacketKind::Data
    }

    #[inline]
    pub fn is_ack(&self) -> bool {
        self.kind == PacketKind::Ack
    }

    #[inline]
    pub fn is_in_flight(&self) -> bool {
        self.status == PacketStatus::InFlight
    }

    #[inline]
    pub fn is_lost(&self) -> bool {
        self.status == PacketStatus::Lost
    }

    /// Move the packet along the link by `transit_speed × delta`
    ///
    /// Progress saturates at 1.
    pub fn advance(&mut self, delta: Duration, transit_speed: f64) {
        let step = transit_speed * delta.as_secs_f64();
        if step > 0.0 {
            self.progress = (self.progress + step).min(1.0);
        }
    }

    /// In flight and at the end of the link
    pub fn has_arrived(&self) -> bool {
        self.is_in_flight() && self.progress >= 1.0
    }

    /// Lost and past the fade-out point
    pub fn has_faded(&self) -> bool {
        self.is_lost() && self.progress > LOST_FADE_THRESHOLD
    }
}
