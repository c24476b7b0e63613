//! Packet channel
//!
//! Holds every packet currently on the link in insertion order. Each tick
//! the channel moves all packets forward, discards lost packets that have
//! faded out, and hands back the packets that reached their destination.

use crate::packet::{Packet, PacketId, PacketKind, PacketStatus};
use crate::sequence::SeqNumber;
use std::time::Duration;

/// The simulated link between sender and receiver
#[derive(Debug, Clone, Default)]
pub struct Channel {
    /// Active packets in insertion order
    packets: Vec<Packet>,
    /// Next packet identifier
    next_id: u64,
}

impl Channel {
    /// Create an empty channel
    pub fn new() -> Self {
        Channel::default()
    }

    /// Put a new packet on the link at progress 0
    pub fn emit(&mut self, kind: PacketKind, seq: SeqNumber) -> PacketId {
        let id = PacketId::new(self.next_id);
        self.next_id += 1;

        let packet = match kind {
            PacketKind::Data => Packet::data(id, seq),
            PacketKind::Ack => Packet::ack(id, seq),
        };
        tracing::trace!(%id, %kind, %seq, "packet emitted");
        self.packets.push(packet);
        id
    }

    /// Advance every packet and collect arrivals
    ///
    /// Arrivals are removed from the channel, marked delivered, and returned
    /// in the order they crossed the end of the link during this step: the
    /// packet with the least distance left arrives first, ties keep insertion
    /// order. Lost packets past the fade threshold are dropped silently.
    pub fn advance(&mut self, delta: Duration, transit_speed: f64) -> Vec<Packet> {
        let mut arrivals: Vec<(f64, Packet)> = Vec::new();
        let mut remaining = Vec::with_capacity(self.packets.len());

        for mut packet in self.packets.drain(..) {
            let distance_left = 1.0 - packet.progress;
            packet.advance(delta, transit_speed);

            if packet.has_faded() {
                tracing::trace!(id = %packet.id, seq = %packet.seq, "lost packet faded out");
            } else if packet.has_arrived() {
                packet.status = PacketStatus::Delivered;
                arrivals.push((distance_left, packet));
            } else {
                remaining.push(packet);
            }
        }

        self.packets = remaining;

        // Stable sort: equal distances stay in insertion order
        arrivals.sort_by(|a, b| a.0.total_cmp(&b.0));
        arrivals.into_iter().map(|(_, packet)| packet).collect()
    }

    /// Mark an in-flight DATA packet as lost
    ///
    /// Returns the packet if it was found and was still in flight.
    pub fn mark_lost(&mut self, id: PacketId) -> Option<&Packet> {
        let packet = self
            .packets
            .iter_mut()
            .find(|p| p.id == id && p.is_in_flight() && p.is_data())?;
        packet.status = PacketStatus::Lost;
        Some(packet)
    }

    /// In-flight DATA packets, in insertion order
    pub fn in_flight_data(&self) -> impl Iterator<Item = &Packet> {
        self.packets
            .iter()
            .filter(|p| p.is_in_flight() && p.is_data())
    }

    /// All active packets, including fading lost ones
    pub fn packets(&self) -> &[Packet] {
        &self.packets
    }

    /// Number of active packets
    pub fn len(&self) -> usize {
        self.packets.len()
    }

    /// Check if the link is empty
    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }
}
