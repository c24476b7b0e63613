//! Fault injection
//!
//! Loss is injected on demand: one call picks an in-flight DATA packet
//! uniformly at random and marks it lost. All randomness in a run comes
//! from a seeded ChaCha8 RNG, so a seed plus a command/tick sequence
//! reproduces the same losses.

use crate::channel::Channel;
use crate::packet::Packet;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seeded source of packet loss
#[derive(Debug, Clone)]
pub struct FaultInjector {
    seed: u64,
    rng: ChaCha8Rng,
}

impl FaultInjector {
    /// Create an injector with a fixed seed
    pub fn new(seed: u64) -> Self {
        FaultInjector {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Create an injector with a seed drawn from the thread RNG
    pub fn from_entropy() -> Self {
        FaultInjector::new(rand::thread_rng().gen())
    }

    /// Seed this injector was created with
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Restart the random sequence from the seed
    pub fn reseed(&mut self) {
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
    }

    /// Pick an index in `0..len`, or `None` if `len` is zero
    pub fn choose(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            None
        } else {
            Some(self.rng.gen_range(0..len))
        }
    }

    /// Mark a random in-flight DATA packet lost
    ///
    /// ACKs are never targeted. Returns a copy of the lost packet, or `None`
    /// if no DATA packet is in flight.
    pub fn drop_random_in_flight_data(&mut self, channel: &mut Channel) -> Option<Packet> {
        let candidates: Vec<_> = channel.in_flight_data().map(|p| p.id).collect();
        let index = self.choose(candidates.len())?;
        channel.mark_lost(candidates[index]).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::{PacketKind, PacketStatus};
    use crate::sequence::SeqNumber;

    fn loaded_channel() -> Channel {
        let mut channel = Channel::new();
        for i in 0..4 {
            channel.emit(PacketKind::Data, SeqNumber::new(i));
        }
        channel.emit(PacketKind::Ack, SeqNumber::new(0));
        channel
    }

    #[test]
    fn test_empty_channel_is_noop() {
        let mut fault = FaultInjector::new(7);
        let mut channel = Channel::new();
        assert!(fault.drop_random_in_flight_data(&mut channel).is_none());

        channel.emit(PacketKind::Ack, SeqNumber::new(0));
        assert!(fault.drop_random_in_flight_data(&mut channel).is_none());
    }

    #[test]
    fn test_drops_one_data_packet() {
        let mut fault = FaultInjector::new(7);
        let mut channel = loaded_channel();

        let lost = fault.drop_random_in_flight_data(&mut channel).unwrap();
        assert!(lost.is_data());
        assert_eq!(lost.status, PacketStatus::Lost);
        assert_eq!(channel.in_flight_data().count(), 3);
    }

    #[test]
    fn test_same_seed_same_choices() {
        let mut a = FaultInjector::new(42);
        let mut b = FaultInjector::new(42);
        let picks_a: Vec<_> = (0..32).map(|_| a.choose(10)).collect();
        let picks_b: Vec<_> = (0..32).map(|_| b.choose(10)).collect();
        assert_eq!(picks_a, picks_b);

        a.reseed();
        let replay: Vec<_> = (0..32).map(|_| a.choose(10)).collect();
        assert_eq!(picks_a, replay);
    }
}
