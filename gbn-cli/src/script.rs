//! Scripted commands
//!
//! A [`Script`] turns the `[run]` section into commands on a simulated-time
//! schedule: loss injection at fixed instants and, when auto-send is off, a
//! manual send cadence.

use crate::config::RunConfig;
use gbn_clock::{Interval, SimInstant};
use gbn_protocol::Command;
use std::collections::VecDeque;
use std::time::Duration;

/// Commands due at given simulated times
#[derive(Debug, Clone)]
pub struct Script {
    drops: VecDeque<SimInstant>,
    sends: Option<Interval>,
}

impl Script {
    pub fn new(run: &RunConfig) -> Self {
        let mut drops: Vec<_> = run
            .drop_at_ms
            .iter()
            .map(|&ms| SimInstant::from_millis(ms))
            .collect();
        drops.sort();

        Script {
            drops: drops.into(),
            sends: run
                .send_every_ms
                .map(|ms| Interval::new(Duration::from_millis(ms), SimInstant::ZERO)),
        }
    }

    /// Commands due at `now`, in issue order
    pub fn due(&mut self, now: SimInstant) -> Vec<Command> {
        let mut commands = Vec::new();

        while self.drops.front().map_or(false, |&at| at <= now) {
            self.drops.pop_front();
            commands.push(Command::DropRandomData);
        }

        if let Some(sends) = self.sends.as_mut() {
            if sends.try_fire(now) {
                commands.push(Command::TrySend);
            }
        }

        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> SimInstant {
        SimInstant::from_millis(millis)
    }

    #[test]
    fn test_drops_fire_once_in_order() {
        let run = RunConfig {
            drop_at_ms: vec![3000, 1000, 1000],
            ..RunConfig::default()
        };
        let mut script = Script::new(&run);

        assert!(script.due(ms(500)).is_empty());
        assert_eq!(
            script.due(ms(1000)),
            vec![Command::DropRandomData, Command::DropRandomData]
        );
        assert!(script.due(ms(1000)).is_empty());
        assert!(script.due(ms(2999)).is_empty());
        assert_eq!(script.due(ms(4000)), vec![Command::DropRandomData]);
    }

    #[test]
    fn test_send_cadence() {
        let run = RunConfig {
            send_every_ms: Some(1000),
            ..RunConfig::default()
        };
        let mut script = Script::new(&run);

        assert!(script.due(ms(0)).is_empty());
        assert_eq!(script.due(ms(1000)), vec![Command::TrySend]);
        assert!(script.due(ms(1500)).is_empty());
        assert_eq!(script.due(ms(2000)), vec![Command::TrySend]);
    }
}
