//! Commands from the outside world
//!
//! Anything that is not the tick itself reaches the simulation as a
//! [`Command`]. Commands can be applied directly between ticks or queued and
//! drained, in order, at the start of the next tick.

use crate::config::{ConfigPatch, SimulationConfig};

/// External command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the clock
    Start,
    /// Freeze the clock
    Pause,
    /// Discard the run and start over with the current configuration
    Reset,
    /// Discard the run and start over with a new configuration
    ResetWith(SimulationConfig),
    /// Attempt to send the next DATA packet
    TrySend,
    /// Lose a random in-flight DATA packet
    DropRandomData,
    /// Act as if the retransmission timer expired now
    ForceTimeout,
    /// Apply a partial configuration update
    SetConfig(ConfigPatch),
}
