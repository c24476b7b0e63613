//! Go-Back-N simulator
//!
//! High-level API: the protocol core re-exported next to a threaded
//! [`driver`] that ticks a simulation in real time and accepts commands
//! from any thread.

pub use gbn_clock as clock;
pub use gbn_protocol as protocol;

pub mod driver;

// Re-export commonly used types
pub use driver::{Driver, DriverError, DriverThread, SimulationHandle};
pub use protocol::{
    Command, ConfigPatch, Report, SeqNumber, Simulation, SimulationConfig, Snapshot, Stats,
};
