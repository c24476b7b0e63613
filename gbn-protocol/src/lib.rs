//! Go-Back-N protocol core
//!
//! This crate implements a deterministic Go-Back-N ARQ simulation: sequence
//! numbers, packets and the lossy channel, sender and receiver state
//! machines, seeded fault injection, the event log and statistics, and the
//! tick-driven [`Simulation`] that ties them together.

pub mod channel;
pub mod command;
pub mod config;
pub mod fault;
pub mod log;
pub mod packet;
pub mod receiver;
pub mod sender;
pub mod sequence;
pub mod simulation;
pub mod snapshot;
pub mod stats;

pub use channel::Channel;
pub use command::Command;
pub use config::{ConfigError, ConfigPatch, SimulationConfig};
pub use fault::FaultInjector;
pub use log::{Event, EventLog, LogEntry, Severity, DEFAULT_LOG_CAPACITY};
pub use packet::{Endpoint, Packet, PacketId, PacketKind, PacketStatus, LOST_FADE_THRESHOLD};
pub use receiver::{DataOutcome, GbnReceiver};
pub use sender::{AckOutcome, GbnSender, SenderState};
pub use sequence::SeqNumber;
pub use simulation::{Simulation, TickReport};
pub use snapshot::Snapshot;
pub use stats::{Report, Stats};
