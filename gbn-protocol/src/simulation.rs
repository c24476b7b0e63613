//! Simulation core
//!
//! [`Simulation`] ties the clock, the channel, both state machines, the
//! fault injector, the log and the counters together. It is a pure state
//! machine: time only moves through [`Simulation::tick`], everything else
//! arrives as a [`Command`], either applied directly between ticks or queued
//! with [`Simulation::enqueue`] and drained at the start of the next tick.
//!
//! One tick, in order:
//!
//! 1. drain queued commands
//! 2. advance the clock (no-op while paused)
//! 3. advance the channel and deliver arrivals to receiver or sender
//! 4. check the retransmission timer
//! 5. fire the auto-send period
//! 6. detect completion

use crate::channel::Channel;
use crate::command::Command;
use crate::config::{ConfigError, ConfigPatch, SimulationConfig};
use crate::fault::FaultInjector;
use crate::log::{Event, EventLog};
use crate::packet::{Packet, PacketKind};
use crate::receiver::{DataOutcome, GbnReceiver};
use crate::sender::{AckOutcome, GbnSender};
use crate::sequence::SeqNumber;
use crate::snapshot::Snapshot;
use crate::stats::{Report, Stats};
use gbn_clock::{Clock, Interval, SimInstant};
use std::collections::VecDeque;
use std::time::Duration;

/// What happened during one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Simulated time after the tick
    pub now: SimInstant,
    /// Queued commands drained at the start of the tick
    pub commands_applied: usize,
    /// Whether simulated time moved
    pub advanced: bool,
    /// Packets delivered to an endpoint
    pub arrivals: usize,
    /// The retransmission timer fired
    pub timed_out: bool,
    /// The auto-send period put a DATA packet on the link
    pub auto_sent: bool,
    /// The run completed during this tick; true for exactly one tick per run
    pub completed: bool,
}

/// Go-Back-N simulation
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimulationConfig,
    clock: Clock,
    channel: Channel,
    sender: GbnSender,
    receiver: GbnReceiver,
    fault: FaultInjector,
    log: EventLog,
    stats: Stats,
    auto_send: Interval,
    pending: VecDeque<Command>,
    /// Set when completion has been signalled
    finished_at: Option<SimInstant>,
}

impl Simulation {
    /// Create a paused simulation with a random fault seed
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Simulation::build(config, FaultInjector::from_entropy()))
    }

    /// Create a paused simulation whose losses are reproducible from `seed`
    pub fn with_seed(config: SimulationConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Simulation::build(config, FaultInjector::new(seed)))
    }

    fn build(config: SimulationConfig, fault: FaultInjector) -> Self {
        tracing::debug!(
            seed = fault.seed(),
            window_size = config.window_size,
            total_packets = config.total_packets,
            "simulation initialised"
        );

        Simulation {
            clock: Clock::new(),
            channel: Channel::new(),
            sender: GbnSender::new(config.window_size, config.total_packets, config.timeout()),
            receiver: GbnReceiver::new(config.total_packets),
            log: EventLog::new(config.log_capacity),
            stats: Stats::default(),
            auto_send: Interval::new(config.auto_send_interval(), SimInstant::ZERO),
            pending: VecDeque::new(),
            finished_at: None,
            fault,
            config,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Current simulated time
    pub fn now(&self) -> SimInstant {
        self.clock.now()
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    /// Every packet has been acknowledged
    pub fn is_complete(&self) -> bool {
        self.sender.is_complete()
    }

    pub fn sender(&self) -> &GbnSender {
        &self.sender
    }

    pub fn receiver(&self) -> &GbnReceiver {
        &self.receiver
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Seed of the fault injector
    pub fn seed(&self) -> u64 {
        self.fault.seed()
    }

    /// Commands waiting for the next tick
    pub fn pending_commands(&self) -> usize {
        self.pending.len()
    }

    /// Fraction of the retransmission timeout consumed
    pub fn timeout_elapsed_fraction(&self) -> f64 {
        self.sender.timer().elapsed_fraction(self.clock.now())
    }

    /// Queue a command for the start of the next tick
    pub fn enqueue(&mut self, command: Command) {
        self.pending.push_back(command);
    }

    /// Apply a command immediately
    ///
    /// Refusals are not errors; a rejected configuration is already in the
    /// log by the time this returns.
    pub fn apply(&mut self, command: Command) {
        tracing::trace!(?command, "applying command");
        match command {
            Command::Start => {
                self.start();
            }
            Command::Pause => {
                self.pause();
            }
            Command::Reset => self.restart(),
            Command::ResetWith(config) => {
                // Rejection is logged
                self.reset(config).ok();
            }
            Command::TrySend => {
                self.try_send();
            }
            Command::DropRandomData => {
                self.drop_random_in_flight_data();
            }
            Command::ForceTimeout => {
                self.force_timeout();
            }
            Command::SetConfig(patch) => {
                self.set_config(&patch).ok();
            }
        }
    }

    /// Run the clock
    ///
    /// Returns false if already running or the run is complete.
    pub fn start(&mut self) -> bool {
        if self.is_complete() || self.clock.is_running() {
            return false;
        }

        let now = self.clock.now();
        self.clock.start();
        self.sender.resume(now);
        self.auto_send.reset(now);
        self.log.record(now, Event::Started);
        true
    }

    /// Freeze the clock and stop the retransmission timer
    pub fn pause(&mut self) -> bool {
        if !self.clock.is_running() {
            return false;
        }

        self.clock.pause();
        self.sender.pause();
        self.log.record(self.clock.now(), Event::Paused);
        true
    }

    /// Discard everything and start over with `config`
    ///
    /// The previous run is kept untouched if `config` is invalid.
    pub fn reset(&mut self, config: SimulationConfig) -> Result<(), ConfigError> {
        if let Err(e) = config.validate() {
            return Err(self.reject(e));
        }

        let mut fault = self.fault.clone();
        fault.reseed();
        *self = Simulation::build(config, fault);
        tracing::info!("simulation reset");
        Ok(())
    }

    /// Discard everything and start over with the current configuration
    pub fn restart(&mut self) {
        let mut fault = self.fault.clone();
        fault.reseed();
        *self = Simulation::build(self.config.clone(), fault);
        tracing::info!("simulation reset");
    }

    /// Send the next DATA packet if the window admits it
    pub fn try_send(&mut self) -> bool {
        let now = self.clock.now();
        match self.sender.try_send(now) {
            Some(seq) => {
                self.channel.emit(PacketKind::Data, seq);
                self.stats.total_sent += 1;
                self.log.record(now, Event::DataSent { seq });
                true
            }
            None => {
                tracing::trace!(
                    base = %self.sender.base(),
                    next_seq = %self.sender.next_seq(),
                    "send refused"
                );
                false
            }
        }
    }

    /// Lose a random in-flight DATA packet
    ///
    /// Returns the sequence number of the lost packet. A completed run is
    /// frozen, so nothing is dropped once it has finished.
    pub fn drop_random_in_flight_data(&mut self) -> Option<SeqNumber> {
        if self.finished_at.is_some() {
            return None;
        }
        let lost = self.fault.drop_random_in_flight_data(&mut self.channel)?;
        self.stats.lost_count += 1;
        self.log
            .record(self.clock.now(), Event::PacketLost { seq: lost.seq });
        Some(lost.seq)
    }

    /// Expire the retransmission timer now
    ///
    /// Returns false unless the sender was awaiting an ACK on an unfinished
    /// run.
    pub fn force_timeout(&mut self) -> bool {
        let now = self.clock.now();
        if self.finished_at.is_some() || !self.sender.on_timeout(now) {
            return false;
        }
        self.record_timeout(now);
        true
    }

    /// Apply a partial configuration update
    ///
    /// Returns true if the update changed the window size or packet count
    /// and therefore reset the run.
    pub fn set_config(&mut self, patch: &ConfigPatch) -> Result<bool, ConfigError> {
        let candidate = self.config.patched(patch);
        if let Err(e) = candidate.validate() {
            return Err(self.reject(e));
        }

        if self.config.requires_reset(&candidate) {
            self.reset(candidate)?;
            return Ok(true);
        }

        let now = self.clock.now();
        self.sender.set_timeout(candidate.timeout());
        self.auto_send.set_period(candidate.auto_send_interval());
        if candidate.auto_send && !self.config.auto_send {
            self.auto_send.reset(now);
        }
        self.log.set_capacity(candidate.log_capacity);
        self.config = candidate;
        self.log.record(now, Event::Reconfigured);
        Ok(false)
    }

    /// Advance the simulation by `delta` of simulated time
    pub fn tick(&mut self, delta: Duration) -> TickReport {
        let mut report = TickReport::default();

        let batch: Vec<Command> = self.pending.drain(..).collect();
        report.commands_applied = batch.len();
        for command in batch {
            self.apply(command);
        }

        if self.finished_at.is_none() && self.clock.advance(delta) {
            report.advanced = true;
            let now = self.clock.now();

            let arrivals = self.channel.advance(delta, self.config.transit_speed);
            report.arrivals = arrivals.len();
            for packet in arrivals {
                self.deliver(packet, now);
            }

            if self.sender.poll_timeout(now) {
                self.record_timeout(now);
                report.timed_out = true;
            }

            if self.config.auto_send && self.auto_send.try_fire(now) && self.sender.can_send() {
                report.auto_sent = self.try_send();
            }
        }

        report.completed = self.check_completion();
        report.now = self.clock.now();
        report
    }

    /// Copy of the observable state
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            now: self.clock.now(),
            is_running: self.clock.is_running(),
            is_complete: self.is_complete(),
            sender_state: self.sender.state(),
            sender_base: self.sender.base().as_raw(),
            next_seq_num: self.sender.next_seq().as_raw(),
            receiver_expected: self.receiver.expected().as_raw(),
            packets: self.channel.packets().to_vec(),
            stats: self.stats,
            logs: self.log.to_vec(),
            logs_recorded: self.log.recorded(),
            timeout_elapsed_fraction: self.timeout_elapsed_fraction(),
            config: self.config.clone(),
        }
    }

    /// Summary of the run, once complete
    pub fn report(&self) -> Option<Report> {
        self.finished_at.map(|finished_at| Report {
            total_packets: self.config.total_packets,
            stats: self.stats,
            finished_at,
        })
    }

    fn deliver(&mut self, packet: Packet, now: SimInstant) {
        match packet.kind {
            PacketKind::Data => {
                let outcome = self.receiver.on_data(packet.seq);
                let event = match outcome {
                    DataOutcome::Accepted { ack } => Event::DataAccepted { seq: ack },
                    DataOutcome::Rejected {
                        expected,
                        duplicate_ack,
                    } => Event::DataRejected {
                        seq: packet.seq,
                        expected,
                        duplicate_ack,
                    },
                };
                self.log.record(now, event);

                if let Some(ack) = outcome.ack() {
                    self.channel.emit(PacketKind::Ack, ack);
                }
            }
            PacketKind::Ack => {
                let event = match self.sender.on_ack(packet.seq, now) {
                    AckOutcome::Advanced { base, .. } => Event::WindowSlid {
                        ack: packet.seq,
                        base,
                    },
                    AckOutcome::Duplicate => Event::DuplicateAck { seq: packet.seq },
                    AckOutcome::Unsent => Event::UnsentAck { seq: packet.seq },
                };
                self.log.record(now, event);
            }
        }
    }

    fn record_timeout(&mut self, now: SimInstant) {
        self.stats.retransmit_count += 1;
        self.log.record(
            now,
            Event::Timeout {
                base: self.sender.base(),
            },
        );
    }

    fn check_completion(&mut self) -> bool {
        if self.finished_at.is_some() || !self.sender.is_complete() {
            return false;
        }

        let now = self.clock.now();
        self.finished_at = Some(now);
        self.clock.pause();
        self.sender.pause();
        self.log.record(
            now,
            Event::Completed {
                total_packets: self.config.total_packets,
            },
        );
        true
    }

    fn reject(&mut self, error: ConfigError) -> ConfigError {
        self.log.record(
            self.clock.now(),
            Event::ConfigRejected {
                reason: error.to_string(),
            },
        );
        error
    }
}
