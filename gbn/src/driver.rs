//! Real-time driver
//!
//! The [`Driver`] owns a [`Simulation`] and is the only thing that ticks it.
//! Other threads talk to it through a [`SimulationHandle`]: commands travel
//! over a crossbeam channel and are queued for the next tick, and the latest
//! [`Snapshot`] is published behind a `RwLock` after every tick.

use crate::protocol::{Command, ConfigPatch, Simulation, SimulationConfig, Snapshot, TickReport};
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use parking_lot::RwLock;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Driver errors
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Driver is no longer running")]
    Disconnected,

    #[error("Driver thread panicked")]
    Panicked,

    #[error("Failed to spawn driver thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Ticks a simulation and serves its handles
pub struct Driver {
    simulation: Simulation,
    commands: Receiver<Command>,
    shared: Arc<RwLock<Snapshot>>,
    disconnected: bool,
}

impl Driver {
    /// Wrap a simulation, returning the driver and a first handle
    pub fn new(simulation: Simulation) -> (Driver, SimulationHandle) {
        let (tx, rx) = channel::unbounded();
        let shared = Arc::new(RwLock::new(simulation.snapshot()));

        let handle = SimulationHandle {
            commands: tx,
            shared: shared.clone(),
        };
        let driver = Driver {
            simulation,
            commands: rx,
            shared,
            disconnected: false,
        };
        (driver, handle)
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// Every handle has been dropped
    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }

    /// Queue received commands, tick once and publish the new snapshot
    pub fn step(&mut self, delta: Duration) -> TickReport {
        self.collect_commands();
        let report = self.simulation.tick(delta);
        self.publish();
        report
    }

    /// Tick in real time until every handle is dropped
    ///
    /// Each tick advances the simulation by the wall time since the previous
    /// one. Between ticks the driver waits for commands, at most
    /// `tick_interval`. A completed run keeps being served so handles can
    /// still reset or reconfigure it.
    pub fn run(mut self, tick_interval: Duration) -> Simulation {
        tracing::info!(?tick_interval, seed = self.simulation.seed(), "driver started");

        let mut last_tick = Instant::now();
        loop {
            let now = Instant::now();
            let report = self.step(now.duration_since(last_tick));
            last_tick = now;

            if report.completed {
                tracing::info!(at = %report.now, "run complete");
            }
            if self.disconnected {
                tracing::info!("all handles dropped, driver stopping");
                break;
            }

            let deadline = last_tick + tick_interval;
            self.wait_for_commands(deadline);
        }

        self.simulation
    }

    /// Run on a dedicated thread
    pub fn spawn(
        simulation: Simulation,
        tick_interval: Duration,
    ) -> Result<(SimulationHandle, DriverThread), DriverError> {
        let (driver, handle) = Driver::new(simulation);
        let join = thread::Builder::new()
            .name("gbn-driver".into())
            .spawn(move || driver.run(tick_interval))?;
        Ok((handle, DriverThread { join }))
    }

    fn collect_commands(&mut self) {
        loop {
            match self.commands.try_recv() {
                Ok(command) => self.simulation.enqueue(command),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.disconnected = true;
                    break;
                }
            }
        }
    }

    fn wait_for_commands(&mut self, deadline: Instant) {
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return;
            }
            match self.commands.recv_timeout(remaining) {
                Ok(command) => self.simulation.enqueue(command),
                Err(RecvTimeoutError::Timeout) => return,
                Err(RecvTimeoutError::Disconnected) => {
                    self.disconnected = true;
                    return;
                }
            }
        }
    }

    fn publish(&self) {
        *self.shared.write() = self.simulation.snapshot();
    }
}

/// Join handle of a spawned driver
pub struct DriverThread {
    join: JoinHandle<Simulation>,
}

impl DriverThread {
    /// Wait for the driver to stop and take back the simulation
    pub fn join(self) -> Result<Simulation, DriverError> {
        self.join.join().map_err(|_| DriverError::Panicked)
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

/// Cloneable remote control for a running driver
#[derive(Clone)]
pub struct SimulationHandle {
    commands: Sender<Command>,
    shared: Arc<RwLock<Snapshot>>,
}

impl SimulationHandle {
    /// Queue a command for the next tick
    pub fn command(&self, command: Command) -> Result<(), DriverError> {
        self.commands
            .send(command)
            .map_err(|_| DriverError::Disconnected)
    }

    pub fn start(&self) -> Result<(), DriverError> {
        self.command(Command::Start)
    }

    pub fn pause(&self) -> Result<(), DriverError> {
        self.command(Command::Pause)
    }

    pub fn send(&self) -> Result<(), DriverError> {
        self.command(Command::TrySend)
    }

    pub fn drop_random(&self) -> Result<(), DriverError> {
        self.command(Command::DropRandomData)
    }

    pub fn force_timeout(&self) -> Result<(), DriverError> {
        self.command(Command::ForceTimeout)
    }

    pub fn reset(&self) -> Result<(), DriverError> {
        self.command(Command::Reset)
    }

    pub fn reset_with(&self, config: SimulationConfig) -> Result<(), DriverError> {
        self.command(Command::ResetWith(config))
    }

    pub fn set_config(&self, patch: ConfigPatch) -> Result<(), DriverError> {
        self.command(Command::SetConfig(patch))
    }

    /// Snapshot published after the most recent tick
    pub fn snapshot(&self) -> Snapshot {
        self.shared.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simulation() -> Simulation {
        let config = SimulationConfig {
            window_size: 4,
            total_packets: 2,
            transit_speed: 1.0,
            ..SimulationConfig::default()
        };
        Simulation::with_seed(config, 3).unwrap()
    }

    #[test]
    fn test_step_applies_commands_and_publishes() {
        let (mut driver, handle) = Driver::new(simulation());
        handle.start().unwrap();
        handle.send().unwrap();
        assert_eq!(handle.snapshot().packets.len(), 0);

        let report = driver.step(Duration::from_millis(500));
        assert_eq!(report.commands_applied, 2);

        let snapshot = handle.snapshot();
        assert!(snapshot.is_running);
        assert_eq!(snapshot.next_seq_num, 1);
        assert_eq!(snapshot.packets.len(), 1);
        assert_eq!(snapshot.packets[0].progress, 0.5);
    }

    #[test]
    fn test_disconnect_detected() {
        let (mut driver, handle) = Driver::new(simulation());
        drop(handle);
        driver.step(Duration::ZERO);
        assert!(driver.is_disconnected());
    }

    #[test]
    fn test_handle_errors_after_driver_drop() {
        let (driver, handle) = Driver::new(simulation());
        drop(driver);
        assert!(matches!(handle.start(), Err(DriverError::Disconnected)));
    }

    #[test]
    fn test_spawned_driver_serves_until_handles_drop() {
        let mut sim = simulation();
        sim.set_config(&ConfigPatch::new().transit_speed(50.0)).unwrap();

        let (handle, driver) = Driver::spawn(sim, Duration::from_millis(1)).unwrap();
        handle.start().unwrap();
        handle.send().unwrap();
        handle.send().unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        while !handle.snapshot().is_complete && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert!(handle.snapshot().is_complete);
        assert!(!driver.is_finished());

        drop(handle);
        let sim = driver.join().unwrap();
        assert!(sim.is_complete());
        assert_eq!(sim.stats().total_sent, 2);
    }
}
