//! GBN Simulator - Go-Back-N sliding-window run from the command line
//!
//! Runs a single simulation to completion, printing every protocol event as
//! it happens and a report at the end. Headless mode ticks as fast as
//! possible; realtime mode paces ticks against the wall clock on a driver
//! thread.

use clap::Parser;
use gbn::driver::Driver;
use gbn_cli::{display_compact_status, display_report, format_log_entry, Config, Script};
use gbn_clock::SimInstant;
use gbn_protocol::{ConfigPatch, EventLog, Report, Simulation};
use std::path::PathBuf;
use std::thread;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gbn-sim")]
#[command(about = "Go-Back-N ARQ sliding-window simulator", long_about = None)]
struct Args {
    /// Sliding window size
    #[arg(short, long)]
    window: Option<u32>,

    /// Number of DATA packets to deliver
    #[arg(short, long)]
    packets: Option<u32>,

    /// Transit speed (fraction of the link per simulated second)
    #[arg(short, long)]
    speed: Option<f64>,

    /// Retransmission timeout in milliseconds
    #[arg(short, long)]
    timeout_ms: Option<u64>,

    /// Send automatically
    #[arg(short, long)]
    auto_send: bool,

    /// Auto-send period in milliseconds
    #[arg(long)]
    auto_send_interval_ms: Option<u64>,

    /// Fault injector seed
    #[arg(long)]
    seed: Option<u64>,

    /// Simulated time per tick in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Give up after this much simulated time
    #[arg(long)]
    max_time_ms: Option<u64>,

    /// Drop a random in-flight DATA packet at this simulated time (repeatable)
    #[arg(long = "drop-at", value_name = "MS")]
    drop_at: Vec<u64>,

    /// Send one packet every N milliseconds when auto-send is off
    #[arg(long)]
    send_every_ms: Option<u64>,

    /// Load settings from a TOML file (flags override it)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write an example configuration file and exit
    #[arg(long, value_name = "FILE")]
    write_example: Option<PathBuf>,

    /// Pace ticks against the wall clock on a driver thread
    #[arg(long)]
    realtime: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Apply flags on top of the file configuration
    fn apply(&self, config: &mut Config) {
        let patch = ConfigPatch {
            window_size: self.window,
            total_packets: self.packets,
            transit_speed: self.speed,
            timeout_ms: self.timeout_ms,
            auto_send: self.auto_send.then_some(true),
            auto_send_interval_ms: self.auto_send_interval_ms,
            log_capacity: None,
        };
        config.simulation = config.simulation.patched(&patch);

        if let Some(seed) = self.seed {
            config.run.seed = Some(seed);
        }
        if let Some(tick_ms) = self.tick_ms {
            config.run.tick_ms = tick_ms;
        }
        if let Some(max_time_ms) = self.max_time_ms {
            config.run.max_time_ms = max_time_ms;
        }
        if !self.drop_at.is_empty() {
            config.run.drop_at_ms = self.drop_at.clone();
        }
        if let Some(send_every_ms) = self.send_every_ms {
            config.run.send_every_ms = Some(send_every_ms);
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Some(path) = &args.write_example {
        Config::example().to_file(path)?;
        println!("Example configuration written to {}", path.display());
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => {
            tracing::info!("Loading configuration from {}", path.display());
            Config::from_file(path)?
        }
        None => Config::default(),
    };
    args.apply(&mut config);

    if !config.simulation.auto_send && config.run.send_every_ms.is_none() {
        tracing::info!("No send cadence given, enabling auto-send");
        config.simulation.auto_send = true;
    }
    config.validate()?;

    let simulation = match config.run.seed {
        Some(seed) => Simulation::with_seed(config.simulation.clone(), seed)?,
        None => Simulation::new(config.simulation.clone())?,
    };

    tracing::info!(
        "GBN simulation: window {}, {} packets, speed {}, timeout {}ms, seed {}",
        config.simulation.window_size,
        config.simulation.total_packets,
        config.simulation.transit_speed,
        config.simulation.timeout_ms,
        simulation.seed()
    );

    let report = if args.realtime {
        run_realtime(simulation, &config)?
    } else {
        run_headless(simulation, &config)
    };

    match report {
        Some(report) => {
            display_report(&report);
            Ok(())
        }
        None => anyhow::bail!(
            "Run did not complete within {}ms of simulated time",
            config.run.max_time_ms
        ),
    }
}

/// Tick as fast as possible
fn run_headless(mut simulation: Simulation, config: &Config) -> Option<Report> {
    let mut script = Script::new(&config.run);
    let tick = config.run.tick();
    let deadline = SimInstant::from_duration(config.run.max_time());
    let mut seen = 0;

    simulation.start();
    print_new_entries(simulation.log(), &mut seen);

    loop {
        for command in script.due(simulation.now()) {
            simulation.enqueue(command);
        }

        let tick_report = simulation.tick(tick);
        print_new_entries(simulation.log(), &mut seen);

        if tick_report.completed {
            return simulation.report();
        }
        if simulation.now() >= deadline {
            return None;
        }
    }
}

/// Tick on a driver thread paced by the wall clock
fn run_realtime(simulation: Simulation, config: &Config) -> anyhow::Result<Option<Report>> {
    let mut script = Script::new(&config.run);
    let deadline = SimInstant::from_duration(config.run.max_time());
    let tick = config.run.tick();
    let mut seen = 0;

    let (handle, driver) = Driver::spawn(simulation, tick)?;
    handle.start()?;

    loop {
        let snapshot = handle.snapshot();
        if snapshot.logs_recorded < seen {
            seen = 0;
        }
        for entry in snapshot.logs_since(seen) {
            println!("\r{}", format_log_entry(entry));
        }
        seen = snapshot.logs_recorded;
        display_compact_status(&snapshot);

        if snapshot.is_complete || snapshot.now >= deadline {
            break;
        }
        for command in script.due(snapshot.now) {
            handle.command(command)?;
        }
        thread::sleep(tick);
    }

    drop(handle);
    let simulation = driver.join()?;
    println!();
    print_new_entries(simulation.log(), &mut seen);
    Ok(simulation.report())
}

fn print_new_entries(log: &EventLog, seen: &mut u64) {
    for entry in log.since(*seen) {
        println!("{}", format_log_entry(entry));
    }
    *seen = log.recorded();
}
