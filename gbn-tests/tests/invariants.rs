//! Property-based tests for the simulation invariants
//!
//! Random command and tick sequences are applied to a seeded simulation and
//! the window, receiver, counter and channel invariants are checked after
//! every step.

use gbn_protocol::{Command, ConfigPatch, Simulation, SimulationConfig, Stats};
use proptest::prelude::*;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Op {
    Start,
    Pause,
    Send,
    Drop,
    ForceTimeout,
    Tick(u64),
    SetSpeed(f64),
    SetTimeout(u64),
    ToggleAutoSend(bool),
    Reset,
    Queue(Command),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        1 => Just(Op::Start),
        1 => Just(Op::Pause),
        4 => Just(Op::Send),
        2 => Just(Op::Drop),
        1 => Just(Op::ForceTimeout),
        6 => (0u64..=2000).prop_map(Op::Tick),
        1 => (0.05f64..3.0).prop_map(Op::SetSpeed),
        1 => (100u64..5000).prop_map(Op::SetTimeout),
        1 => any::<bool>().prop_map(Op::ToggleAutoSend),
        1 => Just(Op::Reset),
        2 => prop_oneof![
            Just(Command::TrySend),
            Just(Command::DropRandomData),
            Just(Command::ForceTimeout),
            Just(Command::Start),
        ]
        .prop_map(Op::Queue),
    ]
}

fn config_strategy() -> impl Strategy<Value = SimulationConfig> {
    (1u32..8, 1u32..20, 0.1f64..2.0, 200u64..5000, any::<bool>()).prop_map(
        |(window_size, total_packets, transit_speed, timeout_ms, auto_send)| SimulationConfig {
            window_size,
            total_packets,
            transit_speed,
            timeout_ms,
            auto_send,
            auto_send_interval_ms: 500,
            log_capacity: 20,
        },
    )
}

/// What must hold after any step
fn check_invariants(sim: &Simulation) -> Result<(), TestCaseError> {
    let config = sim.config();
    let base = sim.sender().base().as_raw();
    let next = sim.sender().next_seq().as_raw();
    let expected = sim.receiver().expected().as_raw();

    prop_assert!(base <= next, "base {} > next {}", base, next);
    prop_assert!(next <= config.total_packets);
    prop_assert!(next - base <= config.window_size);
    prop_assert!(expected <= config.total_packets);
    // ACKs only come from the receiver
    prop_assert!(base <= expected, "base {} ahead of receiver {}", base, expected);

    prop_assert!(sim.log().len() <= config.log_capacity);

    let fraction = sim.timeout_elapsed_fraction();
    prop_assert!((0.0..=1.0).contains(&fraction));

    for packet in sim.channel().packets() {
        prop_assert!((0.0..=1.0).contains(&packet.progress));
        prop_assert!(packet.seq.as_raw() < config.total_packets);
        if packet.is_in_flight() {
            prop_assert!(packet.progress < 1.0);
        }
    }

    if sim.is_complete() {
        prop_assert_eq!(base, config.total_packets);
    }
    Ok(())
}

fn counters_monotonic(before: Stats, after: Stats) -> bool {
    after.total_sent >= before.total_sent
        && after.lost_count >= before.lost_count
        && after.retransmit_count >= before.retransmit_count
}

proptest! {
    #[test]
    fn prop_invariants_hold(
        config in config_strategy(),
        seed in any::<u64>(),
        ops in prop::collection::vec(op_strategy(), 1..200),
    ) {
        let mut sim = Simulation::with_seed(config, seed).unwrap();
        sim.start();
        check_invariants(&sim)?;

        for op in ops {
            let stats_before = sim.stats();
            let expected_before = sim.receiver().expected();
            let recorded_before = sim.log().recorded();
            let resets = matches!(op, Op::Reset);

            match op {
                Op::Start => { sim.start(); }
                Op::Pause => { sim.pause(); }
                Op::Send => { sim.try_send(); }
                Op::Drop => { sim.drop_random_in_flight_data(); }
                Op::ForceTimeout => { sim.force_timeout(); }
                Op::Tick(ms) => { sim.tick(Duration::from_millis(ms)); }
                Op::SetSpeed(speed) => {
                    prop_assert_eq!(sim.set_config(&ConfigPatch::new().transit_speed(speed)), Ok(false));
                }
                Op::SetTimeout(ms) => {
                    prop_assert_eq!(sim.set_config(&ConfigPatch::new().timeout_ms(ms)), Ok(false));
                }
                Op::ToggleAutoSend(on) => {
                    prop_assert_eq!(sim.set_config(&ConfigPatch::new().auto_send(on)), Ok(false));
                }
                Op::Reset => sim.restart(),
                Op::Queue(command) => sim.enqueue(command),
            }

            check_invariants(&sim)?;
            if !resets {
                prop_assert!(counters_monotonic(stats_before, sim.stats()));
                prop_assert!(sim.receiver().expected() >= expected_before);
                prop_assert!(sim.log().recorded() >= recorded_before);
            }
        }
    }

    #[test]
    fn prop_eventually_completes_after_losses_stop(
        config in config_strategy(),
        seed in any::<u64>(),
        drop_ticks in prop::collection::vec(0usize..200, 0..6),
    ) {
        let mut sim = Simulation::with_seed(
            SimulationConfig { auto_send: true, ..config },
            seed,
        )
        .unwrap();
        sim.start();

        let tick = Duration::from_millis(100);
        let mut completed = false;
        for i in 0..20_000 {
            if drop_ticks.contains(&i) {
                sim.drop_random_in_flight_data();
            }
            if sim.tick(tick).completed {
                completed = true;
                break;
            }
        }

        prop_assert!(completed, "run stalled at base {}", sim.sender().base());
        let report = sim.report().unwrap();
        prop_assert!(report.stats.total_sent >= u64::from(report.total_packets));
        prop_assert_eq!(sim.receiver().expected().as_raw(), report.total_packets);
    }

    #[test]
    fn prop_reset_restores_initial_state(
        config in config_strategy(),
        seed in any::<u64>(),
        ticks in 0usize..50,
    ) {
        let mut sim = Simulation::with_seed(SimulationConfig { auto_send: true, ..config.clone() }, seed).unwrap();
        sim.start();
        for _ in 0..ticks {
            sim.try_send();
            sim.drop_random_in_flight_data();
            sim.tick(Duration::from_millis(300));
        }

        sim.reset(config.clone()).unwrap();
        let snapshot = sim.snapshot();
        prop_assert_eq!(snapshot.sender_base, 0);
        prop_assert_eq!(snapshot.next_seq_num, 0);
        prop_assert_eq!(snapshot.receiver_expected, 0);
        prop_assert_eq!(snapshot.stats, Stats::default());
        prop_assert!(snapshot.logs.is_empty());
        prop_assert!(snapshot.packets.is_empty());
        prop_assert_eq!(snapshot.config, config);
    }
}
