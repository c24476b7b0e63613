//! Report and log formatting

use gbn_protocol::{LogEntry, Report, Snapshot};
use std::io::Write;
use std::time::Duration;

/// Format duration in human-readable form
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{}h {:02}m {:02}.{:03}s", hours, minutes, seconds, millis)
    } else if minutes > 0 {
        format!("{}m {:02}.{:03}s", minutes, seconds, millis)
    } else {
        format!("{}.{:03}s", seconds, millis)
    }
}

/// Format one log entry as a line
pub fn format_log_entry(entry: &LogEntry) -> String {
    format!(
        "[{:>9}] {:<5} {}",
        entry.timestamp.to_string(),
        entry.severity.to_string(),
        entry.message
    )
}

/// Format the final report as a box
pub fn format_report(report: &Report) -> String {
    let verdict = if report.is_perfect() {
        "perfect run, no losses"
    } else {
        "recovered from losses"
    };

    let rows = [
        format!("Packets delivered: {}", report.total_packets),
        format!("Packets sent:      {}", report.stats.total_sent),
        format!("Packets lost:      {}", report.stats.lost_count),
        format!("Timeouts:          {}", report.stats.retransmit_count),
        format!("Efficiency:        {}%", report.efficiency_percent()),
        format!(
            "Finished after:    {}",
            format_duration(report.finished_at.as_duration())
        ),
        format!("Result:            {}", verdict),
    ];

    let mut out = String::new();
    out.push_str("┌─────────────────────────────────────────────┐\n");
    out.push_str("│ RUN REPORT                                  │\n");
    out.push_str("├─────────────────────────────────────────────┤\n");
    for row in rows {
        out.push_str(&format!("│ {:<43} │\n", row));
    }
    out.push_str("└─────────────────────────────────────────────┘");
    out
}

/// Format the state on one line (for continuous updates)
pub fn format_status_line(snapshot: &Snapshot) -> String {
    format!(
        "[{:>9}] {:?} | window {}..{} | base {} next {} expected {} | in flight {} | sent {} lost {} timeouts {} | timer {:>3.0}%",
        snapshot.now.to_string(),
        snapshot.sender_state,
        snapshot.sender_base,
        snapshot.window_end(),
        snapshot.sender_base,
        snapshot.next_seq_num,
        snapshot.receiver_expected,
        snapshot.in_flight().count(),
        snapshot.stats.total_sent,
        snapshot.stats.lost_count,
        snapshot.stats.retransmit_count,
        snapshot.timeout_elapsed_fraction * 100.0
    )
}

/// Display the final report
pub fn display_report(report: &Report) {
    println!("\n{}", format_report(report));
}

/// Display compact status on one line, overwriting the previous one
pub fn display_compact_status(snapshot: &Snapshot) {
    print!("\r{}    ", format_status_line(snapshot));
    let _ = std::io::stdout().flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use gbn_clock::SimInstant;
    use gbn_protocol::{Event, EventLog, SeqNumber, Simulation, SimulationConfig, Stats};

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.500s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30.000s");
        assert_eq!(format_duration(Duration::from_secs(3661)), "1h 01m 01.000s");
    }

    #[test]
    fn test_format_log_entry() {
        let mut log = EventLog::new(4);
        let entry = log
            .record(
                SimInstant::from_millis(1250),
                Event::Timeout {
                    base: SeqNumber::new(2),
                },
            )
            .clone();

        assert_eq!(
            format_log_entry(&entry),
            "[   1.250s] WARN  TIMEOUT: no ACK for DATA 2, going back to resend from 2"
        );
    }

    #[test]
    fn test_format_report() {
        let report = Report {
            total_packets: 8,
            stats: Stats {
                total_sent: 12,
                lost_count: 1,
                retransmit_count: 1,
            },
            finished_at: SimInstant::from_millis(21_300),
        };

        let text = format_report(&report);
        assert!(text.contains("Efficiency:        67%"));
        assert!(text.contains("recovered from losses"));
        assert!(text.contains("21.300s"));
    }

    #[test]
    fn test_status_line() {
        let sim = Simulation::with_seed(SimulationConfig::default(), 0).unwrap();
        let line = format_status_line(&sim.snapshot());
        assert!(line.starts_with("[   0.000s] Idle | window 0..4 | base 0 next 0 expected 0"));

        // The window is cut short by the end of the run
        let config = SimulationConfig {
            window_size: 4,
            total_packets: 2,
            ..SimulationConfig::default()
        };
        let sim = Simulation::with_seed(config, 0).unwrap();
        assert!(format_status_line(&sim.snapshot()).contains("| window 0..2 |"));
    }
}
