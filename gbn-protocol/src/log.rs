//! Protocol event log
//!
//! Every protocol-significant transition is recorded as a [`LogEntry`] in a
//! bounded ring: the newest `capacity` entries are kept, the oldest are
//! evicted. Each entry is also mirrored to `tracing` at a level matching its
//! severity.

use crate::sequence::SeqNumber;
use gbn_clock::SimInstant;
use std::collections::VecDeque;
use std::fmt;

/// Default number of retained log entries
pub const DEFAULT_LOG_CAPACITY: usize = 50;

/// Log severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "INFO",
            Severity::Success => "OK",
            Severity::Warning => "WARN",
            Severity::Error => "ERROR",
        };
        f.write_str(label)
    }
}

/// Protocol event
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Simulation started or resumed
    Started,
    /// Simulation paused
    Paused,
    /// Live configuration change (no reset)
    Reconfigured,
    /// Configuration refused; prior configuration kept
    ConfigRejected { reason: String },
    /// Sender put DATA on the link
    DataSent { seq: SeqNumber },
    /// Receiver accepted in-order DATA and acknowledged it
    DataAccepted { seq: SeqNumber },
    /// Receiver discarded out-of-order DATA
    DataRejected {
        seq: SeqNumber,
        expected: SeqNumber,
        duplicate_ack: Option<SeqNumber>,
    },
    /// Sender window slid forward
    WindowSlid { ack: SeqNumber, base: SeqNumber },
    /// ACK below the window base
    DuplicateAck { seq: SeqNumber },
    /// ACK for data never transmitted
    UnsentAck { seq: SeqNumber },
    /// Retransmission timer expired
    Timeout { base: SeqNumber },
    /// Fault injector dropped a DATA packet
    PacketLost { seq: SeqNumber },
    /// Every packet acknowledged
    Completed { total_packets: u32 },
}

impl Event {
    /// Severity this event is logged with
    pub fn severity(&self) -> Severity {
        match self {
            Event::Started
            | Event::Paused
            | Event::Reconfigured
            | Event::DataSent { .. }
            | Event::DuplicateAck { .. }
            | Event::UnsentAck { .. } => Severity::Info,
            Event::DataAccepted { .. } | Event::WindowSlid { .. } | Event::Completed { .. } => {
                Severity::Success
            }
            Event::DataRejected { .. } | Event::Timeout { .. } | Event::ConfigRejected { .. } => {
                Severity::Warning
            }
            Event::PacketLost { .. } => Severity::Error,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Started => write!(f, "Simulation running"),
            Event::Paused => write!(f, "Simulation paused"),
            Event::Reconfigured => write!(f, "Configuration updated"),
            Event::ConfigRejected { reason } => {
                write!(f, "Configuration rejected: {}", reason)
            }
            Event::DataSent { seq } => write!(f, "Sender: sent DATA {}", seq),
            Event::DataAccepted { seq } => {
                write!(f, "Receiver: accepted DATA {} in order, sending ACK {}", seq, seq)
            }
            Event::DataRejected {
                seq,
                expected,
                duplicate_ack,
            } => {
                write!(
                    f,
                    "Receiver: DATA {} out of order (expecting {}), discarded",
                    seq, expected
                )?;
                if let Some(ack) = duplicate_ack {
                    write!(f, ", re-sending ACK {}", ack)?;
                }
                Ok(())
            }
            Event::WindowSlid { ack, base } => {
                write!(f, "Sender: received ACK {}, window slides to {}", ack, base)
            }
            Event::DuplicateAck { seq } => {
                write!(f, "Sender: duplicate ACK {} ignored", seq)
            }
            Event::UnsentAck { seq } => {
                write!(f, "Sender: ACK {} for unsent data ignored", seq)
            }
            Event::Timeout { base } => write!(
                f,
                "TIMEOUT: no ACK for DATA {}, going back to resend from {}",
                base, base
            ),
            Event::PacketLost { seq } => write!(f, "Fault: DATA {} lost in transit", seq),
            Event::Completed { total_packets } => write!(
                f,
                "All {} packets delivered and acknowledged",
                total_packets
            ),
        }
    }
}

/// Immutable log record
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub timestamp: SimInstant,
    pub severity: Severity,
    pub message: String,
    pub event: Event,
}

/// Bounded ring of log entries
#[derive(Debug, Clone)]
pub struct EventLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    /// Entries recorded since creation, including evicted ones
    recorded: u64,
}

impl EventLog {
    /// Create an empty log; a zero capacity is raised to one
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        EventLog {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            recorded: 0,
        }
    }

    /// Append an entry, evicting the oldest if full
    pub fn record(&mut self, timestamp: SimInstant, event: Event) -> &LogEntry {
        let severity = event.severity();
        let message = event.to_string();

        match severity {
            Severity::Info => tracing::debug!(at = %timestamp, "{}", message),
            Severity::Success => tracing::info!(at = %timestamp, "{}", message),
            Severity::Warning | Severity::Error => {
                tracing::warn!(at = %timestamp, severity = %severity, "{}", message)
            }
        }

        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(LogEntry {
            timestamp,
            severity,
            message,
            event,
        });
        self.recorded += 1;

        // Just pushed, never empty
        &self.entries[self.entries.len() - 1]
    }

    /// Retained entries, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Retained entries recorded after the first `seen` entries of the log
    pub fn since(&self, seen: u64) -> impl Iterator<Item = &LogEntry> {
        let fresh = self.recorded.saturating_sub(seen);
        let skip = self.entries.len().saturating_sub(fresh as usize);
        self.entries.iter().skip(skip)
    }

    /// Most recent entry
    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total entries ever recorded
    pub fn recorded(&self) -> u64 {
        self.recorded
    }

    /// Change capacity, evicting the oldest entries if shrinking
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Copy of the retained entries
    pub fn to_vec(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sent(n: u32) -> Event {
        Event::DataSent {
            seq: SeqNumber::new(n),
        }
    }

    #[test]
    fn test_ring_evicts_oldest() {
        let mut log = EventLog::new(3);
        for i in 0..5 {
            log.record(SimInstant::from_millis(i as u64), sent(i));
        }

        assert_eq!(log.len(), 3);
        assert_eq!(log.recorded(), 5);
        let seqs: Vec<_> = log
            .iter()
            .map(|e| match e.event {
                Event::DataSent { seq } => seq.as_raw(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(seqs, vec![2, 3, 4]);
    }

    #[test]
    fn test_since() {
        let mut log = EventLog::new(3);
        log.record(SimInstant::ZERO, sent(0));
        let seen = log.recorded();
        log.record(SimInstant::ZERO, sent(1));
        log.record(SimInstant::ZERO, sent(2));

        assert_eq!(log.since(seen).count(), 2);
        assert_eq!(log.since(log.recorded()).count(), 0);
        // More fresh entries than retained: only the retained ones come back
        assert_eq!(log.since(0).count(), 3);
    }

    #[test]
    fn test_severity_mapping() {
        assert_eq!(sent(0).severity(), Severity::Info);
        assert_eq!(Event::Paused.severity(), Severity::Info);
        assert_eq!(
            Event::DuplicateAck {
                seq: SeqNumber::new(0)
            }
            .severity(),
            Severity::Info
        );
        assert_eq!(
            Event::UnsentAck {
                seq: SeqNumber::new(5)
            }
            .severity(),
            Severity::Info
        );
        assert_eq!(
            Event::PacketLost {
                seq: SeqNumber::new(1)
            }
            .severity(),
            Severity::Error
        );
        assert_eq!(
            Event::Timeout {
                base: SeqNumber::new(1)
            }
            .severity(),
            Severity::Warning
        );
    }

    #[test]
    fn test_messages() {
        let rejected = Event::DataRejected {
            seq: SeqNumber::new(4),
            expected: SeqNumber::new(3),
            duplicate_ack: Some(SeqNumber::new(2)),
        };
        assert_eq!(
            rejected.to_string(),
            "Receiver: DATA 4 out of order (expecting 3), discarded, re-sending ACK 2"
        );

        let entry = EventLog::new(1)
            .record(SimInstant::ZERO, sent(7))
            .clone();
        assert_eq!(entry.message, "Sender: sent DATA 7");
        assert_eq!(entry.severity, Severity::Info);
    }

    #[test]
    fn test_shrink_capacity() {
        let mut log = EventLog::new(5);
        for i in 0..5 {
            log.record(SimInstant::ZERO, sent(i));
        }
        log.set_capacity(2);
        assert_eq!(log.len(), 2);
        assert_eq!(log.capacity(), 2);
    }
}
