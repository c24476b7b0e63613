//! Simulation configuration
//!
//! A [`SimulationConfig`] is validated before it can reach a running
//! simulation. Partial updates arrive as a [`ConfigPatch`]; changing the
//! window size or the number of packets restarts the run, every other
//! field applies live.

use crate::log::DEFAULT_LOG_CAPACITY;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default sliding window size
pub const DEFAULT_WINDOW_SIZE: u32 = 4;
/// Default number of DATA packets per run
pub const DEFAULT_TOTAL_PACKETS: u32 = 8;
/// Default transit speed (progress units per simulated second)
pub const DEFAULT_TRANSIT_SPEED: f64 = 0.3;
/// Default retransmission timeout
pub const DEFAULT_TIMEOUT_MS: u64 = 4000;
/// Default period between automatic send attempts
pub const DEFAULT_AUTO_SEND_INTERVAL_MS: u64 = 1500;

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Window size must be at least 1")]
    ZeroWindow,

    #[error("Total packets must be at least 1")]
    ZeroPackets,

    #[error("Transit speed must be positive and finite, got {0}")]
    InvalidTransitSpeed(f64),

    #[error("Timeout must be greater than zero")]
    ZeroTimeout,

    #[error("Auto-send interval must be greater than zero")]
    ZeroAutoSendInterval,

    #[error("Log capacity must be at least 1")]
    ZeroLogCapacity,
}

/// Parameters of one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Maximum unacknowledged packets
    #[serde(default = "default_window_size")]
    pub window_size: u32,
    /// DATA packets to deliver
    #[serde(default = "default_total_packets")]
    pub total_packets: u32,
    /// Fraction of the link covered per simulated second
    #[serde(default = "default_transit_speed")]
    pub transit_speed: f64,
    /// Retransmission timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Send automatically every `auto_send_interval_ms`
    #[serde(default)]
    pub auto_send: bool,
    /// Period between automatic send attempts in milliseconds
    #[serde(default = "default_auto_send_interval_ms")]
    pub auto_send_interval_ms: u64,
    /// Retained log entries
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
}

fn default_window_size() -> u32 {
    DEFAULT_WINDOW_SIZE
}

fn default_total_packets() -> u32 {
    DEFAULT_TOTAL_PACKETS
}

fn default_transit_speed() -> f64 {
    DEFAULT_TRANSIT_SPEED
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_auto_send_interval_ms() -> u64 {
    DEFAULT_AUTO_SEND_INTERVAL_MS
}

fn default_log_capacity() -> usize {
    DEFAULT_LOG_CAPACITY
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            window_size: DEFAULT_WINDOW_SIZE,
            total_packets: DEFAULT_TOTAL_PACKETS,
            transit_speed: DEFAULT_TRANSIT_SPEED,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            auto_send: false,
            auto_send_interval_ms: DEFAULT_AUTO_SEND_INTERVAL_MS,
            log_capacity: DEFAULT_LOG_CAPACITY,
        }
    }
}

impl SimulationConfig {
    /// Check every field
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        if self.total_packets == 0 {
            return Err(ConfigError::ZeroPackets);
        }
        if !(self.transit_speed.is_finite() && self.transit_speed > 0.0) {
            return Err(ConfigError::InvalidTransitSpeed(self.transit_speed));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.auto_send_interval_ms == 0 {
            return Err(ConfigError::ZeroAutoSendInterval);
        }
        if self.log_capacity == 0 {
            return Err(ConfigError::ZeroLogCapacity);
        }
        Ok(())
    }

    /// Retransmission timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Auto-send period as Duration
    pub fn auto_send_interval(&self) -> Duration {
        Duration::from_millis(self.auto_send_interval_ms)
    }

    /// Copy of this config with the patch applied (not validated)
    pub fn patched(&self, patch: &ConfigPatch) -> SimulationConfig {
        SimulationConfig {
            window_size: patch.window_size.unwrap_or(self.window_size),
            total_packets: patch.total_packets.unwrap_or(self.total_packets),
            transit_speed: patch.transit_speed.unwrap_or(self.transit_speed),
            timeout_ms: patch.timeout_ms.unwrap_or(self.timeout_ms),
            auto_send: patch.auto_send.unwrap_or(self.auto_send),
            auto_send_interval_ms: patch
                .auto_send_interval_ms
                .unwrap_or(self.auto_send_interval_ms),
            log_capacity: patch.log_capacity.unwrap_or(self.log_capacity),
        }
    }

    /// Switching to `other` changes the shape of the run
    pub fn requires_reset(&self, other: &SimulationConfig) -> bool {
        self.window_size != other.window_size || self.total_packets != other.total_packets
    }
}

/// Partial configuration update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigPatch {
    pub window_size: Option<u32>,
    pub total_packets: Option<u32>,
    pub transit_speed: Option<f64>,
    pub timeout_ms: Option<u64>,
    pub auto_send: Option<bool>,
    pub auto_send_interval_ms: Option<u64>,
    pub log_capacity: Option<usize>,
}

impl ConfigPatch {
    pub fn new() -> Self {
        ConfigPatch::default()
    }

    pub fn window_size(mut self, window_size: u32) -> Self {
        self.window_size = Some(window_size);
        self
    }

    pub fn total_packets(mut self, total_packets: u32) -> Self {
        self.total_packets = Some(total_packets);
        self
    }

    pub fn transit_speed(mut self, transit_speed: f64) -> Self {
        self.transit_speed = Some(transit_speed);
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn auto_send(mut self, auto_send: bool) -> Self {
        self.auto_send = Some(auto_send);
        self
    }

    pub fn auto_send_interval_ms(mut self, interval_ms: u64) -> Self {
        self.auto_send_interval_ms = Some(interval_ms);
        self
    }

    pub fn log_capacity(mut self, log_capacity: usize) -> Self {
        self.log_capacity = Some(log_capacity);
        self
    }

    /// Check if the patch changes nothing
    pub fn is_empty(&self) -> bool {
        *self == ConfigPatch::default()
    }
}
