//! Configuration file support for the simulator CLI

use gbn_protocol::{ConfigError, SimulationConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// How a run is driven
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Simulated time per tick in milliseconds
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Fault injector seed (random if absent)
    pub seed: Option<u64>,
    /// Give up after this much simulated time
    #[serde(default = "default_max_time_ms")]
    pub max_time_ms: u64,
    /// Simulated times at which a random in-flight DATA packet is dropped
    #[serde(default)]
    pub drop_at_ms: Vec<u64>,
    /// Manual send cadence, used when auto-send is off
    pub send_every_ms: Option<u64>,
}

fn default_tick_ms() -> u64 {
    50
}

fn default_max_time_ms() -> u64 {
    300_000
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            tick_ms: default_tick_ms(),
            seed: None,
            max_time_ms: default_max_time_ms(),
            drop_at_ms: Vec::new(),
            send_every_ms: None,
        }
    }
}

impl RunConfig {
    /// Get tick length as Duration
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Get the time limit as Duration
    pub fn max_time(&self) -> Duration {
        Duration::from_millis(self.max_time_ms)
    }
}

/// Combined configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Protocol parameters
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Run parameters
    #[serde(default)]
    pub run: RunConfig,
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CliConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CliConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Create example configuration: two scripted losses, manual sends
    pub fn example() -> Self {
        Config {
            simulation: SimulationConfig::default(),
            run: RunConfig {
                seed: Some(42),
                drop_at_ms: vec![2_000, 9_000],
                send_every_ms: Some(1_000),
                ..RunConfig::default()
            },
        }
    }

    /// Check both sections
    pub fn validate(&self) -> Result<(), CliConfigError> {
        self.simulation.validate()?;
        if self.run.tick_ms == 0 {
            return Err(CliConfigError::Invalid("tick_ms must be greater than zero".into()));
        }
        if self.run.send_every_ms == Some(0) {
            return Err(CliConfigError::Invalid(
                "send_every_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum CliConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Invalid simulation configuration: {0}")]
    Simulation(#[from] ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_config() {
        let config = Config::example();
        assert!(config.validate().is_ok());
        assert_eq!(config.run.drop_at_ms.len(), 2);
    }

    #[test]
    fn test_serialize_deserialize() {
        let config = Config::example();
        let toml = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();

        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_document() {
        let parsed: Config = toml::from_str(
            r#"
            [simulation]
            window_size = 6

            [run]
            drop_at_ms = [1500]
            "#,
        )
        .unwrap();

        assert_eq!(parsed.simulation.window_size, 6);
        assert_eq!(parsed.simulation.total_packets, 8);
        assert_eq!(parsed.run.tick_ms, 50);
        assert_eq!(parsed.run.drop_at_ms, vec![1500]);
        assert!(parsed.run.seed.is_none());
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        config.run.tick_ms = 0;
        assert!(matches!(config.validate(), Err(CliConfigError::Invalid(_))));

        let mut config = Config::default();
        config.simulation.window_size = 0;
        assert!(matches!(
            config.validate(),
            Err(CliConfigError::Simulation(ConfigError::ZeroWindow))
        ));
    }
}
