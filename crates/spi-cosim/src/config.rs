use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, SampleEdge};

/// Settings for one simulated exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BenchConfig {
    /// Command word sent when `TX_DATA` is not given.
    pub command: u32,
    pub clock_period_ns: u64,
    /// Time before rst_n is pulled low.
    pub reset_delay_ns: u64,
    pub reset_hold_ns: u64,
    /// Bound on master cycles before the run is declared deadlocked.
    pub max_cycles: u64,
    pub sample_edge: SampleEdge,
    pub vcd: Option<PathBuf>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            command: 0x1234_5678,
            clock_period_ns: 10,
            reset_delay_ns: 100,
            reset_hold_ns: 100,
            max_cycles: 100_000,
            sample_edge: SampleEdge::SharedClock,
            vcd: None,
        }
    }
}

/// Settings for the host side of the text boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    pub timeout_secs: u64,
    /// Simulation program to launch; defaults to this executable's `tb`.
    pub program: Option<PathBuf>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            program: None,
        }
    }
}

impl HostConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CosimConfig {
    pub bench: BenchConfig,
    pub host: HostConfig,
}

impl CosimConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let bench = &self.bench;
        if bench.clock_period_ns < 2 || !bench.clock_period_ns.is_multiple_of(2) {
            return Err(ConfigError::Invalid(format!(
                "clock_period_ns must be an even number >= 2, got {}",
                bench.clock_period_ns
            )));
        }
        if bench.max_cycles == 0 {
            return Err(ConfigError::Invalid("max_cycles must be positive".into()));
        }
        if self.host.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be positive".into()));
        }
        Ok(())
    }
}
