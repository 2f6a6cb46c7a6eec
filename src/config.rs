//! Sampler configuration
//!
//! Every field has a default, so a JSON file only needs the keys it overrides:
//!
//! ```rust
//! use darwin_memwatch::config::SamplerConfig;
//!
//! let config = SamplerConfig::from_json_str(r#"{ "battery_interval_secs": 30 }"#).unwrap();
//! assert_eq!(config.battery_interval_secs, 30);
//! assert_eq!(config.ac_interval_secs, 5);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::memory::constants::{
    DEFAULT_CRITICAL_RATIO, DEFAULT_TOP_PROCESS_COUNT, DEFAULT_WARNING_RATIO, MAX_TOP_PROCESS_COUNT,
};
use crate::memory::PressureThresholds;
use crate::sampler::constants::{
    DEFAULT_AC_INTERVAL_SECS, DEFAULT_BATTERY_INTERVAL_SECS, DEFAULT_COMMAND_TIMEOUT_MS,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SamplerConfig {
    /// Sampling period while on AC power
    pub ac_interval_secs: u64,
    /// Sampling period while on battery
    pub battery_interval_secs: u64,
    /// How many top memory consumers to keep
    pub top_process_count: usize,
    pub warning_ratio: f64,
    pub critical_ratio: f64,
    /// Upper bound on each `top`/`ps` invocation
    pub command_timeout_ms: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            ac_interval_secs: DEFAULT_AC_INTERVAL_SECS,
            battery_interval_secs: DEFAULT_BATTERY_INTERVAL_SECS,
            top_process_count: DEFAULT_TOP_PROCESS_COUNT,
            warning_ratio: DEFAULT_WARNING_RATIO,
            critical_ratio: DEFAULT_CRITICAL_RATIO,
            command_timeout_ms: DEFAULT_COMMAND_TIMEOUT_MS,
        }
    }
}

impl SamplerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ac_interval_secs == 0 || self.battery_interval_secs == 0 {
            return Err(Error::invalid_config(format!(
                "sampling intervals must be positive (ac: {}, battery: {})",
                self.ac_interval_secs, self.battery_interval_secs
            )));
        }
        if !(1..=MAX_TOP_PROCESS_COUNT).contains(&self.top_process_count) {
            return Err(Error::invalid_config(format!(
                "top_process_count must be between 1 and {}, got {}",
                MAX_TOP_PROCESS_COUNT, self.top_process_count
            )));
        }
        if !(0.0..=1.0).contains(&self.warning_ratio)
            || !(0.0..=1.0).contains(&self.critical_ratio)
            || self.warning_ratio >= self.critical_ratio
        {
            return Err(Error::invalid_config(format!(
                "pressure ratios must satisfy 0 <= warning < critical <= 1 (warning: {}, critical: {})",
                self.warning_ratio, self.critical_ratio
            )));
        }
        if self.command_timeout_ms == 0 {
            return Err(Error::invalid_config("command_timeout_ms must be positive"));
        }
        Ok(())
    }

    /// Sampling period for the given power state
    pub fn interval_for(&self, on_ac_power: bool) -> Duration {
        if on_ac_power {
            Duration::from_secs(self.ac_interval_secs)
        } else {
            Duration::from_secs(self.battery_interval_secs)
        }
    }

    pub fn thresholds(&self) -> PressureThresholds {
        PressureThresholds { warning: self.warning_ratio, critical: self.critical_ratio }
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}
