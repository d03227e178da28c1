use crate::railway::time::{Time, SECONDS_PER_DAY};
use crate::AppResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Simulation parameters. Every field has a default, so a configuration file only
/// needs to name the values it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seconds of simulated time per step.
    pub time_step: i64,
    /// Milliseconds between steps when running automatically.
    pub auto_run_speed: u64,
    pub start_time: Time,
    /// Seconds; the clock never reaches this value.
    pub day_length: i64,
    /// Seconds a stopping train dwells at least, on top of per-stop minimums.
    pub min_dwell: i64,
    /// Fraction of the planned dwell window a late train still spends at a stop.
    pub dwell_fraction: f64,
    /// m/s, for synthesized rails and segments without a usable speed limit.
    pub default_rail_speed: f64,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            time_step: 15,
            auto_run_speed: 250,
            start_time: Time::default(),
            day_length: SECONDS_PER_DAY,
            min_dwell: 30,
            dwell_fraction: 0.5,
            default_rail_speed: 27.8,
        }
    }
}

#[derive(Debug, Fail, PartialEq)]
pub enum ConfigError {
    #[fail(display = "time step must be positive, got {}", _0)]
    NonPositiveTimeStep(i64),
}

impl Config {
    pub fn from_json(s: &str) -> AppResult<Config> {
        let config: Config = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> AppResult<Config> {
        let contents = crate::read_file(path)?;
        Config::from_json(&contents)
    }

    /// Checks values that would keep the clock from advancing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.time_step <= 0 {
            return Err(ConfigError::NonPositiveTimeStep(self.time_step));
        }
        Ok(())
    }
}
