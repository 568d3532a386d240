//! Application configuration.
//!
//! Loaded from YAML; every section is optional and falls back to defaults.
//!
//! ```yaml
//! runner:
//!   poll_interval_ms: 500
//!   auto_run: true
//! tip:
//!   open_delay_ms: 100
//!   close_delay_ms: 300
//! tour_paths:
//!   - tours
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tourguide_runner::RunnerConfig;
use tourguide_tip::TipTimings;
use tracing::{info, warn};

pub const ENV_POLL_MS: &str = "TOURGUIDE_POLL_MS";
pub const ENV_AUTO_RUN: &str = "TOURGUIDE_AUTO_RUN";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerSection {
    pub poll_interval_ms: u64,
    pub auto_run: bool,
    pub bus_capacity: usize,
}

impl Default for RunnerSection {
    fn default() -> Self {
        let defaults = RunnerConfig::default();
        Self {
            poll_interval_ms: defaults.poll_interval_ms,
            auto_run: defaults.auto_run,
            bus_capacity: defaults.bus_capacity,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub runner: RunnerSection,
    pub tip: TipTimings,
    /// Tour files or directories loaded when a command names none.
    pub tour_paths: Vec<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            runner: RunnerSection::default(),
            tip: TipTimings::default(),
            tour_paths: vec![PathBuf::from("tours")],
        }
    }
}

impl AppConfig {
    pub fn from_yaml(source: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file deserializes to unit, not to a mapping.
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(source)
    }

    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            poll_interval_ms: self.runner.poll_interval_ms,
            auto_run: self.runner.auto_run,
            bus_capacity: self.runner.bus_capacity,
            tip: self.tip,
        }
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply `TOURGUIDE_*` overrides found through `lookup`. Unparsable
    /// values are ignored with a warning.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_POLL_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => {
                    self.runner.poll_interval_ms = ms;
                    info!("Poll interval overridden by {}: {}ms", ENV_POLL_MS, ms);
                }
                _ => warn!(value = %raw, "ignoring invalid {}", ENV_POLL_MS),
            }
        }
        if let Some(raw) = lookup(ENV_AUTO_RUN) {
            match parse_flag(&raw) {
                Some(flag) => {
                    self.runner.auto_run = flag;
                    info!("Auto-run overridden by {}: {}", ENV_AUTO_RUN, flag);
                }
                None => warn!(value = %raw, "ignoring invalid {}", ENV_AUTO_RUN),
            }
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
