//! Configuration structures

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::rates::{RateBounds, RateMethod};
use crate::table::{CycleSettings, TableKind};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Default log filter (error, warn, info, debug, trace). RUST_LOG wins.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// JSON document holding the interface tables
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Time between full cycles in `run` mode
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,

    #[serde(default)]
    pub rates: RateConfig,

    #[serde(default)]
    pub tables: TablesConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateConfig {
    /// Deltas over a shorter interval reuse the previous rate
    #[serde(default = "default_min_delta", with = "humantime_serde")]
    pub min_delta: Duration,

    /// Deltas over a longer interval discard history
    #[serde(default = "default_max_delta", with = "humantime_serde")]
    pub max_delta: Duration,

    /// Fallback when the store has no rate calculation method set
    #[serde(default)]
    pub method: RateMethod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TablesConfig {
    #[serde(default = "default_true")]
    pub standard: bool,
    #[serde(default = "default_true")]
    pub high_capacity: bool,
}

impl Config {
    pub fn cycle_settings(&self) -> CycleSettings {
        CycleSettings {
            bounds: RateBounds::new(self.rates.min_delta, self.rates.max_delta),
            default_method: self.rates.method,
        }
    }

    pub fn enabled_tables(&self) -> Vec<TableKind> {
        let mut tables = Vec::new();
        if self.tables.standard {
            tables.push(TableKind::Standard);
        }
        if self.tables.high_capacity {
            tables.push(TableKind::HighCapacity);
        }
        tables
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            store_path: default_store_path(),
            poll_interval: default_poll_interval(),
            rates: RateConfig::default(),
            tables: TablesConfig::default(),
        }
    }
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            min_delta: default_min_delta(),
            max_delta: default_max_delta(),
            method: RateMethod::default(),
        }
    }
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            standard: true,
            high_capacity: true,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_store_path() -> PathBuf {
    PathBuf::from("/var/lib/ifrates/store.json")
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(30)
}

fn default_min_delta() -> Duration {
    Duration::from_secs(5)
}

fn default_max_delta() -> Duration {
    Duration::from_secs(10 * 60)
}

fn default_true() -> bool {
    true
}
