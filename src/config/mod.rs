//! Configuration loading
//!
//! TOML file; every key is optional and a missing file means all defaults.

pub mod structs;

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

pub use structs::Config;

/// Where a loaded config came from. Loading runs before logging is set up,
/// so the caller reports this once the logger exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    File,
    Defaults,
}

/// Load and validate the config at `path`
pub fn load(path: &Path) -> Result<(Config, ConfigSource)> {
    if !path.exists() {
        return Ok((Config::default(), ConfigSource::Defaults));
    }

    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config = parse(&text).with_context(|| format!("Invalid config {}", path.display()))?;
    Ok((config, ConfigSource::File))
}

pub fn parse(text: &str) -> Result<Config> {
    let config: Config = toml::from_str(text).context("Failed to parse TOML")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.poll_interval.is_zero() {
        bail!("poll_interval must be greater than zero");
    }
    if config.rates.min_delta >= config.rates.max_delta {
        bail!(
            "rates.min_delta ({:?}) must be below rates.max_delta ({:?})",
            config.rates.min_delta,
            config.rates.max_delta
        );
    }
    Ok(())
}
