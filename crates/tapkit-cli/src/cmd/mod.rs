//! Subcommand implementations.

pub mod hash;
pub mod info;
pub mod install;
pub mod resolve;
pub mod test;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use tapkit_core::Config;
use tapkit_schema::{Formula, Version};

/// Environment configuration with command-line overrides applied on top.
fn config(bin_dir: Option<PathBuf>, timeout: Option<Duration>) -> Result<Config> {
    let mut config = Config::from_env()?;
    if let Some(dir) = bin_dir {
        config.bin_dir = dir;
    }
    if let Some(timeout) = timeout {
        config.timeout = timeout;
    }
    tracing::debug!(?config, "configuration");
    Ok(config)
}

/// The requested release, or the formula's own version.
fn release(formula: &Formula, requested: Option<&str>) -> Version {
    requested.map_or_else(|| formula.version.clone(), Version::new)
}
