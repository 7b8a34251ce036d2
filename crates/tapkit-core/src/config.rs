//! Runtime configuration.
//!
//! Values are layered: built-in defaults, then environment variables, then
//! whatever the caller overrides (the CLI applies its flags last).

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::paths;

/// Overrides the install directory.
pub const BIN_DIR_ENV: &str = "TAPKIT_BIN_DIR";
/// Overrides where downloads are staged.
pub const TMPDIR_ENV: &str = "TAPKIT_TMPDIR";
/// Network timeout in whole seconds.
pub const TIMEOUT_ENV: &str = "TAPKIT_TIMEOUT_SECS";

/// Default bound on the artifact download.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
/// Default bound on the smoke-test process.
pub const DEFAULT_SMOKE_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration could not be assembled.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// No bin directory was given and the home directory is unknown.
    #[error("could not determine home directory; set {} or {}", paths::HOME_ENV, BIN_DIR_ENV)]
    NoHome,

    /// A numeric setting did not parse.
    #[error("invalid value for {var}: '{value}' (expected a positive number of seconds)")]
    Invalid {
        /// Variable or flag name.
        var: &'static str,
        /// The rejected value.
        value: String,
    },
}

/// Where to install and how long to wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory receiving the installed executable.
    pub bin_dir: PathBuf,
    /// Parent for the private download directory. `None` uses the system temp dir.
    pub tmp_dir: Option<PathBuf>,
    /// Bound on connect plus transfer of the artifact.
    pub timeout: Duration,
    /// Bound on the smoke-test process.
    pub smoke_timeout: Duration,
}

impl Config {
    /// Configuration installing into `bin_dir` with default timeouts.
    pub fn new(bin_dir: impl Into<PathBuf>) -> Self {
        Self {
            bin_dir: bin_dir.into(),
            tmp_dir: None,
            timeout: DEFAULT_TIMEOUT,
            smoke_timeout: DEFAULT_SMOKE_TIMEOUT,
        }
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`, keyed by variable name.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bin_dir = match non_empty(BIN_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => match non_empty(paths::HOME_ENV) {
                Some(home) => PathBuf::from(home).join("bin"),
                None => paths::bin_path().ok_or(ConfigError::NoHome)?,
            },
        };

        let mut config = Self::new(bin_dir);
        config.tmp_dir = non_empty(TMPDIR_ENV).map(PathBuf::from);
        if let Some(raw) = non_empty(TIMEOUT_ENV) {
            config.timeout = parse_secs(TIMEOUT_ENV, &raw)?;
        }
        Ok(config)
    }
}

/// Parse a positive whole number of seconds.
pub fn parse_secs(var: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::Invalid {
            var,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn bin_dir_prefers_explicit_override() {
        let config = Config::from_lookup(lookup(&[
            (BIN_DIR_ENV, "/opt/bin"),
            (paths::HOME_ENV, "/srv/tapkit"),
        ]))
        .unwrap();
        assert_eq!(config.bin_dir, PathBuf::from("/opt/bin"));
    }

    #[test]
    fn bin_dir_falls_back_to_home() {
        let config = Config::from_lookup(lookup(&[(paths::HOME_ENV, "/srv/tapkit")])).unwrap();
        assert_eq!(config.bin_dir, PathBuf::from("/srv/tapkit/bin"));
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.tmp_dir, None);
    }

    #[test]
    fn reads_timeout_and_tmpdir() {
        let config = Config::from_lookup(lookup(&[
            (BIN_DIR_ENV, "/opt/bin"),
            (TIMEOUT_ENV, "5"),
            (TMPDIR_ENV, "/var/tmp/tapkit"),
        ]))
        .unwrap();
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.tmp_dir, Some(PathBuf::from("/var/tmp/tapkit")));
    }

    #[test]
    fn rejects_bad_timeout() {
        for bad in ["0", "-3", "soon"] {
            let err = Config::from_lookup(lookup(&[(BIN_DIR_ENV, "/opt/bin"), (TIMEOUT_ENV, bad)]))
                .unwrap_err();
            assert_eq!(
                err,
                ConfigError::Invalid {
                    var: TIMEOUT_ENV,
                    value: bad.to_string()
                }
            );
        }
    }
}
