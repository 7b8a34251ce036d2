//! tapkit - verified installs of prebuilt CLI tools
//!
//! Detects the host platform, downloads the matching release archive named by
//! a formula, checks its SHA256, places the executable into a bin directory
//! and smoke-tests it.
//!
//! # Directory Layout
//!
//! ```text
//! ~/.tapkit/      # TAPKIT_HOME
//! └── bin/        # installed executables (TAPKIT_BIN_DIR)
//! ```

pub mod cmd;
pub mod ui;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tapkit_core::config::{self, ConfigError};
use tapkit_schema::PlatformKey;

/// Command-line interface.
#[derive(Debug, Parser)]
#[command(name = "tapkit")]
#[command(author, version, about = "tapkit - verified installs of prebuilt CLI tools")]
pub struct Cli {
    /// Log debug output to stderr (RUST_LOG still takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Which formula to act on.
#[derive(Debug, Clone, Default, Args)]
pub struct FormulaArg {
    /// Formula file to use instead of the built-in dashy formula
    #[arg(long, value_name = "FILE")]
    pub formula: Option<PathBuf>,
}

/// Arguments for `tapkit install`.
#[derive(Debug, Clone, Args)]
pub struct InstallArgs {
    /// Formula selection.
    #[command(flatten)]
    pub formula: FormulaArg,

    /// Release to install instead of the formula's version
    #[arg(long, value_name = "VERSION")]
    pub release: Option<String>,

    /// Install the artifact for this target triple instead of the host's
    #[arg(long, value_name = "TRIPLE")]
    pub platform: Option<PlatformKey>,

    /// Directory receiving the executable [default: $TAPKIT_HOME/bin]
    #[arg(long, value_name = "DIR")]
    pub bin_dir: Option<PathBuf>,

    /// Network timeout in seconds
    #[arg(long, value_name = "SECS", value_parser = parse_timeout)]
    pub timeout: Option<Duration>,

    /// Stop after installing; the checksum is still verified
    #[arg(long)]
    pub skip_test: bool,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Download, verify, install and smoke-test the tool
    Install(InstallArgs),
    /// Smoke-test an installed tool
    Test {
        /// Formula selection.
        #[command(flatten)]
        formula: FormulaArg,
        /// Directory holding the installed executable
        #[arg(long, value_name = "DIR")]
        bin_dir: Option<PathBuf>,
    },
    /// Print the artifact URL and checksum that would be installed
    Resolve {
        /// Formula selection.
        #[command(flatten)]
        formula: FormulaArg,
        /// Release to resolve instead of the formula's version
        #[arg(long, value_name = "VERSION")]
        release: Option<String>,
        /// Target triple to resolve instead of the host's
        #[arg(long, value_name = "TRIPLE")]
        platform: Option<PlatformKey>,
    },
    /// Show formula metadata and every platform's artifact
    Info {
        /// Formula selection.
        #[command(flatten)]
        formula: FormulaArg,
    },
    /// Compute SHA256 of files (for filling in formula checksums)
    Hash {
        /// Files to hash
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    config::parse_secs("--timeout", raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tapkit_schema::{Arch, Os};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_install_flags() {
        let cli = Cli::parse_from([
            "tapkit",
            "install",
            "--platform",
            "aarch64-apple-darwin",
            "--timeout",
            "5",
            "--skip-test",
        ]);
        let Commands::Install(args) = cli.command else {
            panic!("expected install");
        };
        assert_eq!(args.platform, Some(PlatformKey::new(Os::MacOs, Arch::Arm64)));
        assert_eq!(args.timeout, Some(Duration::from_secs(5)));
        assert!(args.skip_test);
        assert!(args.formula.formula.is_none());
    }

    #[test]
    fn rejects_zero_timeout() {
        assert!(Cli::try_parse_from(["tapkit", "install", "--timeout", "0"]).is_err());
    }

    #[test]
    fn rejects_unsupported_platform() {
        let err = Cli::try_parse_from(["tapkit", "resolve", "--platform", "x86_64-pc-windows-msvc"])
            .unwrap_err();
        assert!(err.to_string().contains("unsupported platform"));
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::parse_from(["tapkit", "info", "-v"]);
        assert!(cli.verbose);
    }
}
