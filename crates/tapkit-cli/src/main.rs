//! tapkit - verified installs of prebuilt CLI tools

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use tapkit_cli::cmd;
use tapkit_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; -v only moves the default.
    let default_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Install(args) => cmd::install::install(&args).await,
        Commands::Test { formula, bin_dir } => {
            cmd::test::test(formula.formula.as_deref(), bin_dir).await
        }
        Commands::Resolve {
            formula,
            release,
            platform,
        } => cmd::resolve::resolve(formula.formula.as_deref(), release.as_deref(), platform),
        Commands::Info { formula } => cmd::info::info(formula.formula.as_deref()),
        Commands::Hash { files } => cmd::hash::hash(&files),
    }
}
