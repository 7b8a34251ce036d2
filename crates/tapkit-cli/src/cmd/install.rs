//! Install command

use anyhow::{Context, Result};
use tapkit_core::{Pipeline, Reporter, formula};

use crate::InstallArgs;
use crate::ui::ConsoleReporter;

/// Run the full pipeline for the selected formula.
pub async fn install(args: &InstallArgs) -> Result<()> {
    let formula = formula::load(args.formula.formula.as_deref())?;
    let config = super::config(args.bin_dir.clone(), args.timeout)?;
    let version = super::release(&formula, args.release.as_deref());
    let reporter = ConsoleReporter::new();

    let mut pipeline = Pipeline::new(&formula, &config, &reporter)
        .version(version)
        .skip_test(args.skip_test);
    if let Some(platform) = args.platform {
        pipeline = pipeline.platform(platform);
    }

    let outcome = match pipeline.run().await {
        Ok(outcome) => outcome,
        Err(e) if e.is_retryable() => {
            return Err(e).context("install failed on a network error; it is safe to retry");
        }
        Err(e) => return Err(e).context("install failed"),
    };

    let first_line = outcome
        .smoke
        .as_ref()
        .and_then(|s| s.output.lines().map(str::trim).find(|l| !l.is_empty()));
    if let Some(line) = first_line {
        reporter.info(&format!("{} reports: {line}", formula.name));
    }
    Ok(())
}
