//! Test command

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use crossterm::style::Stylize;
use tapkit_core::{formula, smoke};

use crate::ui::theme::Icons;

/// Smoke-test an already installed executable.
pub async fn test(formula_path: Option<&Path>, bin_dir: Option<PathBuf>) -> Result<()> {
    let formula = formula::load(formula_path)?;
    let config = super::config(bin_dir, None)?;
    let path = config.bin_dir.join(&formula.name);

    if !path.is_file() {
        bail!("{} is not installed at {}", formula.name, path.display());
    }

    let report = smoke::run(
        &path,
        &formula.test,
        formula.test_marker(),
        config.smoke_timeout,
    )
    .await?;

    let icons = Icons::default();
    let exit = report
        .exit_code
        .map_or_else(|| "killed by signal".to_string(), |c| format!("exit {c}"));
    println!(
        "{} {} {} {}",
        icons.success.green(),
        formula.name.as_str().bold(),
        format!("{} {}", path.display(), formula.test.args.join(" ")).dark_grey(),
        format!("({exit})").dark_grey()
    );
    Ok(())
}
