//! Resolve command

use std::path::Path;

use anyhow::Result;
use tapkit_core::{formula, resolver};
use tapkit_schema::PlatformKey;

/// Print what `install` would download, without downloading it.
pub fn resolve(
    formula_path: Option<&Path>,
    release: Option<&str>,
    platform: Option<PlatformKey>,
) -> Result<()> {
    let formula = formula::load(formula_path)?;
    let version = super::release(&formula, release);
    let platform = match platform {
        Some(p) => p,
        None => PlatformKey::current()?,
    };

    let artifact = resolver::resolve(&formula, &version, platform)?;

    let lw = 10;
    println!("{:<lw$}{}", "platform", artifact.platform);
    println!("{:<lw$}{}", "url", artifact.url);
    println!("{:<lw$}{}", "sha256", artifact.expected_checksum);
    Ok(())
}
