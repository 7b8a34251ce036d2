//! Info command

use std::path::Path;

use anyhow::Result;
use crossterm::style::Stylize;
use tapkit_core::{formula, resolver};
use tapkit_schema::PlatformKey;

/// Show a formula's metadata and the artifact for every platform it declares.
pub fn info(formula_path: Option<&Path>) -> Result<()> {
    let formula = formula::load(formula_path)?;
    let host = PlatformKey::current().ok();

    let lw = 12;

    println!();
    println!(
        "  {} {}",
        formula.name.as_str().white().bold(),
        formula.version.as_str().dark_grey()
    );
    if let Some(desc) = &formula.desc {
        println!("  {desc}");
    }
    println!();

    if let Some(homepage) = &formula.homepage {
        println!("  {:<lw$}{homepage}", "homepage");
    }
    if let Some(license) = &formula.license {
        println!("  {:<lw$}{license}", "license");
    }
    println!(
        "  {:<lw$}{} {}",
        "test",
        formula.name,
        formula.test.args.join(" ")
    );
    println!();

    for artifact in resolver::resolve_all(&formula, &formula.version) {
        let marker = if Some(artifact.platform) == host {
            "●".green().to_string()
        } else {
            " ".to_string()
        };
        println!("  {marker} {}", artifact.platform.to_string().bold());
        println!("      {}", artifact.url);
        println!("      {}", artifact.expected_checksum.as_str().dark_grey());
    }

    Ok(())
}
