//! Artifact resolution.
//!
//! Maps a [`PlatformKey`] and release [`Version`] to the artifact the formula
//! declares for it. The table is whatever the formula lists; a platform the
//! formula omits is an error, never a fallback to some other entry.

use thiserror::Error;

use tapkit_schema::{ArtifactDescriptor, Formula, PlatformKey, Version};

/// The formula has no usable artifact for a platform.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no {tool} {version} artifact is declared for {platform}")]
pub struct UnresolvableArtifactError {
    /// Tool being resolved.
    pub tool: String,
    /// Requested release.
    pub version: String,
    /// Platform that has no entry.
    pub platform: PlatformKey,
}

/// Substitute `{version}`, `{name}` and `{triple}` in a URL template.
pub fn render_url(template: &str, name: &str, version: &Version, platform: PlatformKey) -> String {
    template
        .replace("{version}", version.as_str())
        .replace("{name}", name)
        .replace("{triple}", &platform.triple())
}

/// Resolve the artifact for `platform` at `version`.
pub fn resolve(
    formula: &Formula,
    version: &Version,
    platform: PlatformKey,
) -> Result<ArtifactDescriptor, UnresolvableArtifactError> {
    let unresolvable = || UnresolvableArtifactError {
        tool: formula.name.to_string(),
        version: version.to_string(),
        platform,
    };

    let checksum = formula.checksums.get(&platform).ok_or_else(unresolvable)?;
    let url = render_url(&formula.url_template, &formula.name, version, platform);
    if url.trim().is_empty() {
        return Err(unresolvable());
    }

    tracing::debug!(%platform, %url, "resolved artifact");
    Ok(ArtifactDescriptor {
        platform,
        url,
        expected_checksum: checksum.clone(),
    })
}

/// Resolve every platform the formula declares, in platform order.
pub fn resolve_all(formula: &Formula, version: &Version) -> Vec<ArtifactDescriptor> {
    formula
        .checksums
        .keys()
        .filter_map(|&platform| resolve(formula, version, platform).ok())
        .collect()
}
