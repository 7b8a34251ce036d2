//! The declarative formula format.
//!
//! A formula names one tool, one default release, a URL template, and a
//! checksum per supported platform:
//!
//! ```toml
//! name = "dashy"
//! version = "0.1.0"
//! url = "https://github.com/mshaaban0/dashy/releases/download/v{version}/{name}-{triple}.tar.gz"
//!
//! [sha256]
//! aarch64-apple-darwin = "…"
//! x86_64-apple-darwin = "…"
//! aarch64-unknown-linux-gnu = "…"
//! x86_64-unknown-linux-gnu = "…"
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hash::Sha256Digest;
use crate::platform::PlatformKey;
use crate::types::{ToolName, Version};

/// Errors raised while reading a formula definition.
#[derive(Error, Debug)]
pub enum FormulaError {
    /// Not valid TOML, or a field has the wrong shape (including malformed digests).
    #[error("invalid formula: {0}")]
    Parse(#[from] toml::de::Error),

    /// A `[sha256]` key is not one of the supported target triples.
    #[error("formula lists an artifact for unknown platform '{0}'")]
    UnknownPlatform(String),

    /// The URL template cannot produce one distinct URL per platform.
    #[error("invalid url template '{0}': must contain {{triple}}")]
    Template(String),

    /// A required field is empty.
    #[error("formula field '{0}' must not be empty")]
    EmptyField(&'static str),
}

/// Arguments and expected marker for the post-install smoke test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmokeTest {
    /// Arguments passed to the installed executable.
    #[serde(default = "default_test_args")]
    pub args: Vec<String>,
    /// Substring the combined output must contain. Defaults to the tool name.
    #[serde(default)]
    pub marker: Option<String>,
}

fn default_test_args() -> Vec<String> {
    vec!["--version".to_string()]
}

impl Default for SmokeTest {
    fn default() -> Self {
        Self {
            args: default_test_args(),
            marker: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFormula {
    name: String,
    #[serde(default)]
    desc: Option<String>,
    #[serde(default)]
    homepage: Option<String>,
    version: String,
    #[serde(default)]
    license: Option<String>,
    url: String,
    sha256: BTreeMap<String, Sha256Digest>,
    #[serde(default)]
    test: SmokeTest,
}

/// A parsed and validated formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formula {
    /// Tool name; also the executable name inside the archive.
    pub name: ToolName,
    /// One-line description.
    pub desc: Option<String>,
    /// Project homepage.
    pub homepage: Option<String>,
    /// Default release installed when the host does not supply one.
    pub version: Version,
    /// SPDX license identifier.
    pub license: Option<String>,
    /// Download URL template with `{version}`, `{name}`, `{triple}` placeholders.
    pub url_template: String,
    /// Expected archive digest per platform.
    pub checksums: BTreeMap<PlatformKey, Sha256Digest>,
    /// Post-install smoke test.
    pub test: SmokeTest,
}

impl Formula {
    /// Parse and validate a TOML formula definition.
    pub fn from_toml(s: &str) -> Result<Self, FormulaError> {
        let raw: RawFormula = toml::from_str(s)?;

        if raw.name.trim().is_empty() {
            return Err(FormulaError::EmptyField("name"));
        }
        if raw.version.trim().is_empty() {
            return Err(FormulaError::EmptyField("version"));
        }
        if !raw.url.contains("{triple}") {
            return Err(FormulaError::Template(raw.url));
        }

        let mut checksums = BTreeMap::new();
        for (triple, digest) in raw.sha256 {
            let key = PlatformKey::ALL
                .into_iter()
                .find(|k| k.triple() == triple)
                .ok_or(FormulaError::UnknownPlatform(triple))?;
            checksums.insert(key, digest);
        }

        Ok(Self {
            name: ToolName::new(raw.name.trim()),
            desc: raw.desc,
            homepage: raw.homepage,
            version: Version::new(&raw.version),
            license: raw.license,
            url_template: raw.url,
            checksums,
            test: raw.test,
        })
    }

    /// Marker the smoke test looks for.
    pub fn test_marker(&self) -> &str {
        self.test.marker.as_deref().unwrap_or(self.name.as_str())
    }
}
