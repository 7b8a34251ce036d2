//! Core domain types.

use serde::{Deserialize, Serialize};

use crate::hash::Sha256Digest;
use crate::platform::PlatformKey;

/// A normalized tool name (`dashy`).
///
/// Names the executable inside the archive, the installed file, and the
/// smoke-test marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ToolName(String);

impl ToolName {
    /// Create a new tool name, normalizing the input to lowercase.
    pub fn new(name: &str) -> Self {
        Self(name.to_lowercase())
    }

    /// Return the normalized name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Deref for ToolName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<std::path::Path> for ToolName {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}

impl From<&str> for ToolName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A release version string (`0.1.0`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    /// Wrap a version string. Surrounding whitespace and a leading `v` are dropped.
    pub fn new(v: &str) -> Self {
        let v = v.trim();
        Self(v.strip_prefix('v').unwrap_or(v).to_string())
    }

    /// Return the version as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Version {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Where to download one platform's artifact and what it must hash to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactDescriptor {
    /// Platform this artifact was built for.
    pub platform: PlatformKey,
    /// Fully-qualified download URL.
    pub url: String,
    /// Expected SHA-256 of the archive bytes.
    pub expected_checksum: Sha256Digest,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_strips_tag_prefix() {
        assert_eq!(Version::new("v0.1.0").as_str(), "0.1.0");
        assert_eq!(Version::new(" 0.2.0 ").as_str(), "0.2.0");
    }

    #[test]
    fn tool_name_is_lowercase() {
        assert_eq!(ToolName::new("Dashy").as_str(), "dashy");
    }
}
