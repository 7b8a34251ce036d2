//! SHA-256 digest newtype.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// A digest string that is not a valid SHA-256 hex value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DigestError {
    /// Wrong number of hex characters.
    #[error("invalid SHA256 digest: expected 64 hex characters, got {len} in '{input}'")]
    Length {
        /// Length of the hex portion.
        len: usize,
        /// The rejected input.
        input: String,
    },

    /// Right length, but not hex.
    #[error("invalid SHA256 digest: contains non-hex characters in '{0}'")]
    NotHex(String),
}

/// A validated SHA256 digest (64 hex characters)
///
/// Digests are validated at construction and deserialization time and stored
/// lowercase, so two digests compare equal regardless of the case they were
/// written in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Create a new `Sha256Digest`, validating the input.
    ///
    /// Accepts strings with or without a `sha256:` prefix.
    pub fn new(s: impl Into<String>) -> Result<Self, DigestError> {
        let s = s.into();
        let hex = s.strip_prefix("sha256:").unwrap_or(&s);

        if hex.len() != 64 {
            return Err(DigestError::Length {
                len: hex.len(),
                input: s,
            });
        }

        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DigestError::NotHex(s));
        }

        Ok(Self(hex.to_lowercase()))
    }

    /// Case-insensitive comparison against a raw hex string.
    pub fn matches(&self, hex: &str) -> bool {
        self.0.eq_ignore_ascii_case(hex)
    }

    /// Get the digest as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Sha256Digest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

impl std::str::FromStr for Sha256Digest {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl std::fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Sha256Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn normalizes_case_and_prefix() {
        let upper = Sha256Digest::new(EMPTY.to_uppercase()).unwrap();
        let prefixed = Sha256Digest::new(format!("sha256:{EMPTY}")).unwrap();
        assert_eq!(upper.as_str(), EMPTY);
        assert_eq!(upper, prefixed);
    }

    #[test]
    fn matches_ignores_case() {
        let digest = Sha256Digest::new(EMPTY).unwrap();
        assert!(digest.matches(&EMPTY.to_uppercase()));
        assert!(!digest.matches(&EMPTY[1..]));
    }

    #[test]
    fn rejects_placeholders() {
        assert!(matches!(
            Sha256Digest::new("PLACEHOLDER_SHA256_ARM_MACOS"),
            Err(DigestError::Length { len: 28, .. })
        ));
        assert!(matches!(
            Sha256Digest::new("z".repeat(64)),
            Err(DigestError::NotHex(_))
        ));
    }
}
