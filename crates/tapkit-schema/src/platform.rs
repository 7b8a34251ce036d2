//! Host platform classification.
//!
//! A formula only ships artifacts for macOS and Linux on ARM64 and `x86_64`.
//! [`PlatformKey`] pairs the two and is the key every artifact lookup uses.
//!
//! # Example
//!
//! ```
//! use tapkit_schema::{Arch, Os, PlatformKey};
//!
//! let key = PlatformKey::from_host("macos", "aarch64").unwrap();
//! assert_eq!(key, PlatformKey::new(Os::MacOs, Arch::Arm64));
//! assert_eq!(key.triple(), "aarch64-apple-darwin");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The host OS or architecture could not be mapped onto a supported value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported platform: os '{os}', arch '{arch}' (supported: macOS or Linux on aarch64 or x86_64)")]
pub struct UnsupportedPlatformError {
    /// OS name as reported by the host.
    pub os: String,
    /// Architecture name as reported by the host.
    pub arch: String,
}

/// Operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    /// Apple macOS (`darwin`).
    MacOs,
    /// GNU/Linux.
    Linux,
}

impl Os {
    /// Every supported OS.
    pub const ALL: [Self; 2] = [Self::MacOs, Self::Linux];

    /// Classify an OS name such as `std::env::consts::OS`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "macos" | "darwin" | "osx" => Some(Self::MacOs),
            "linux" => Some(Self::Linux),
            _ => None,
        }
    }

    /// Short lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MacOs => "macos",
            Self::Linux => "linux",
        }
    }

    /// Vendor and system part of a target triple.
    fn triple_suffix(self) -> &'static str {
        match self {
            Self::MacOs => "apple-darwin",
            Self::Linux => "unknown-linux-gnu",
        }
    }
}

impl std::fmt::Display for Os {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// 64-bit ARM (Apple Silicon, Graviton, ...)
    Arm64,
    /// 64-bit Intel/AMD
    X86_64,
}

impl Arch {
    /// Every supported architecture.
    pub const ALL: [Self; 2] = [Self::Arm64, Self::X86_64];

    /// Classify an architecture name such as `std::env::consts::ARCH`.
    ///
    /// 32-bit architectures (`x86`, `arm`, `i686`) are deliberately absent.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "aarch64" | "arm64" => Some(Self::Arm64),
            "x86_64" | "amd64" | "x64" => Some(Self::X86_64),
            _ => None,
        }
    }

    /// Platform-convention name (`arm64` / `x86_64`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Arm64 => "arm64",
            Self::X86_64 => "x86_64",
        }
    }

    /// Rust-convention name (`aarch64` / `x86_64`), as used in target triples.
    ///
    /// Distinct from [`as_str()`](Self::as_str) which uses platform names.
    pub fn rust_name(self) -> &'static str {
        match self {
            Self::Arm64 => "aarch64",
            Self::X86_64 => "x86_64",
        }
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The (OS, architecture) pair used to select an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlatformKey {
    /// Operating system family.
    pub os: Os,
    /// CPU architecture.
    pub arch: Arch,
}

impl PlatformKey {
    /// All four supported combinations, in triple order.
    pub const ALL: [Self; 4] = [
        Self::new(Os::MacOs, Arch::Arm64),
        Self::new(Os::MacOs, Arch::X86_64),
        Self::new(Os::Linux, Arch::Arm64),
        Self::new(Os::Linux, Arch::X86_64),
    ];

    /// Build a key from its parts.
    pub const fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// Classify the running host.
    pub fn current() -> Result<Self, UnsupportedPlatformError> {
        Self::from_host(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Classify an arbitrary (OS, arch) pair of host-reported names.
    pub fn from_host(os: &str, arch: &str) -> Result<Self, UnsupportedPlatformError> {
        match (Os::parse(os), Arch::parse(arch)) {
            (Some(os), Some(arch)) => Ok(Self { os, arch }),
            _ => Err(UnsupportedPlatformError {
                os: os.to_string(),
                arch: arch.to_string(),
            }),
        }
    }

    /// Target triple naming this platform's artifact, e.g. `x86_64-unknown-linux-gnu`.
    pub fn triple(self) -> String {
        format!("{}-{}", self.arch.rust_name(), self.os.triple_suffix())
    }
}

impl std::fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.triple())
    }
}

impl std::str::FromStr for PlatformKey {
    type Err = UnsupportedPlatformError;

    /// Parse a target triple (`aarch64-apple-darwin`) or an `os/arch` pair (`linux/amd64`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(key) = Self::ALL.iter().find(|k| k.triple() == s) {
            return Ok(*key);
        }
        match s.split_once('/') {
            Some((os, arch)) => Self::from_host(os, arch),
            None => Err(UnsupportedPlatformError {
                os: s.to_string(),
                arch: String::new(),
            }),
        }
    }
}
