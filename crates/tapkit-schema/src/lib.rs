//! Shared types and the formula format for tapkit.

pub mod formula;
pub mod hash;
pub mod platform;
pub mod types;

// Re-exports
pub use formula::{Formula, FormulaError, SmokeTest};
pub use hash::{DigestError, Sha256Digest};
pub use platform::{Arch, Os, PlatformKey, UnsupportedPlatformError};
pub use types::{ArtifactDescriptor, ToolName, Version};
