//! Loading formula definitions.

use std::path::{Path, PathBuf};

use thiserror::Error;

use tapkit_schema::{Formula, FormulaError};

/// The formula shipped with tapkit.
pub const DASHY: &str = include_str!("../formulas/dashy.toml");

/// A formula file could not be read or parsed.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read formula {}: {source}", path.display())]
    Io {
        /// Formula file path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The contents are not a valid formula.
    #[error("{}: {source}", path.display())]
    Invalid {
        /// Formula file path, or `<builtin>` for the embedded one.
        path: PathBuf,
        /// Underlying error.
        source: FormulaError,
    },
}

/// The embedded `dashy` formula.
pub fn builtin() -> Result<Formula, LoadError> {
    Formula::from_toml(DASHY).map_err(|source| LoadError::Invalid {
        path: PathBuf::from("<builtin>"),
        source,
    })
}

/// Load a formula from `path`, or the embedded one when `path` is `None`.
pub fn load(path: Option<&Path>) -> Result<Formula, LoadError> {
    let Some(path) = path else {
        return builtin();
    };

    tracing::debug!(path = %path.display(), "loading formula");
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Formula::from_toml(&text).map_err(|source| LoadError::Invalid {
        path: path.to_path_buf(),
        source,
    })
}
