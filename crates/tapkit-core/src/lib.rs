//! Core library for tapkit.
//!
//! Platform detection lives in `tapkit-schema`; everything with side effects
//! lives here: artifact resolution, verified download, install, and the
//! post-install smoke test, tied together by the [`flow`] typestate pipeline.

pub mod config;
pub mod flow;
pub mod formula;
pub mod install;
pub mod io;
pub mod paths;
pub mod reporter;
pub mod resolver;
pub mod smoke;

pub use config::Config;
pub use flow::{FlowError, Outcome, Pipeline, Step};
pub use reporter::{NullReporter, Reporter};

/// User Agent string for core operations
pub const USER_AGENT: &str = concat!("tapkit/", env!("CARGO_PKG_VERSION"));
