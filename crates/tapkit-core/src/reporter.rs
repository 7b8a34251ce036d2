//! Reporter trait for dependency injection
//!
//! This trait allows the install pipeline to report progress and status
//! without being coupled to a specific terminal implementation.

use tapkit_schema::{ToolName, Version};

/// Progress sink for one install run.
pub trait Reporter: Send + Sync {
    /// Indicates a new pipeline step has started (e.g. "Fetching", "Installing").
    fn section(&self, title: &str);

    /// Updates the progress of a download.
    fn downloading(&self, name: &ToolName, version: &Version, current: u64, total: Option<u64>);

    /// Updates the state of the tool to 'installing'.
    fn installing(&self, name: &ToolName, version: &Version);

    /// Marks the run as successfully completed.
    fn done(&self, name: &ToolName, version: &Version, detail: &str, size: Option<u64>);

    /// Marks the run as failed with a specific reason.
    fn failed(&self, name: &ToolName, version: &Version, reason: &str);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn section(&self, title: &str) {
        (**self).section(title);
    }
    fn downloading(&self, name: &ToolName, version: &Version, current: u64, total: Option<u64>) {
        (**self).downloading(name, version, current, total);
    }
    fn installing(&self, name: &ToolName, version: &Version) {
        (**self).installing(name, version);
    }
    fn done(&self, name: &ToolName, version: &Version, detail: &str, size: Option<u64>) {
        (**self).done(name, version, detail, size);
    }
    fn failed(&self, name: &ToolName, version: &Version, reason: &str) {
        (**self).failed(name, version, reason);
    }
    fn info(&self, msg: &str) {
        (**self).info(msg);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
}

/// A no-op reporter for silent operations (e.g., testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn section(&self, _: &str) {}
    fn downloading(&self, _: &ToolName, _: &Version, _: u64, _: Option<u64>) {}
    fn installing(&self, _: &ToolName, _: &Version) {}
    fn done(&self, _: &ToolName, _: &Version, _: &str, _: Option<u64>) {}
    fn failed(&self, _: &ToolName, _: &Version, _: &str) {}
    fn info(&self, _: &str) {}
    fn warning(&self, _: &str) {}
}
