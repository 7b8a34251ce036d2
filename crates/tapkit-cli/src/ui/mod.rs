//! Terminal output.

pub mod console;
pub mod theme;

pub use console::ConsoleReporter;
