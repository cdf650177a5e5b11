//! Presentation layer for mender
//!
//! This crate contains the CLI definition, console formatters for run,
//! undo and journal views, and step progress reporters.

pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use cli::commands::{Cli, Command};
pub use output::console::ConsoleFormatter;
pub use progress::reporter::{ProgressReporter, SimpleProgress};
