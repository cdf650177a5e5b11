//! Infrastructure layer for mender
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: the bounded process runner, the JSONL audit
//! journal, planners, the built-in capabilities and configuration loading.

pub mod config;
pub mod journal;
pub mod planner;
pub mod process;
pub mod tools;

// Re-export commonly used types
pub use config::{ConfigLoader, ConfigSource, ConfigValidationError, FileConfig};
pub use journal::JsonlJournal;
pub use planner::{KeywordPlanner, KeywordRule, PlanFilePlanner};
pub use process::{Interpreter, LocalProcessRunner, is_elevated};
pub use tools::{builtin_capabilities, builtin_catalog};
