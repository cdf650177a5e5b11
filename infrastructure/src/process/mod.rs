//! Bounded process execution
//!
//! [`LocalProcessRunner`] implements the application's `ProcessRunner`
//! port on tokio; [`privilege::is_elevated`] tells the engine whether
//! elevated capabilities may run.

mod kill;
pub mod privilege;
pub mod runner;

pub use privilege::is_elevated;
pub use runner::{Interpreter, LocalProcessRunner, STDERR_SEPARATOR, TRUNCATION_MARKER};
