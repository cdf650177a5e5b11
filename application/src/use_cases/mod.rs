//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod execute_action;
pub mod read_journal;
pub mod run_plan;
pub mod undo_session;

#[cfg(test)]
pub(crate) mod test_support;
