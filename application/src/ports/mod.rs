//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod journal;
pub mod planner;
pub mod process_runner;
pub mod step_progress;
