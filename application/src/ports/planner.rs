//! Planner port
//!
//! A planner turns a free-text goal into an ordered list of tool calls.
//! Whatever it returns is a proposal: the engine re-validates every call
//! against the live catalog and never treats the planner as a security
//! boundary.

use async_trait::async_trait;
use mender_domain::{ToolCall, ToolDescriptor};
use thiserror::Error;

/// Errors a planner can report
#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("No plan matches the issue: {0}")]
    NoMatch(String),

    #[error("Could not load plan from {source_name}: {message}")]
    InvalidPlan {
        source_name: String,
        message: String,
    },
}

/// Port for plan producers (rule-based, file-based, model-driven)
#[async_trait]
pub trait Planner: Send + Sync {
    /// Propose tool calls for `goal`, given the full catalog
    async fn plan(
        &self,
        goal: &str,
        catalog: &[ToolDescriptor],
    ) -> Result<Vec<ToolCall>, PlannerError>;
}
