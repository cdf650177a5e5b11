//! Plan-file planner.
//!
//! Loads a pre-written plan from JSON, either a bare array of calls or an
//! object with a `steps` array:
//!
//! ```json
//! [
//!   {"tool_name": "run_command", "arguments": {"command": "Get-Service Spooler"}},
//!   {"name": "RestartService", "args": {"Name": "Spooler"}}
//! ]
//! ```
//!
//! The goal text is ignored; the file is the plan.

use async_trait::async_trait;
use mender_application::ports::planner::{Planner, PlannerError};
use mender_domain::{ToolCall, ToolDescriptor};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Deserialize)]
#[serde(untagged)]
enum PlanDocument {
    Steps(Vec<ToolCall>),
    Wrapped { steps: Vec<ToolCall> },
}

impl PlanDocument {
    fn into_calls(self) -> Vec<ToolCall> {
        match self {
            PlanDocument::Steps(steps) | PlanDocument::Wrapped { steps } => steps,
        }
    }
}

/// Parse plan JSON
pub fn parse_plan(text: &str) -> Result<Vec<ToolCall>, String> {
    serde_json::from_str::<PlanDocument>(text)
        .map(PlanDocument::into_calls)
        .map_err(|e| e.to_string())
}

pub struct PlanFilePlanner {
    path: PathBuf,
}

impl PlanFilePlanner {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn invalid(&self, message: impl Into<String>) -> PlannerError {
        PlannerError::InvalidPlan {
            source_name: self.path.display().to_string(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl Planner for PlanFilePlanner {
    async fn plan(
        &self,
        _goal: &str,
        _catalog: &[ToolDescriptor],
    ) -> Result<Vec<ToolCall>, PlannerError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| self.invalid(e.to_string()))?;
        let calls = parse_plan(&text).map_err(|e| self.invalid(e))?;
        if calls.is_empty() {
            return Err(self.invalid("plan has no steps"));
        }
        info!("Loaded {} step(s) from {}", calls.len(), self.path.display());
        Ok(calls)
    }
}
