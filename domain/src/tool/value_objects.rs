//! Tool domain value objects: immutable result and validation types
//!
//! A capability returns an [`ExecutionResult`] describing what it intends to
//! do (forward script, undo script). After the forward script has run, the
//! same value is enriched with the process data and the capability's own
//! verdict, and ends up inside a journal entry.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of one attempted action.
///
/// `success` is the capability's verdict, not the process exit code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Whether the action is considered successful
    pub success: bool,
    /// Error description (for failed actions)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Structured payload (process output, exit code, policy rule, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Script performing the remediation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward_script: Option<String>,
    /// Script reversing the remediation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub undo_script: Option<String>,
}

impl ExecutionResult {
    /// A successful plan: run `forward_script`, no reversal recorded
    pub fn planned(forward_script: impl Into<String>) -> Self {
        Self {
            success: true,
            forward_script: Some(forward_script.into()),
            ..Default::default()
        }
    }

    /// A successful result that needs no process
    pub fn success() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    /// A failed result
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn with_undo(mut self, undo_script: impl Into<String>) -> Self {
        self.undo_script = Some(undo_script.into());
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Mark this result failed, keeping scripts and data
    pub fn into_failure(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.error = Some(error.into());
        self
    }

    /// Forward script if present and non-blank
    pub fn forward(&self) -> Option<&str> {
        self.forward_script.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Undo script if present and non-blank
    pub fn undo(&self) -> Option<&str> {
        self.undo_script.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// A single schema violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Offending parameter (`None` for whole-argument problems)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(parameter: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            parameter: parameter.map(str::to_string),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.parameter {
            Some(p) => write!(f, "{}: {}", p, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Arguments rejected by a capability's schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailed {
    pub tool_name: String,
    pub issues: Vec<ValidationIssue>,
}

impl std::fmt::Display for ValidationFailed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let details: Vec<String> = self.issues.iter().map(|i| i.to_string()).collect();
        write!(
            f,
            "Invalid arguments for '{}': {}",
            self.tool_name,
            details.join("; ")
        )
    }
}

impl std::error::Error for ValidationFailed {}
