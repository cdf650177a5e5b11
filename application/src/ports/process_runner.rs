//! Process runner port
//!
//! Defines the interface for running a script or command line as a bounded
//! external process. The adapter owns the interpreter, the output ceiling
//! and the kill mechanics; callers only see a [`ProcessOutcome`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Whether the body is a capability-generated script or a raw command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    Script,
    RawCommand,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &str {
        match self {
            ExecutionMode::Script => "script",
            ExecutionMode::RawCommand => "raw_command",
        }
    }
}

/// A request to run one process
#[derive(Debug, Clone)]
pub struct ProcessRequest {
    /// Short label for logs (tool name, "undo:<tool>")
    pub label: String,
    /// Script text or command line
    pub body: String,
    pub mode: ExecutionMode,
    /// Wall-clock deadline
    pub timeout: Duration,
}

impl ProcessRequest {
    pub fn script(label: impl Into<String>, body: impl Into<String>, timeout: Duration) -> Self {
        Self {
            label: label.into(),
            body: body.into(),
            mode: ExecutionMode::Script,
            timeout,
        }
    }

    pub fn raw_command(
        label: impl Into<String>,
        command: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            label: label.into(),
            body: command.into(),
            mode: ExecutionMode::RawCommand,
            timeout,
        }
    }
}

/// Captured output of a process that exited on its own
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code (`None` when terminated by a signal)
    pub exit_code: Option<i32>,
    /// stdout, then stderr, capped at the runner's byte ceiling
    pub output: String,
    /// Whether the ceiling was hit
    pub truncated: bool,
    /// Last non-empty stdout line, where a capability may report its verdict
    pub last_stdout_line: Option<String>,
    pub duration_ms: u64,
}

/// Result of running one process
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The process exited before its deadline (any exit code)
    Completed(ProcessOutput),
    /// The deadline fired first; the process tree was killed
    TimedOut {
        timeout: Duration,
        /// Whatever was captured before the kill
        output: String,
        duration_ms: u64,
    },
    /// The process could not be started
    SpawnFailed(String),
    /// The process started but its exit could not be observed; it was killed
    WaitFailed(String),
}

impl ProcessOutcome {
    /// Whether the process was started at all
    pub fn spawned(&self) -> bool {
        !matches!(self, ProcessOutcome::SpawnFailed(_))
    }
}

/// Port for bounded process execution
///
/// Exactly one process runs at a time per engine; implementations must
/// never return before the process (and its children) are gone.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, request: &ProcessRequest) -> ProcessOutcome;
}
