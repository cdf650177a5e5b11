//! In-memory port implementations shared by the use case tests.

use crate::ports::journal::{AuditJournal, JournalError};
use crate::ports::planner::{Planner, PlannerError};
use crate::ports::process_runner::{ProcessOutcome, ProcessOutput, ProcessRequest, ProcessRunner};
use async_trait::async_trait;
use mender_domain::{
    Capability, ExecutionResult, JournalEntry, ParamType, ToolCall, ToolDescriptor, ToolParameter,
};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;

/// Journal kept in a vector; can be told to fail every append
#[derive(Default)]
pub struct MemoryJournal {
    pub entries: Mutex<Vec<JournalEntry>>,
    pub fail_appends: bool,
}

impl MemoryJournal {
    pub fn failing() -> Self {
        Self {
            fail_appends: true,
            ..Default::default()
        }
    }

    pub fn snapshot(&self) -> Vec<JournalEntry> {
        self.entries.lock().unwrap().clone()
    }
}

impl AuditJournal for MemoryJournal {
    fn append(&self, entry: &JournalEntry) -> Result<(), JournalError> {
        if self.fail_appends {
            return Err(JournalError::Io {
                path: PathBuf::from("/read-only/journal.jsonl"),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<JournalEntry>, JournalError> {
        Ok(self.snapshot())
    }
}

/// Runner that records every request and pops canned outcomes
/// (a successful empty completion once the queue is drained)
#[derive(Default)]
pub struct RecordingRunner {
    pub requests: Mutex<Vec<ProcessRequest>>,
    pub outcomes: Mutex<VecDeque<ProcessOutcome>>,
}

impl RecordingRunner {
    pub fn with_outcomes(outcomes: impl IntoIterator<Item = ProcessOutcome>) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            outcomes: Mutex::new(outcomes.into_iter().collect()),
        }
    }

    pub fn bodies(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.body.clone())
            .collect()
    }
}

pub fn completed(exit_code: i32, last_line: Option<&str>) -> ProcessOutcome {
    ProcessOutcome::Completed(ProcessOutput {
        exit_code: Some(exit_code),
        output: last_line.unwrap_or_default().to_string(),
        truncated: false,
        last_stdout_line: last_line.map(str::to_string),
        duration_ms: 5,
    })
}

#[async_trait]
impl ProcessRunner for RecordingRunner {
    async fn run(&self, request: &ProcessRequest) -> ProcessOutcome {
        self.requests.lock().unwrap().push(request.clone());
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| completed(0, None))
    }
}

/// Planner returning a fixed list of calls
pub struct FixedPlanner(pub Vec<ToolCall>);

#[async_trait]
impl Planner for FixedPlanner {
    async fn plan(
        &self,
        goal: &str,
        _catalog: &[ToolDescriptor],
    ) -> Result<Vec<ToolCall>, PlannerError> {
        if self.0.is_empty() {
            return Err(PlannerError::NoMatch(goal.to_string()));
        }
        Ok(self.0.clone())
    }
}

/// `run_command`: raw command line
pub struct RawCommand(ToolDescriptor);

impl RawCommand {
    pub fn new() -> Self {
        Self(
            ToolDescriptor::new("run_command", "Run a command line")
                .raw_command()
                .with_parameter(ToolParameter::new("command", "Command line", true)),
        )
    }
}

impl Capability for RawCommand {
    fn describe(&self) -> &ToolDescriptor {
        &self.0
    }

    fn execute(&self, call: &ToolCall) -> ExecutionResult {
        match call.require_string("command") {
            Ok(command) => ExecutionResult::planned(command),
            Err(e) => ExecutionResult::failure(e),
        }
    }
}

/// Reversible structured fix whose scripts embed its `Step` argument
pub struct Toggle(ToolDescriptor);

impl Toggle {
    pub fn new() -> Self {
        Self(
            ToolDescriptor::new("Toggle", "Flip a setting")
                .reversible()
                .with_parameter(
                    ToolParameter::new("Step", "Step label", true).with_type(ParamType::String),
                ),
        )
    }
}

impl Capability for Toggle {
    fn describe(&self) -> &ToolDescriptor {
        &self.0
    }

    fn execute(&self, call: &ToolCall) -> ExecutionResult {
        let step = call.get_string("Step").unwrap_or_default();
        ExecutionResult::planned(format!("apply {}", step)).with_undo(format!("revert {}", step))
    }
}

pub fn toggle(step: &str) -> ToolCall {
    ToolCall::new("Toggle").with_arg("Step", step)
}

pub fn command(text: &str) -> ToolCall {
    ToolCall::new("run_command").with_arg("command", text)
}
