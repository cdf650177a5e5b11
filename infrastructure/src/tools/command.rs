//! Raw command capability: run_command
//!
//! The only capability whose script is free text. Its command line is
//! classified by the policy before anything runs, and it is never
//! reversible.

use mender_domain::{Capability, ExecutionResult, ToolCall, ToolDescriptor, ToolParameter};

/// Tool name constant
pub const RUN_COMMAND: &str = "run_command";

/// Get the tool descriptor for run_command
pub fn run_command_descriptor() -> ToolDescriptor {
    ToolDescriptor::new(
        RUN_COMMAND,
        "Run a single command line. Subject to the command policy: read-only diagnostics \
         always, maintenance and targeted kills only when enabled.",
    )
    .raw_command()
    .with_parameter(ToolParameter::new("command", "The command line to run", true))
}

pub struct RunCommand {
    descriptor: ToolDescriptor,
}

impl RunCommand {
    pub fn new() -> Self {
        Self {
            descriptor: run_command_descriptor(),
        }
    }
}

impl Default for RunCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl Capability for RunCommand {
    fn describe(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    fn execute(&self, call: &ToolCall) -> ExecutionResult {
        let command = match call.require_string("command") {
            Ok(c) => c.trim(),
            Err(e) => return ExecutionResult::failure(e),
        };
        if command.is_empty() {
            return ExecutionResult::failure("command is empty");
        }
        ExecutionResult::planned(command)
    }
}
