//! Windows service remediation: RestartService, SetServiceStartupType
//!
//! Both need an elevated engine.

use super::canonical_choice;
use super::script::{ps_quote, with_verdict};
use chrono::Utc;
use mender_domain::{
    Capability, ExecutionResult, ParamType, ToolCall, ToolDescriptor, ToolParameter,
};

/// Tool name constants
pub const RESTART_SERVICE: &str = "RestartService";
pub const SET_SERVICE_STARTUP_TYPE: &str = "SetServiceStartupType";

const STARTUP_TYPES: [&str; 3] = ["Automatic", "Manual", "Disabled"];

fn name_parameter() -> ToolParameter {
    ToolParameter::new("Name", "Service name (e.g. Spooler)", true)
}

/// Service name argument, trimmed; `None` when blank
fn service_name(call: &ToolCall) -> Option<&str> {
    call.get_string("Name").map(str::trim).filter(|n| !n.is_empty())
}

/// Get the tool descriptor for RestartService
pub fn restart_service_descriptor() -> ToolDescriptor {
    ToolDescriptor::new(
        RESTART_SERVICE,
        "Restart a Windows service and report whether it is running afterwards. Not reversible.",
    )
    .elevated()
    .with_parameter(name_parameter())
}

/// Get the tool descriptor for SetServiceStartupType
pub fn set_service_startup_type_descriptor() -> ToolDescriptor {
    ToolDescriptor::new(
        SET_SERVICE_STARTUP_TYPE,
        "Change a service's startup type. The previous type is saved; undo restores it.",
    )
    .elevated()
    .reversible()
    .with_parameter(name_parameter())
    .with_parameter(
        ToolParameter::new("StartupType", "Automatic, Manual or Disabled", true)
            .with_type(ParamType::one_of(STARTUP_TYPES)),
    )
}

pub struct RestartService {
    descriptor: ToolDescriptor,
}

impl RestartService {
    pub fn new() -> Self {
        Self {
            descriptor: restart_service_descriptor(),
        }
    }
}

impl Default for RestartService {
    fn default() -> Self {
        Self::new()
    }
}

impl Capability for RestartService {
    fn describe(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    fn execute(&self, call: &ToolCall) -> ExecutionResult {
        let Some(name) = service_name(call) else {
            return ExecutionResult::failure("Name is empty");
        };
        let name = ps_quote(name);
        ExecutionResult::planned(with_verdict(&format!(
            "Restart-Service -Name {name} -Force\n\
             $status = (Get-Service -Name {name}).Status\n\
             $result.status = \"$status\"\n\
             if ($status -ne 'Running') {{ throw \"service is $status after restart\" }}"
        )))
    }
}

pub struct SetServiceStartupType {
    descriptor: ToolDescriptor,
}

impl SetServiceStartupType {
    pub fn new() -> Self {
        Self {
            descriptor: set_service_startup_type_descriptor(),
        }
    }
}

impl Default for SetServiceStartupType {
    fn default() -> Self {
        Self::new()
    }
}

impl Capability for SetServiceStartupType {
    fn describe(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    fn execute(&self, call: &ToolCall) -> ExecutionResult {
        let Some(raw_name) = service_name(call) else {
            return ExecutionResult::failure("Name is empty");
        };
        let Some(startup) = canonical_choice(call, "StartupType", &STARTUP_TYPES) else {
            return ExecutionResult::failure("StartupType must be Automatic, Manual or Disabled");
        };

        let name = ps_quote(raw_name);
        let state_name = format!(
            r"mender\service-{}-{}.txt",
            raw_name.replace(|c: char| !c.is_ascii_alphanumeric(), "_"),
            Utc::now().format("%Y%m%dT%H%M%S%3f")
        );
        let state = format!("$state = Join-Path $env:TEMP {}", ps_quote(&state_name));

        let forward = with_verdict(&format!(
            "{state}\n\
             $previous = (Get-Service -Name {name}).StartType\n\
             New-Item -ItemType Directory -Force -Path (Split-Path $state) | Out-Null\n\
             Set-Content -Path $state -Value \"$previous\"\n\
             Set-Service -Name {name} -StartupType {startup}\n\
             $result.previous = \"$previous\"\n\
             $result.current = {startup_quoted}",
            startup_quoted = ps_quote(startup),
        ));

        let undo = with_verdict(&format!(
            "{state}\n\
             if (-not (Test-Path $state)) {{ throw \"saved startup type not found: $state\" }}\n\
             $previous = (Get-Content -Path $state -TotalCount 1).Trim()\n\
             Set-Service -Name {name} -StartupType $previous\n\
             $result.restored = $previous"
        ));

        ExecutionResult::planned(forward).with_undo(undo)
    }
}
