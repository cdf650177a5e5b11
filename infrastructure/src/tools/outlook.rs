//! Outlook add-in remediation: DisableOutlookAddins
//!
//! Exports the add-in registry key to a `.reg` backup, then sets
//! `LoadBehavior = 0` on every add-in. The undo script imports the backup.
//! The `AllUsers` scope writes under HKLM and needs an elevated engine.

use super::canonical_choice;
use super::script::{ps_quote, with_verdict};
use chrono::Utc;
use mender_domain::{
    Capability, ExecutionResult, ParamType, ToolCall, ToolDescriptor, ToolParameter,
};

/// Tool name constant
pub const DISABLE_OUTLOOK_ADDINS: &str = "DisableOutlookAddins";

const SCOPES: [&str; 2] = ["CurrentUser", "AllUsers"];

const ADDINS_SUBKEY: &str = r"Software\Microsoft\Office\Outlook\Addins";

/// Get the tool descriptor for DisableOutlookAddins
pub fn disable_outlook_addins_descriptor() -> ToolDescriptor {
    ToolDescriptor::new(
        DISABLE_OUTLOOK_ADDINS,
        "Disable all Outlook COM add-ins (slow start, crashes on launch). \
         Backs up the registry key first; undo restores it.",
    )
    .reversible()
    .with_parameter(
        ToolParameter::new(
            "Scope",
            "Registry hive: CurrentUser or AllUsers (AllUsers needs elevation)",
            true,
        )
            .with_type(ParamType::one_of(SCOPES)),
    )
}

pub struct DisableOutlookAddins {
    descriptor: ToolDescriptor,
}

impl DisableOutlookAddins {
    pub fn new() -> Self {
        Self {
            descriptor: disable_outlook_addins_descriptor(),
        }
    }
}

impl Default for DisableOutlookAddins {
    fn default() -> Self {
        Self::new()
    }
}

/// (reg.exe key, PowerShell provider path)
fn hive_paths(scope: &str) -> (String, String) {
    let hive = if scope == "AllUsers" { "HKLM" } else { "HKCU" };
    (
        format!(r"{}\{}", hive, ADDINS_SUBKEY),
        format!(r"{}:\{}", hive, ADDINS_SUBKEY),
    )
}

impl Capability for DisableOutlookAddins {
    fn describe(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    fn requires_elevation(&self, call: &ToolCall) -> bool {
        canonical_choice(call, "Scope", &SCOPES) == Some("AllUsers")
    }

    fn execute(&self, call: &ToolCall) -> ExecutionResult {
        let Some(scope) = canonical_choice(call, "Scope", &SCOPES) else {
            return ExecutionResult::failure("Scope must be CurrentUser or AllUsers");
        };
        let (reg_key, ps_path) = hive_paths(scope);
        let backup_name = format!(
            r"mender\outlook-addins-{}.reg",
            Utc::now().format("%Y%m%dT%H%M%S%3f")
        );
        let backup = format!("$backup = Join-Path $env:TEMP {}", ps_quote(&backup_name));

        let forward = with_verdict(&format!(
            "{backup}\n\
             New-Item -ItemType Directory -Force -Path (Split-Path $backup) | Out-Null\n\
             & reg.exe export {key} $backup /y | Out-Null\n\
             if ($LASTEXITCODE -ne 0) {{ throw \"registry export failed ($LASTEXITCODE)\" }}\n\
             $disabled = 0\n\
             Get-ChildItem -Path {path} | ForEach-Object {{\n\
             Set-ItemProperty -Path $_.PSPath -Name LoadBehavior -Value 0 -Type DWord\n\
             $disabled++\n\
             }}\n\
             $result.disabled = $disabled\n\
             $result.backup = $backup",
            backup = backup,
            key = ps_quote(&reg_key),
            path = ps_quote(&ps_path),
        ));

        let undo = with_verdict(&format!(
            "{backup}\n\
             if (-not (Test-Path $backup)) {{ throw \"backup not found: $backup\" }}\n\
             & reg.exe import $backup | Out-Null\n\
             if ($LASTEXITCODE -ne 0) {{ throw \"registry import failed ($LASTEXITCODE)\" }}\n\
             $result.restored = $backup",
            backup = backup,
        ));

        ExecutionResult::planned(forward).with_undo(undo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(scope: &str) -> ToolCall {
        ToolCall::new(DISABLE_OUTLOOK_ADDINS).with_arg("Scope", scope)
    }

    #[test]
    fn test_forward_and_undo_share_backup() {
        let result = DisableOutlookAddins::new().execute(&call("CurrentUser"));
        let forward = result.forward().unwrap();
        let undo = result.undo().unwrap();

        assert!(forward.contains(r"'HKCU\Software\Microsoft\Office\Outlook\Addins'"));
        assert!(forward.contains("LoadBehavior -Value 0"));
        assert!(undo.contains("reg.exe import $backup"));

        let backup_line = |s: &str| s.lines().find(|l| l.starts_with("$backup")).map(str::to_string);
        assert_eq!(backup_line(forward), backup_line(undo));
    }

    #[test]
    fn test_scope_is_case_insensitive() {
        let result = DisableOutlookAddins::new().execute(&call("allusers"));
        assert!(result.forward().unwrap().contains(r"HKLM:\Software"));
    }

    #[test]
    fn test_schema() {
        let cap = DisableOutlookAddins::new();
        assert!(cap.describe().reversible);
        assert!(!cap.describe().requires_elevated_privilege);
        assert!(cap.validate(&json!({"Scope": "CurrentUser"})).is_ok());
        assert!(cap.validate(&json!({"Scope": "Everyone"})).is_err());
        assert!(cap.validate(&json!({})).is_err());
    }

    #[test]
    fn test_all_users_requires_elevation() {
        let cap = DisableOutlookAddins::new();
        assert!(cap.requires_elevation(&call("AllUsers")));
        assert!(cap.requires_elevation(&call("allusers")));
        assert!(!cap.requires_elevation(&call("CurrentUser")));
    }
}
