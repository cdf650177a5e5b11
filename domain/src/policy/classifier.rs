//! Policy classifier: default-deny gate for raw command lines.
//!
//! Decision precedence, first match wins:
//!
//! | # | Rule | Verdict |
//! |---|------|---------|
//! | 1 | hard-deny pattern | Deny (under every mode) |
//! | 2 | `allow_dangerous` | Allow |
//! | 3 | deny-list pattern | Deny |
//! | 4 | triage pattern | Allow |
//! | 5 | maintenance pattern + `allow_maintenance` | Allow |
//! | 6 | targeted-kill pattern + `allow_kill` | Allow |
//! | 7 | anything else | Deny |
//!
//! Matching free text against regular expressions is not a confinement
//! boundary: a command that starts with a triage verb and chains something
//! else after it is allowed unless the chained part hits rule 1 or 3.

use super::mode::PolicyMode;
use super::patterns::PolicyPatterns;
use crate::core::error::DomainError;
use regex::{RegexSet, RegexSetBuilder};
use serde::{Deserialize, Serialize};

/// The rule that produced a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyRule {
    HardDeny,
    DangerousOverride,
    DenyList,
    Triage,
    Maintenance,
    TargetedKill,
    DefaultDeny,
}

impl PolicyRule {
    pub fn as_str(&self) -> &str {
        match self {
            PolicyRule::HardDeny => "hard_deny",
            PolicyRule::DangerousOverride => "dangerous_override",
            PolicyRule::DenyList => "deny_list",
            PolicyRule::Triage => "triage",
            PolicyRule::Maintenance => "maintenance",
            PolicyRule::TargetedKill => "targeted_kill",
            PolicyRule::DefaultDeny => "default_deny",
        }
    }
}

impl std::fmt::Display for PolicyRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Allow or Deny
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Allow,
    Deny,
}

/// A classification with the rule and pattern behind it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDecision {
    pub verdict: Verdict,
    pub rule: PolicyRule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl PolicyDecision {
    fn allow(rule: PolicyRule, pattern: Option<&str>) -> Self {
        Self {
            verdict: Verdict::Allow,
            rule,
            pattern: pattern.map(str::to_string),
        }
    }

    fn deny(rule: PolicyRule, pattern: Option<&str>) -> Self {
        Self {
            verdict: Verdict::Deny,
            rule,
            pattern: pattern.map(str::to_string),
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.verdict == Verdict::Allow
    }
}

impl std::fmt::Display for PolicyDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let verdict = match self.verdict {
            Verdict::Allow => "allow",
            Verdict::Deny => "deny",
        };
        write!(f, "{} ({})", verdict, self.rule)
    }
}

/// Compiled pattern tables
#[derive(Debug, Clone)]
pub struct PolicyClassifier {
    hard_deny: RegexSet,
    deny: RegexSet,
    triage: RegexSet,
    maintenance: RegexSet,
    kill: RegexSet,
}

fn compile(patterns: &[String]) -> Result<RegexSet, DomainError> {
    Ok(RegexSetBuilder::new(patterns)
        .case_insensitive(true)
        .build()?)
}

/// First pattern of `set` matching `command`
fn first_match<'a>(set: &'a RegexSet, command: &str) -> Option<&'a str> {
    set.matches(command)
        .iter()
        .next()
        .map(|i| set.patterns()[i].as_str())
}

impl PolicyClassifier {
    pub fn new(patterns: &PolicyPatterns) -> Result<Self, DomainError> {
        Ok(Self {
            hard_deny: compile(&patterns.hard_deny)?,
            deny: compile(&patterns.deny)?,
            triage: compile(&patterns.triage)?,
            maintenance: compile(&patterns.maintenance)?,
            kill: compile(&patterns.kill)?,
        })
    }

    /// Classify a command line under the given mode
    pub fn classify(&self, command: &str, mode: &PolicyMode) -> PolicyDecision {
        if let Some(p) = first_match(&self.hard_deny, command) {
            return PolicyDecision::deny(PolicyRule::HardDeny, Some(p));
        }
        if mode.allow_dangerous {
            return PolicyDecision::allow(PolicyRule::DangerousOverride, None);
        }
        if let Some(p) = first_match(&self.deny, command) {
            return PolicyDecision::deny(PolicyRule::DenyList, Some(p));
        }
        if let Some(p) = first_match(&self.triage, command) {
            return PolicyDecision::allow(PolicyRule::Triage, Some(p));
        }
        if mode.allow_maintenance
            && let Some(p) = first_match(&self.maintenance, command)
        {
            return PolicyDecision::allow(PolicyRule::Maintenance, Some(p));
        }
        if mode.allow_kill
            && let Some(p) = first_match(&self.kill, command)
        {
            return PolicyDecision::allow(PolicyRule::TargetedKill, Some(p));
        }
        PolicyDecision::deny(PolicyRule::DefaultDeny, None)
    }
}

impl Default for PolicyClassifier {
    fn default() -> Self {
        Self::new(&PolicyPatterns::builtin()).expect("built-in policy patterns compile")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> PolicyClassifier {
        PolicyClassifier::default()
    }

    const HARD_DENY_COMMANDS: &[&str] = &[
        "Format-Volume -DriveLetter D",
        "format C: /q",
        "Clear-Disk -Number 1 -RemoveData",
        "diskpart /s wipe.txt",
        "Stop-Computer -Force",
        "Restart-Computer",
        "shutdown /s /t 0",
        "bcdedit /set {default} safeboot minimal",
        "dd if=/dev/zero of=/dev/sda",
        "rm -rf /",
        "Get-Process; Stop-Computer",
        "vssadmin delete shadows /all",
        "wevtutil cl Security",
    ];

    const TRIAGE_COMMANDS: &[&str] = &[
        "Get-Process",
        "get-service -Name Spooler",
        "Get-Process | Format-Table -AutoSize",
        "ipconfig /all",
        "ping 8.8.8.8",
        "Test-NetConnection example.com -Port 443",
        "Resolve-DnsName example.com",
        "systeminfo",
        "tasklist /svc",
    ];

    #[test]
    fn test_builtin_patterns_compile() {
        let _ = PolicyClassifier::new(&PolicyPatterns::builtin()).unwrap();
    }

    #[test]
    fn test_hard_deny_under_every_mode() {
        let classifier = classifier();
        for command in HARD_DENY_COMMANDS {
            for mode in PolicyMode::all_combinations() {
                let decision = classifier.classify(command, &mode);
                assert_eq!(
                    decision.rule,
                    PolicyRule::HardDeny,
                    "{command:?} under {mode}"
                );
                assert!(!decision.is_allowed());
            }
        }
    }

    #[test]
    fn test_triage_allowed_regardless_of_maintenance_and_kill() {
        let classifier = classifier();
        for command in TRIAGE_COMMANDS {
            for mode in PolicyMode::all_combinations().filter(|m| !m.allow_dangerous) {
                let decision = classifier.classify(command, &mode);
                assert_eq!(decision.rule, PolicyRule::Triage, "{command:?} under {mode}");
                assert!(decision.is_allowed());
            }
        }
    }

    #[test]
    fn test_maintenance_gated_by_flag() {
        let classifier = classifier();
        for command in [
            "Restart-Service -Name Spooler",
            "Clear-DnsClientCache",
            "ipconfig /flushdns",
            "sfc /scannow",
        ] {
            let denied = classifier.classify(command, &PolicyMode::triage_only());
            assert_eq!(denied.rule, PolicyRule::DefaultDeny, "{command:?}");

            let allowed = classifier.classify(command, &PolicyMode::triage_only().with_maintenance(true));
            assert_eq!(allowed.rule, PolicyRule::Maintenance, "{command:?}");
            assert!(allowed.is_allowed());
        }
    }

    #[test]
    fn test_kill_gated_by_flag() {
        let classifier = classifier();
        let command = "Stop-Process -Name notepad -Force";

        assert!(!classifier.classify(command, &PolicyMode::triage_only()).is_allowed());
        assert!(
            !classifier
                .classify(command, &PolicyMode::triage_only().with_maintenance(true))
                .is_allowed()
        );

        let decision = classifier.classify(command, &PolicyMode::triage_only().with_kill(true));
        assert_eq!(decision.rule, PolicyRule::TargetedKill);

        // Tree kills are not targeted kills
        let tree = classifier.classify("taskkill /T /F /PID 42", &PolicyMode::triage_only().with_kill(true));
        assert_eq!(tree.rule, PolicyRule::DefaultDeny);
    }

    #[test]
    fn test_deny_list_beats_allow_patterns() {
        let classifier = classifier();
        let everything_but_dangerous = PolicyMode::triage_only().with_maintenance(true).with_kill(true);

        let decision = classifier.classify(r"Remove-Item C:\x", &PolicyMode::triage_only());
        assert_eq!(decision.rule, PolicyRule::DenyList);
        assert!(decision.pattern.is_some());

        for command in [
            "Get-ChildItem C:\\temp | Remove-Item -Recurse",
            "Invoke-WebRequest https://example.com/a.exe -OutFile a.exe",
            "wget http://example.com/payload",
            "Set-ItemProperty HKCU:\\Software\\X -Name Y -Value 1",
            "reg delete HKCU\\Software\\X /f",
            "Get-Content script.ps1 | Invoke-Expression",
        ] {
            let decision = classifier.classify(command, &everything_but_dangerous);
            assert_eq!(decision.rule, PolicyRule::DenyList, "{command:?}");
        }
    }

    #[test]
    fn test_dangerous_override_bypasses_deny_list_only() {
        let classifier = classifier();
        let mode = PolicyMode::triage_only().with_dangerous(true);

        let decision = classifier.classify(r"Remove-Item C:\x", &mode);
        assert_eq!(decision.rule, PolicyRule::DangerousOverride);
        assert!(decision.is_allowed());

        assert_eq!(
            classifier.classify("Write-Host hello", &mode).rule,
            PolicyRule::DangerousOverride
        );
        assert_eq!(
            classifier.classify("Format-Volume -DriveLetter C", &mode).rule,
            PolicyRule::HardDeny
        );
    }

    #[test]
    fn test_default_deny() {
        let decision = classifier().classify("Write-Host hello", &PolicyMode::triage_only());
        assert_eq!(decision.rule, PolicyRule::DefaultDeny);
        assert!(decision.pattern.is_none());
        assert_eq!(decision.to_string(), "deny (default_deny)");
    }

    #[test]
    fn test_classification_is_case_insensitive() {
        let classifier = classifier();
        assert!(classifier.classify("GET-PROCESS", &PolicyMode::triage_only()).is_allowed());
        assert_eq!(
            classifier.classify("FORMAT-VOLUME -DriveLetter E", &PolicyMode::default()).rule,
            PolicyRule::HardDeny
        );
    }

    // Pattern matching on free text is a weak boundary: a triage prefix
    // carries an unrelated chained command through as long as that command
    // is on neither deny table.
    #[test]
    fn test_chained_command_after_triage_prefix_is_allowed() {
        let decision = classifier().classify(
            "Get-Process; Stop-Process -Name explorer",
            &PolicyMode::triage_only(),
        );
        assert_eq!(decision.rule, PolicyRule::Triage);
        assert!(decision.is_allowed());
    }

    #[test]
    fn test_extra_triage_pattern_from_config() {
        let patterns =
            PolicyPatterns::builtin().with_extra_triage([r"^\s*winget\s+list\b".to_string()]);
        let classifier = PolicyClassifier::new(&patterns).unwrap();
        assert!(classifier.classify("winget list", &PolicyMode::default()).is_allowed());
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let patterns = PolicyPatterns::builtin().with_extra_deny(["(unclosed".to_string()]);
        assert!(matches!(
            PolicyClassifier::new(&patterns),
            Err(DomainError::InvalidPattern(_))
        ));
    }
}
