//! Journal entities: sessions, step outcomes and journal entries

use crate::core::error::DomainError;
use crate::tool::value_objects::ExecutionResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier shared by every entry written during one engine invocation.
///
/// Format: `YYYYMMDDTHHMMSS.mmmZ-<pid>`, so ids sort by creation time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Create the id for a session starting now in this process
    pub fn generate() -> Self {
        Self::at(Utc::now(), std::process::id())
    }

    pub fn at(started: DateTime<Utc>, pid: u32) -> Self {
        Self(format!("{}-{}", started.format("%Y%m%dT%H%M%S%.3fZ"), pid))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for SessionId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(DomainError::InvalidSessionId(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether an entry records a forward action or an undo replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    #[default]
    Action,
    Undo,
}

/// Step-level outcome of one proposed tool call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    /// The action ran and the capability judged it successful
    Succeeded,
    /// The action ran (or tried to) and failed
    Failed,
    /// The process exceeded its deadline and was killed
    TimedOut,
    /// The command was blocked by the policy classifier
    PolicyRejected,
    /// Arguments did not satisfy the schema; nothing ran
    ValidationFailed,
    /// Dry mode: the step would run
    Planned,
}

impl StepOutcome {
    pub fn as_str(&self) -> &str {
        match self {
            StepOutcome::Succeeded => "succeeded",
            StepOutcome::Failed => "failed",
            StepOutcome::TimedOut => "timed_out",
            StepOutcome::PolicyRejected => "policy_rejected",
            StepOutcome::ValidationFailed => "validation_failed",
            StepOutcome::Planned => "planned",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StepOutcome::Succeeded | StepOutcome::Planned)
    }
}

impl std::fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One line of the audit journal.
///
/// Written exactly once, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub session_id: SessionId,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub kind: EntryKind,
    pub tool_name: String,
    #[serde(default)]
    pub arguments: Value,
    pub outcome: StepOutcome,
    pub result: ExecutionResult,
    /// Script that reverses this action, if it ran and is reversible
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub undo_script: Option<String>,
    /// For undo entries: the action session being reversed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverses: Option<SessionId>,
}

impl JournalEntry {
    pub fn action(
        session_id: SessionId,
        tool_name: impl Into<String>,
        arguments: Value,
        outcome: StepOutcome,
        result: ExecutionResult,
    ) -> Self {
        Self {
            session_id,
            timestamp: Utc::now(),
            kind: EntryKind::Action,
            tool_name: tool_name.into(),
            arguments,
            outcome,
            result,
            undo_script: None,
            reverses: None,
        }
    }

    pub fn undo(
        session_id: SessionId,
        original: &JournalEntry,
        outcome: StepOutcome,
        result: ExecutionResult,
    ) -> Self {
        Self {
            session_id,
            timestamp: Utc::now(),
            kind: EntryKind::Undo,
            tool_name: original.tool_name.clone(),
            arguments: original.arguments.clone(),
            outcome,
            result,
            undo_script: None,
            reverses: Some(original.session_id.clone()),
        }
    }

    pub fn with_undo_script(mut self, undo_script: Option<String>) -> Self {
        self.undo_script = undo_script.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Undo script if this is an action entry with a non-blank reversal
    pub fn replayable_undo(&self) -> Option<&str> {
        match self.kind {
            EntryKind::Action => self.undo_script.as_deref(),
            EntryKind::Undo => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_session_id_format_sorts_by_time() {
        let early = SessionId::at(Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(), 77);
        let late = SessionId::at(Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 6).unwrap(), 1);

        assert_eq!(early.as_str(), "20260102T030405.000Z-77");
        assert!(early < late);
    }

    #[test]
    fn test_session_id_parse() {
        let id: SessionId = " 20260102T030405.000Z-77 ".parse().unwrap();
        assert_eq!(id.as_str(), "20260102T030405.000Z-77");
        assert!("".parse::<SessionId>().is_err());
        assert!("two words".parse::<SessionId>().is_err());
    }

    #[test]
    fn test_step_outcome_success() {
        assert!(StepOutcome::Succeeded.is_success());
        assert!(StepOutcome::Planned.is_success());
        assert!(!StepOutcome::TimedOut.is_success());
        assert!(!StepOutcome::PolicyRejected.is_success());
    }

    #[test]
    fn test_blank_undo_script_is_dropped() {
        let entry = JournalEntry::action(
            SessionId::generate(),
            "FlushDnsCache",
            json!({}),
            StepOutcome::Succeeded,
            ExecutionResult::success(),
        )
        .with_undo_script(Some("   ".to_string()));
        assert!(entry.replayable_undo().is_none());
    }

    #[test]
    fn test_undo_entries_are_never_replayable() {
        let original = JournalEntry::action(
            SessionId::generate(),
            "DisableOutlookAddins",
            json!({"Scope": "CurrentUser"}),
            StepOutcome::Succeeded,
            ExecutionResult::success(),
        )
        .with_undo_script(Some("reg import backup.reg".to_string()));
        assert_eq!(original.replayable_undo(), Some("reg import backup.reg"));

        let replay = JournalEntry::undo(
            SessionId::generate(),
            &original,
            StepOutcome::Succeeded,
            ExecutionResult::success(),
        )
        .with_undo_script(Some("anything".to_string()));
        assert_eq!(replay.kind, EntryKind::Undo);
        assert_eq!(replay.reverses.as_ref(), Some(&original.session_id));
        assert!(replay.replayable_undo().is_none());
    }

    #[test]
    fn test_entry_json_shape() {
        let entry = JournalEntry::action(
            "s-1".parse().unwrap(),
            "run_command",
            json!({"command": "Get-Process"}),
            StepOutcome::Succeeded,
            ExecutionResult::success(),
        );
        let value = serde_json::to_value(&entry).unwrap();

        assert_eq!(value["session_id"], "s-1");
        assert_eq!(value["kind"], "action");
        assert_eq!(value["outcome"], "succeeded");
        assert_eq!(value["result"]["success"], true);
        assert!(value.get("undo_script").is_none());
        assert!(value.get("reverses").is_none());

        let back: JournalEntry = serde_json::from_value(value).unwrap();
        assert_eq!(back, entry);
    }
}
