//! Audit journal port
//!
//! Defines the durable, append-only store of [`JournalEntry`] values.
//!
//! Unlike diagnostic `tracing` output, the journal is part of the trust
//! model: a failed append is an error the caller must escalate, never a
//! warning to swallow.

use mender_domain::{EntryKind, JournalEntry, SessionId};
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from the journal adapter
#[derive(Error, Debug)]
pub enum JournalError {
    #[error("Journal I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not serialize journal entry: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Port for the audit journal.
///
/// `append` must have durably written the entry when it returns `Ok`.
/// Reads skip malformed records instead of failing.
pub trait AuditJournal: Send + Sync {
    /// Append one entry
    fn append(&self, entry: &JournalEntry) -> Result<(), JournalError>;

    /// Every readable entry, in write order
    fn read_all(&self) -> Result<Vec<JournalEntry>, JournalError>;

    /// The most recent `limit` entries, in write order
    fn read_recent(&self, limit: usize) -> Result<Vec<JournalEntry>, JournalError> {
        let mut entries = self.read_all()?;
        let skip = entries.len().saturating_sub(limit);
        Ok(entries.split_off(skip))
    }

    /// Every entry of one session, in write order
    fn read_session(&self, session: &SessionId) -> Result<Vec<JournalEntry>, JournalError> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|e| &e.session_id == session)
            .collect())
    }

    /// Session of the most recent action entry that no undo has reversed yet
    fn latest_action_session(&self) -> Result<Option<SessionId>, JournalError> {
        let entries = self.read_all()?;
        let reversed: HashSet<&SessionId> = entries
            .iter()
            .filter(|e| e.kind == EntryKind::Undo)
            .filter_map(|e| e.reverses.as_ref())
            .collect();
        Ok(entries
            .iter()
            .rev()
            .find(|e| e.kind == EntryKind::Action && !reversed.contains(&e.session_id))
            .map(|e| e.session_id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mender_domain::{ExecutionResult, StepOutcome};
    use serde_json::json;
    use std::sync::Mutex;

    struct MemoryJournal(Mutex<Vec<JournalEntry>>);

    impl AuditJournal for MemoryJournal {
        fn append(&self, entry: &JournalEntry) -> Result<(), JournalError> {
            self.0.lock().unwrap().push(entry.clone());
            Ok(())
        }

        fn read_all(&self) -> Result<Vec<JournalEntry>, JournalError> {
            Ok(self.0.lock().unwrap().clone())
        }
    }

    fn entry(session: &str, tool: &str) -> JournalEntry {
        JournalEntry::action(
            session.parse().unwrap(),
            tool,
            json!({}),
            StepOutcome::Succeeded,
            ExecutionResult::success(),
        )
    }

    #[test]
    fn test_default_reads() {
        let journal = MemoryJournal(Mutex::new(Vec::new()));
        journal.append(&entry("a", "one")).unwrap();
        journal.append(&entry("b", "two")).unwrap();
        journal.append(&entry("a", "three")).unwrap();

        let recent = journal.read_recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].tool_name, "two");
        assert_eq!(recent[1].tool_name, "three");

        let session = journal.read_session(&"a".parse().unwrap()).unwrap();
        let tools: Vec<&str> = session.iter().map(|e| e.tool_name.as_str()).collect();
        assert_eq!(tools, vec!["one", "three"]);

        assert!(journal.read_recent(10).unwrap().len() == 3);
    }

    #[test]
    fn test_latest_action_session_ignores_undo_entries() {
        let journal = MemoryJournal(Mutex::new(Vec::new()));
        journal.append(&entry("a", "FlushDnsCache")).unwrap();
        let original = entry("b", "DisableOutlookAddins");
        journal.append(&original).unwrap();
        assert_eq!(
            journal.latest_action_session().unwrap(),
            Some("b".parse().unwrap())
        );

        journal
            .append(&JournalEntry::undo(
                "undo-1".parse().unwrap(),
                &original,
                StepOutcome::Succeeded,
                ExecutionResult::success(),
            ))
            .unwrap();

        // b has been reversed, so the next candidate is a
        assert_eq!(
            journal.latest_action_session().unwrap(),
            Some("a".parse().unwrap())
        );
    }

    #[test]
    fn test_latest_action_session_none_when_all_reversed() {
        let journal = MemoryJournal(Mutex::new(Vec::new()));
        let original = entry("a", "DisableOutlookAddins");
        journal.append(&original).unwrap();
        journal
            .append(&JournalEntry::undo(
                "undo-1".parse().unwrap(),
                &original,
                StepOutcome::Failed,
                ExecutionResult::failure("backup missing"),
            ))
            .unwrap();

        assert_eq!(journal.latest_action_session().unwrap(), None);
    }
}
