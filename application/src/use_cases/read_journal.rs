//! Read Journal use case.
//!
//! Read-only access to the audit trail for `history`.

use crate::ports::journal::{AuditJournal, JournalError};
use mender_domain::{JournalEntry, SessionId};
use std::sync::Arc;

/// Which slice of the journal to read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalQuery {
    /// The most recent `n` entries
    Recent(usize),
    /// Every entry of one session
    Session(SessionId),
}

pub struct ReadJournalUseCase<J: AuditJournal> {
    journal: Arc<J>,
}

impl<J: AuditJournal> ReadJournalUseCase<J> {
    pub fn new(journal: Arc<J>) -> Self {
        Self { journal }
    }

    pub fn execute(&self, query: &JournalQuery) -> Result<Vec<JournalEntry>, JournalError> {
        match query {
            JournalQuery::Recent(limit) => self.journal.read_recent(*limit),
            JournalQuery::Session(session) => self.journal.read_session(session),
        }
    }
}
