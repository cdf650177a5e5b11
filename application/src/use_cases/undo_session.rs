//! Undo Session use case.
//!
//! Replays the recorded undo scripts of one session newest-first through the
//! same bounded runner as forward actions. Undo is best effort: a failing
//! script is logged and the replay moves on. There is no retry and no
//! rollback of the undo itself.

use crate::ports::journal::{AuditJournal, JournalError};
use crate::ports::process_runner::ProcessRunner;
use crate::ports::step_progress::StepProgressNotifier;
use crate::use_cases::execute_action::ActionExecutor;
use chrono::{DateTime, Utc};
use mender_domain::{ExecutionResult, JournalEntry, SessionId, StepOutcome};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Input for the UndoSession use case
#[derive(Debug, Clone, Default)]
pub struct UndoInput {
    /// Session to reverse; the latest action session not yet reversed when `None`
    pub session: Option<SessionId>,
    /// List the scripts without running or journaling them
    pub dry_run: bool,
}

/// One replayed (or listed) undo script
#[derive(Debug, Clone, Serialize)]
pub struct UndoStepReport {
    pub tool_name: String,
    /// Timestamp of the action being reversed
    pub original_timestamp: DateTime<Utc>,
    pub script: String,
    pub outcome: StepOutcome,
    pub result: ExecutionResult,
}

/// Output of the UndoSession use case
#[derive(Debug, Clone, Serialize)]
pub struct UndoReport {
    pub target_session: SessionId,
    /// Session the replay was journaled under (`None` for dry runs)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub undo_session: Option<SessionId>,
    /// Entries in the target session that had nothing to reverse
    pub skipped: usize,
    pub steps: Vec<UndoStepReport>,
    pub dry_run: bool,
}

impl UndoReport {
    pub fn failures(&self) -> usize {
        self.steps.iter().filter(|s| !s.outcome.is_success()).count()
    }

    pub fn exit_code(&self) -> i32 {
        if self.failures() == 0 { 0 } else { 1 }
    }
}

/// Errors that prevent an undo replay
#[derive(Error, Debug)]
pub enum UndoError {
    #[error("Nothing to undo: every action session has already been reversed (use --session to repeat one)")]
    NothingToUndo,

    #[error("Unknown session: {0}")]
    UnknownSession(SessionId),

    #[error("Journal error during undo: {0}")]
    Journal(#[from] JournalError),
}

/// Use case for reversing a session
pub struct UndoSessionUseCase<R: ProcessRunner, J: AuditJournal> {
    executor: Arc<ActionExecutor<R>>,
    journal: Arc<J>,
    session: SessionId,
}

impl<R: ProcessRunner, J: AuditJournal> UndoSessionUseCase<R, J> {
    pub fn new(executor: Arc<ActionExecutor<R>>, journal: Arc<J>) -> Self {
        Self {
            executor,
            journal,
            session: SessionId::generate(),
        }
    }

    /// Session the undo entries are written under
    pub fn with_session(mut self, session: SessionId) -> Self {
        self.session = session;
        self
    }

    pub async fn execute(
        &self,
        input: UndoInput,
        progress: &dyn StepProgressNotifier,
    ) -> Result<UndoReport, UndoError> {
        let target = match input.session {
            Some(session) => session,
            None => self
                .journal
                .latest_action_session()?
                .ok_or(UndoError::NothingToUndo)?,
        };

        let entries = self.journal.read_session(&target)?;
        if entries.is_empty() {
            return Err(UndoError::UnknownSession(target));
        }

        // Newest first
        let replay: Vec<(&JournalEntry, &str)> = entries
            .iter()
            .rev()
            .filter_map(|e| e.replayable_undo().map(|script| (e, script)))
            .collect();
        let skipped = entries.len() - replay.len();

        info!(
            "Undoing session {}: {} script(s), {} entr(ies) without reversal",
            target,
            replay.len(),
            skipped
        );
        progress.on_undo_start(replay.len());

        let mut steps = Vec::with_capacity(replay.len());
        for (original, script) in replay {
            let (outcome, result) = if input.dry_run {
                (StepOutcome::Planned, ExecutionResult::planned(script))
            } else {
                let (outcome, result) = self
                    .executor
                    .run_undo_script(&original.tool_name, script)
                    .await;
                if !outcome.is_success() {
                    warn!(
                        "Undo of {} ({}) did not succeed: {}",
                        original.tool_name,
                        original.timestamp,
                        result.error.as_deref().unwrap_or(outcome.as_str())
                    );
                }
                let entry =
                    JournalEntry::undo(self.session.clone(), original, outcome, result.clone());
                self.journal.append(&entry)?;
                (outcome, result)
            };

            progress.on_undo_step(&original.tool_name, outcome);
            steps.push(UndoStepReport {
                tool_name: original.tool_name.clone(),
                original_timestamp: original.timestamp,
                script: script.to_string(),
                outcome,
                result,
            });
        }

        Ok(UndoReport {
            undo_session: (!input.dry_run).then(|| self.session.clone()),
            target_session: target,
            skipped,
            steps,
            dry_run: input.dry_run,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineConfig, ExecutionParams};
    use crate::ports::step_progress::NoStepProgress;
    use crate::use_cases::test_support::*;
    use mender_domain::{EntryKind, PolicyClassifier};
    use serde_json::json;

    fn executor(runner: Arc<RecordingRunner>) -> Arc<ActionExecutor<RecordingRunner>> {
        Arc::new(ActionExecutor::new(
            runner,
            Arc::new(PolicyClassifier::default()),
            EngineConfig::default().with_execution(ExecutionParams::default()),
        ))
    }

    fn action(session: &str, tool: &str, undo: Option<&str>) -> JournalEntry {
        JournalEntry::action(
            session.parse().unwrap(),
            tool,
            json!({}),
            StepOutcome::Succeeded,
            ExecutionResult::success(),
        )
        .with_undo_script(undo.map(str::to_string))
    }

    fn seeded() -> Arc<MemoryJournal> {
        let journal = Arc::new(MemoryJournal::default());
        journal.append(&action("s1", "A", Some("undo A"))).unwrap();
        journal.append(&action("s1", "FlushDnsCache", None)).unwrap();
        journal.append(&action("s1", "B", Some("undo B"))).unwrap();
        journal.append(&action("s1", "C", Some("undo C"))).unwrap();
        journal
    }

    #[tokio::test]
    async fn test_undo_runs_in_reverse_write_order() {
        let runner = Arc::new(RecordingRunner::default());
        let journal = seeded();
        let uc = UndoSessionUseCase::new(executor(runner.clone()), journal.clone())
            .with_session("u1".parse().unwrap());

        let report = uc
            .execute(
                UndoInput {
                    session: Some("s1".parse().unwrap()),
                    dry_run: false,
                },
                &NoStepProgress,
            )
            .await
            .unwrap();

        assert_eq!(runner.bodies(), vec!["undo C", "undo B", "undo A"]);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.undo_session.as_ref().unwrap().as_str(), "u1");

        let undo_entries: Vec<JournalEntry> = journal
            .snapshot()
            .into_iter()
            .filter(|e| e.kind == EntryKind::Undo)
            .collect();
        assert_eq!(undo_entries.len(), 3);
        assert!(undo_entries.iter().all(|e| e.session_id.as_str() == "u1"));
        assert_eq!(undo_entries[0].tool_name, "C");
    }

    #[tokio::test]
    async fn test_undo_continues_past_failures() {
        let runner = Arc::new(RecordingRunner::with_outcomes([
            completed(0, None),
            completed(1, Some(r#"{"success": false, "error": "backup missing"}"#)),
            completed(0, None),
        ]));
        let uc = UndoSessionUseCase::new(executor(runner.clone()), seeded());

        let report = uc
            .execute(
                UndoInput {
                    session: Some("s1".parse().unwrap()),
                    dry_run: false,
                },
                &NoStepProgress,
            )
            .await
            .unwrap();

        assert_eq!(runner.bodies().len(), 3);
        assert_eq!(report.steps[1].outcome, StepOutcome::Failed);
        assert_eq!(report.steps[2].outcome, StepOutcome::Succeeded);
        assert_eq!(report.failures(), 1);
        assert_eq!(report.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_undo_defaults_to_latest_action_session() {
        let runner = Arc::new(RecordingRunner::default());
        let journal = seeded();
        journal.append(&action("s2", "D", Some("undo D"))).unwrap();
        let uc = UndoSessionUseCase::new(executor(runner.clone()), journal.clone());

        let report = uc.execute(UndoInput::default(), &NoStepProgress).await.unwrap();
        assert_eq!(report.target_session.as_str(), "s2");
        assert_eq!(runner.bodies(), vec!["undo D"]);

        // s2 is reversed now, so the next default undo moves on to s1
        let uc = UndoSessionUseCase::new(executor(runner.clone()), journal.clone());
        let report = uc.execute(UndoInput::default(), &NoStepProgress).await.unwrap();
        assert_eq!(report.target_session.as_str(), "s1");
        assert_eq!(runner.bodies(), vec!["undo D", "undo C", "undo B", "undo A"]);

        // Every session is reversed; a repeat needs an explicit session
        let uc = UndoSessionUseCase::new(executor(runner.clone()), journal.clone());
        assert!(matches!(
            uc.execute(UndoInput::default(), &NoStepProgress).await,
            Err(UndoError::NothingToUndo)
        ));
        assert_eq!(runner.bodies().len(), 4);
    }

    #[tokio::test]
    async fn test_explicit_session_can_be_undone_again() {
        let runner = Arc::new(RecordingRunner::default());
        let journal = seeded();
        let input = || UndoInput {
            session: Some("s1".parse().unwrap()),
            dry_run: false,
        };

        let uc = UndoSessionUseCase::new(executor(runner.clone()), journal.clone());
        uc.execute(input(), &NoStepProgress).await.unwrap();
        let uc = UndoSessionUseCase::new(executor(runner.clone()), journal.clone());
        let report = uc.execute(input(), &NoStepProgress).await.unwrap();

        assert_eq!(report.steps.len(), 3);
        assert_eq!(runner.bodies().len(), 6);
        assert!(
            journal
                .snapshot()
                .iter()
                .filter(|e| e.kind == EntryKind::Undo)
                .all(|e| e.reverses.as_ref().map(SessionId::as_str) == Some("s1"))
        );
    }

    #[tokio::test]
    async fn test_dry_undo_lists_without_running() {
        let runner = Arc::new(RecordingRunner::default());
        let journal = seeded();
        let uc = UndoSessionUseCase::new(executor(runner.clone()), journal.clone());

        let report = uc
            .execute(
                UndoInput {
                    session: Some("s1".parse().unwrap()),
                    dry_run: true,
                },
                &NoStepProgress,
            )
            .await
            .unwrap();

        let scripts: Vec<&str> = report.steps.iter().map(|s| s.script.as_str()).collect();
        assert_eq!(scripts, vec!["undo C", "undo B", "undo A"]);
        assert!(report.steps.iter().all(|s| s.outcome == StepOutcome::Planned));
        assert!(report.undo_session.is_none());
        assert!(runner.bodies().is_empty());
        assert_eq!(journal.snapshot().len(), 4);
    }

    #[tokio::test]
    async fn test_undo_errors() {
        let runner = Arc::new(RecordingRunner::default());
        let empty = Arc::new(MemoryJournal::default());
        let uc = UndoSessionUseCase::new(executor(runner.clone()), empty);
        assert!(matches!(
            uc.execute(UndoInput::default(), &NoStepProgress).await,
            Err(UndoError::NothingToUndo)
        ));

        let uc = UndoSessionUseCase::new(executor(runner), seeded());
        let err = uc
            .execute(
                UndoInput {
                    session: Some("missing".parse().unwrap()),
                    dry_run: false,
                },
                &NoStepProgress,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, UndoError::UnknownSession(_)));
    }
}
