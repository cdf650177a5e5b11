//! Application layer for mender
//!
//! This crate contains use cases, port definitions, and engine configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{EngineConfig, ExecutionParams};
pub use ports::{
    journal::{AuditJournal, JournalError},
    planner::{Planner, PlannerError},
    process_runner::{ExecutionMode, ProcessOutcome, ProcessOutput, ProcessRequest, ProcessRunner},
    step_progress::{NoStepProgress, StepProgressNotifier},
};
pub use use_cases::execute_action::{ActionExecutor, BLOCKED_MARKER, StepExecution};
pub use use_cases::read_journal::{JournalQuery, ReadJournalUseCase};
pub use use_cases::run_plan::{
    HaltReason, RunMode, RunPlanError, RunPlanInput, RunPlanUseCase, RunReport, StepReport,
};
pub use use_cases::undo_session::{
    UndoError, UndoInput, UndoReport, UndoSessionUseCase, UndoStepReport,
};
