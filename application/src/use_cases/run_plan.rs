//! Run Plan use case.
//!
//! Asks the planner for tool calls, then walks them strictly in order:
//! catalog lookup, gated execution (or dry run), journal append.
//!
//! Step failures are values and never stop the walk. Two conditions do:
//! an unknown tool (the rest of the plan is built on a wrong premise) and a
//! failed journal write (the run can no longer be audited).

use crate::ports::journal::{AuditJournal, JournalError};
use crate::ports::planner::{Planner, PlannerError};
use crate::ports::process_runner::ProcessRunner;
use crate::ports::step_progress::StepProgressNotifier;
use crate::use_cases::execute_action::ActionExecutor;
use mender_domain::{
    ExecutionResult, JournalEntry, PolicyDecision, SessionId, StepOutcome, ToolCall,
    ToolCatalog, ToolDescriptor,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Whether steps run or are only shown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Dry,
    Execute,
}

impl RunMode {
    pub fn as_str(&self) -> &str {
        match self {
            RunMode::Dry => "dry",
            RunMode::Execute => "execute",
        }
    }
}

impl std::str::FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dry" | "dry-run" | "dryrun" => Ok(RunMode::Dry),
            "execute" | "exec" | "run" => Ok(RunMode::Execute),
            other => Err(format!("unknown run mode '{}' (expected dry or execute)", other)),
        }
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input for the RunPlan use case
#[derive(Debug, Clone)]
pub struct RunPlanInput {
    /// Free-text issue description handed to the planner
    pub goal: String,
    pub mode: RunMode,
}

impl RunPlanInput {
    pub fn new(goal: impl Into<String>, mode: RunMode) -> Self {
        Self {
            goal: goal.into(),
            mode,
        }
    }
}

/// Why the walk stopped before the end of the plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum HaltReason {
    ToolNotFound { index: usize, name: String },
}

impl std::fmt::Display for HaltReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HaltReason::ToolNotFound { index, name } => {
                write!(f, "step {} names unknown tool '{}'; plan aborted", index + 1, name)
            }
        }
    }
}

/// One processed step
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub index: usize,
    /// Canonical catalog name
    pub tool_name: String,
    pub arguments: Value,
    pub outcome: StepOutcome,
    pub result: ExecutionResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<PolicyDecision>,
}

/// Output of the RunPlan use case
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub session_id: SessionId,
    pub mode: RunMode,
    pub goal: String,
    pub steps: Vec<StepReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub halted: Option<HaltReason>,
}

impl RunReport {
    pub fn count(&self, outcome: StepOutcome) -> usize {
        self.steps.iter().filter(|s| s.outcome == outcome).count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.halted.is_none() && self.steps.iter().all(|s| s.outcome.is_success())
    }

    /// 0 when everything succeeded, 1 on a failed step, 2 when aborted
    pub fn exit_code(&self) -> i32 {
        if self.halted.is_some() {
            2
        } else if self.all_succeeded() {
            0
        } else {
            1
        }
    }
}

/// Errors that abort a run
#[derive(Error, Debug)]
pub enum RunPlanError {
    #[error("Planner failed: {0}")]
    Planner(#[from] PlannerError),

    #[error("Journal write failed; run aborted: {0}")]
    Journal(#[from] JournalError),
}

/// Use case for running a proposed plan
pub struct RunPlanUseCase<R: ProcessRunner, J: AuditJournal> {
    planner: Arc<dyn Planner>,
    catalog: Arc<ToolCatalog>,
    executor: Arc<ActionExecutor<R>>,
    journal: Arc<J>,
    session: SessionId,
}

impl<R: ProcessRunner, J: AuditJournal> RunPlanUseCase<R, J> {
    pub fn new(
        planner: Arc<dyn Planner>,
        catalog: Arc<ToolCatalog>,
        executor: Arc<ActionExecutor<R>>,
        journal: Arc<J>,
    ) -> Self {
        Self {
            planner,
            catalog,
            executor,
            journal,
            session: SessionId::generate(),
        }
    }

    pub fn with_session(mut self, session: SessionId) -> Self {
        self.session = session;
        self
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session
    }

    /// Plan, then run
    pub async fn execute(
        &self,
        input: RunPlanInput,
        progress: &dyn StepProgressNotifier,
    ) -> Result<RunReport, RunPlanError> {
        let descriptors: Vec<ToolDescriptor> = self.catalog.descriptors().cloned().collect();
        let calls = self.planner.plan(&input.goal, &descriptors).await?;
        info!(
            "Planner proposed {} step(s) for session {} ({})",
            calls.len(),
            self.session,
            input.mode
        );

        let mut report = self.run_calls(calls, input.mode, progress).await?;
        report.goal = input.goal;
        Ok(report)
    }

    /// Run already-planned calls
    pub async fn run_calls(
        &self,
        calls: Vec<ToolCall>,
        mode: RunMode,
        progress: &dyn StepProgressNotifier,
    ) -> Result<RunReport, RunPlanError> {
        progress.on_plan_ready(calls.len());

        let mut steps = Vec::with_capacity(calls.len());
        let mut halted = None;

        for (index, call) in calls.into_iter().enumerate() {
            progress.on_step_start(index, &call);

            let capability = match self.catalog.lookup(&call.tool_name) {
                Ok(capability) => Arc::clone(capability),
                Err(e) => {
                    warn!("Aborting plan at step {}: {}", index + 1, e);
                    halted = Some(HaltReason::ToolNotFound {
                        index,
                        name: call.tool_name.clone(),
                    });
                    break;
                }
            };
            let tool_name = capability.describe().name.clone();

            let step = match mode {
                RunMode::Dry => self.executor.dry_run(capability.as_ref(), &call),
                RunMode::Execute => self.executor.execute(capability.as_ref(), &call).await,
            };

            if mode == RunMode::Execute {
                let entry = JournalEntry::action(
                    self.session.clone(),
                    tool_name.clone(),
                    call.arguments.clone(),
                    step.outcome,
                    step.result.clone(),
                )
                .with_undo_script(step.journal_undo_script());
                self.journal.append(&entry)?;
            }

            info!("Step {} {}: {}", index + 1, tool_name, step.outcome);
            progress.on_step_complete(index, &tool_name, step.outcome);

            steps.push(StepReport {
                index,
                tool_name,
                arguments: call.arguments,
                outcome: step.outcome,
                result: step.result,
                policy: step.policy,
            });
        }

        Ok(RunReport {
            session_id: self.session.clone(),
            mode,
            goal: String::new(),
            steps,
            halted,
        })
    }
}
