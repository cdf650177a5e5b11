//! Execute Action use case.
//!
//! Turns one catalog capability plus one untrusted [`ToolCall`] into a
//! [`StepExecution`]: validate, plan, check elevation, classify raw commands,
//! then run the forward script through the bounded [`ProcessRunner`].
//!
//! Nothing in here journals. The caller decides what gets written, so the
//! same executor serves dry runs, real runs and undo replays.

use crate::config::EngineConfig;
use crate::ports::process_runner::{ExecutionMode, ProcessOutcome, ProcessRequest, ProcessRunner};
use mender_domain::{
    Capability, ExecutionResult, PolicyClassifier, PolicyDecision, StepOutcome, ToolCall,
};
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Output recorded for a command the policy refused
pub const BLOCKED_MARKER: &str = "[blocked by policy]";

/// Result of processing one step
#[derive(Debug, Clone, PartialEq)]
pub struct StepExecution {
    pub outcome: StepOutcome,
    pub result: ExecutionResult,
    /// Classification, for raw-command capabilities only
    pub policy: Option<PolicyDecision>,
    /// Whether a process was actually started
    pub spawned: bool,
}

impl StepExecution {
    fn settled(outcome: StepOutcome, result: ExecutionResult, policy: Option<PolicyDecision>) -> Self {
        Self {
            outcome,
            result,
            policy,
            spawned: false,
        }
    }

    /// Undo script worth journaling: only once the forward script has run
    pub fn journal_undo_script(&self) -> Option<String> {
        if self.spawned {
            self.result.undo().map(str::to_string)
        } else {
            None
        }
    }
}

/// A step that passed every gate and is ready to spawn
struct ReadyStep {
    planned: ExecutionResult,
    body: String,
    mode: ExecutionMode,
    policy: Option<PolicyDecision>,
    /// Needs administrative rights the engine does not hold (dry passes only)
    elevation_pending: bool,
}

enum Prepared {
    Ready(ReadyStep),
    Settled(StepExecution),
}

/// Gatekeeper between a capability and the process runner
pub struct ActionExecutor<R: ProcessRunner> {
    runner: Arc<R>,
    classifier: Arc<PolicyClassifier>,
    config: EngineConfig,
    elevated: bool,
}

impl<R: ProcessRunner> ActionExecutor<R> {
    pub fn new(runner: Arc<R>, classifier: Arc<PolicyClassifier>, config: EngineConfig) -> Self {
        Self {
            runner,
            classifier,
            config,
            elevated: false,
        }
    }

    /// Record whether the engine runs with administrative rights
    pub fn with_elevated(mut self, elevated: bool) -> Self {
        self.elevated = elevated;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Everything up to, but not including, the spawn.
    ///
    /// A dry pass notes a missing elevation instead of failing on it.
    fn prepare(&self, capability: &dyn Capability, call: &ToolCall, dry: bool) -> Prepared {
        let descriptor = capability.describe();

        if let Err(failed) = capability.validate(&call.arguments) {
            warn!("Rejected arguments for {}: {}", descriptor.name, failed);
            let issues = serde_json::to_value(&failed.issues).unwrap_or(Value::Null);
            return Prepared::Settled(StepExecution::settled(
                StepOutcome::ValidationFailed,
                ExecutionResult::failure(failed.to_string()).with_data(json!({ "issues": issues })),
                None,
            ));
        }

        let planned = capability.execute(call);
        if !planned.success {
            return Prepared::Settled(StepExecution::settled(StepOutcome::Failed, planned, None));
        }

        let Some(body) = planned.forward().map(str::to_string) else {
            debug!("{} produced no script; nothing to run", descriptor.name);
            return Prepared::Settled(StepExecution::settled(StepOutcome::Succeeded, planned, None));
        };

        let elevation_pending = capability.requires_elevation(call)
            && !self.elevated
            && !self.config.execution.skip_elevation_check;
        if elevation_pending && !dry {
            warn!("{} requires elevated privilege; not elevated", descriptor.name);
            let result = planned.into_failure(format!(
                "'{}' requires elevated privilege; re-run as administrator or set execution.skip_elevation_check",
                descriptor.name
            ));
            return Prepared::Settled(StepExecution::settled(StepOutcome::Failed, result, None));
        }

        if !descriptor.is_raw_command() {
            return Prepared::Ready(ReadyStep {
                planned,
                body,
                mode: ExecutionMode::Script,
                policy: None,
                elevation_pending,
            });
        }

        let decision = self.classifier.classify(&body, &self.config.policy);
        if !decision.is_allowed() {
            info!(
                "Policy denied command for {} ({}): {}",
                descriptor.name, decision.rule, body
            );
            let result = ExecutionResult {
                success: false,
                error: Some(format!("{} {}", BLOCKED_MARKER, decision.rule)),
                data: Some(json!({
                    "output": BLOCKED_MARKER,
                    "rule": decision.rule,
                    "pattern": decision.pattern,
                })),
                forward_script: planned.forward_script,
                undo_script: None,
            };
            return Prepared::Settled(StepExecution::settled(
                StepOutcome::PolicyRejected,
                result,
                Some(decision),
            ));
        }

        debug!("Policy allowed command for {} ({})", descriptor.name, decision.rule);
        Prepared::Ready(ReadyStep {
            planned,
            body,
            mode: ExecutionMode::RawCommand,
            policy: Some(decision),
            elevation_pending,
        })
    }

    /// Run every gate but never spawn
    pub fn dry_run(&self, capability: &dyn Capability, call: &ToolCall) -> StepExecution {
        match self.prepare(capability, call, true) {
            Prepared::Ready(step) => {
                let mut planned = step.planned;
                if step.elevation_pending {
                    info!("{} will need elevated privilege when executed", capability.describe().name);
                    planned = planned.with_data(json!({ "requires_elevation": true }));
                }
                StepExecution::settled(StepOutcome::Planned, planned, step.policy)
            }
            Prepared::Settled(done) => done,
        }
    }

    /// Run every gate, then the forward script
    pub async fn execute(&self, capability: &dyn Capability, call: &ToolCall) -> StepExecution {
        let step = match self.prepare(capability, call, false) {
            Prepared::Ready(step) => step,
            Prepared::Settled(done) => return done,
        };

        let label = capability.describe().name.clone();
        let request = ProcessRequest {
            label,
            body: step.body,
            mode: step.mode,
            timeout: self.config.execution.command_timeout,
        };
        let outcome = self.runner.run(&request).await;
        let spawned = outcome.spawned();
        let (outcome, result) = assess(step.planned, step.mode, outcome);

        StepExecution {
            outcome,
            result,
            policy: step.policy,
            spawned,
        }
    }

    /// Run a journaled undo script under the same bounds as forward scripts
    pub async fn run_undo_script(
        &self,
        tool_name: &str,
        script: &str,
    ) -> (StepOutcome, ExecutionResult) {
        let request = ProcessRequest::script(
            format!("undo:{}", tool_name),
            script,
            self.config.execution.command_timeout,
        );
        let outcome = self.runner.run(&request).await;
        assess(ExecutionResult::planned(script), ExecutionMode::Script, outcome)
    }
}

/// Parse the capability's verdict line, if it wrote one
fn authoritative_payload(line: Option<&str>) -> Option<Map<String, Value>> {
    let line = line?.trim();
    if !line.starts_with('{') {
        return None;
    }
    match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(map)) if map.get("success").is_some_and(Value::is_boolean) => Some(map),
        _ => None,
    }
}

/// Fold a process outcome into the capability's planned result.
///
/// Exit codes and stderr are recorded but never decide success on their
/// own; a JSON verdict on the last stdout line does.
pub fn assess(
    planned: ExecutionResult,
    mode: ExecutionMode,
    outcome: ProcessOutcome,
) -> (StepOutcome, ExecutionResult) {
    match outcome {
        ProcessOutcome::Completed(out) => {
            let mut data = json!({
                "mode": mode.as_str(),
                "exit_code": out.exit_code,
                "output": out.output,
                "truncated": out.truncated,
                "duration_ms": out.duration_ms,
            });

            let mut result = planned;
            if let Some(payload) = authoritative_payload(out.last_stdout_line.as_deref()) {
                result.success = payload.get("success").and_then(Value::as_bool).unwrap_or(false);
                result.error = payload
                    .get("error")
                    .and_then(Value::as_str)
                    .filter(|e| !e.trim().is_empty())
                    .map(str::to_string);
                if !result.success && result.error.is_none() {
                    result.error = Some("capability reported failure".to_string());
                }
                data["payload"] = Value::Object(payload);
            }
            result.data = Some(data);

            let outcome = if result.success {
                StepOutcome::Succeeded
            } else {
                StepOutcome::Failed
            };
            (outcome, result)
        }
        ProcessOutcome::TimedOut {
            timeout,
            output,
            duration_ms,
        } => {
            let result = planned
                .into_failure(format!("timed out after {}s; process tree killed", timeout.as_secs_f64()))
                .with_data(json!({
                    "mode": mode.as_str(),
                    "output": output,
                    "timed_out": true,
                    "timeout_ms": timeout.as_millis() as u64,
                    "duration_ms": duration_ms,
                }));
            (StepOutcome::TimedOut, result)
        }
        ProcessOutcome::SpawnFailed(error) => {
            let result = planned.into_failure(format!("failed to start process: {}", error));
            (StepOutcome::Failed, result)
        }
        ProcessOutcome::WaitFailed(error) => {
            let result = planned
                .into_failure(format!("lost track of the process: {}; process tree killed", error))
                .with_data(json!({ "mode": mode.as_str() }));
            (StepOutcome::Failed, result)
        }
    }
}
