//! Engine configuration handed to the use cases.

use super::execution_params::ExecutionParams;
use mender_domain::PolicyMode;
use serde::{Deserialize, Serialize};

/// Everything the engine needs to know about the operator's choices.
///
/// Built by the infrastructure config loader (file, env, CLI flags) and
/// passed explicitly to [`ActionExecutor`](crate::use_cases::execute_action::ActionExecutor).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub policy: PolicyMode,
    pub execution: ExecutionParams,
}

impl EngineConfig {
    pub fn new(policy: PolicyMode, execution: ExecutionParams) -> Self {
        Self { policy, execution }
    }

    pub fn with_policy(mut self, policy: PolicyMode) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_execution(mut self, execution: ExecutionParams) -> Self {
        self.execution = execution;
        self
    }
}
