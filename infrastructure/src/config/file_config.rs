//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are converted into the application's [`EngineConfig`] and the
//! domain's [`PolicyPatterns`] before anything uses them.

use crate::planner::KeywordRule;
use mender_application::{EngineConfig, ExecutionParams};
use mender_domain::{DomainError, PolicyMode, PolicyPatterns, ToolCall};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Configuration validation errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("execution.timeout_seconds cannot be 0")]
    InvalidTimeout,

    #[error("execution.max_output_bytes cannot be 0")]
    InvalidOutputLimit,

    #[error("execution.interpreter must start with a program name")]
    EmptyInterpreter,

    #[error("planner.rules[{index}]: {reason}")]
    InvalidRule { index: usize, reason: String },
}

/// `[policy]`: operator mode and extra patterns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePolicyConfig {
    pub allow_maintenance: bool,
    pub allow_kill: bool,
    pub allow_dangerous: bool,
    /// Extra read-only patterns
    pub extra_triage: Vec<String>,
    pub extra_maintenance: Vec<String>,
    pub extra_kill: Vec<String>,
    /// Extra deny patterns (deny tables can only grow)
    pub extra_deny: Vec<String>,
    pub extra_hard_deny: Vec<String>,
}

/// `[execution]`: process bounds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileExecutionConfig {
    pub timeout_seconds: u64,
    pub max_output_bytes: usize,
    /// Interpreter program followed by its arguments; empty = platform default
    pub interpreter: Vec<String>,
    pub skip_elevation_check: bool,
}

impl Default for FileExecutionConfig {
    fn default() -> Self {
        let params = ExecutionParams::default();
        Self {
            timeout_seconds: params.command_timeout.as_secs(),
            max_output_bytes: params.output_limit,
            interpreter: Vec::new(),
            skip_elevation_check: false,
        }
    }
}

/// `[journal]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileJournalConfig {
    /// Journal directory; `<data_local_dir>/mender/journal` when unset
    pub dir: Option<PathBuf>,
}

/// One `[[planner.rules]]` entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileKeywordRule {
    /// Whole-word keywords (any of them fires the rule)
    pub keywords: Vec<String>,
    /// Regular expression, used instead of `keywords` when set
    pub pattern: Option<String>,
    pub tool: String,
    pub arguments: Map<String, Value>,
}

impl FileKeywordRule {
    fn check(&self) -> Result<(), String> {
        if self.tool.trim().is_empty() {
            return Err("tool cannot be empty".to_string());
        }
        let has_keywords = self.keywords.iter().any(|k| !k.trim().is_empty());
        if self.pattern.is_none() && !has_keywords {
            return Err("needs keywords or a pattern".to_string());
        }
        Ok(())
    }

    pub fn to_rule(&self) -> Result<KeywordRule, DomainError> {
        let call = ToolCall::new(self.tool.trim()).with_arguments(Value::Object(self.arguments.clone()));
        match &self.pattern {
            Some(pattern) => KeywordRule::new(pattern, vec![call]),
            None => KeywordRule::keywords(&self.keywords, vec![call]),
        }
    }
}

/// `[planner]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePlannerConfig {
    /// Include the built-in keyword rules
    pub builtin_rules: bool,
    pub rules: Vec<FileKeywordRule>,
}

impl Default for FilePlannerConfig {
    fn default() -> Self {
        Self {
            builtin_rules: true,
            rules: Vec::new(),
        }
    }
}

/// `[logging]`: diagnostic log file (the audit journal is separate)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Also write logs to a daily rolling file
    pub file: bool,
    /// Log directory; `<data_local_dir>/mender/logs` when unset
    pub dir: Option<PathBuf>,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub policy: FilePolicyConfig,
    pub execution: FileExecutionConfig,
    pub journal: FileJournalConfig,
    pub planner: FilePlannerConfig,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.execution.timeout_seconds == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }
        if self.execution.max_output_bytes == 0 {
            return Err(ConfigValidationError::InvalidOutputLimit);
        }
        if let Some(program) = self.execution.interpreter.first()
            && program.trim().is_empty()
        {
            return Err(ConfigValidationError::EmptyInterpreter);
        }
        for (index, rule) in self.planner.rules.iter().enumerate() {
            rule.check()
                .map_err(|reason| ConfigValidationError::InvalidRule { index, reason })?;
        }
        Ok(())
    }

    pub fn policy_mode(&self) -> PolicyMode {
        PolicyMode::triage_only()
            .with_maintenance(self.policy.allow_maintenance)
            .with_kill(self.policy.allow_kill)
            .with_dangerous(self.policy.allow_dangerous)
    }

    /// Built-in tables plus the configured extras
    pub fn policy_patterns(&self) -> PolicyPatterns {
        let p = &self.policy;
        PolicyPatterns::builtin()
            .with_extra_hard_deny(p.extra_hard_deny.iter().cloned())
            .with_extra_deny(p.extra_deny.iter().cloned())
            .with_extra_triage(p.extra_triage.iter().cloned())
            .with_extra_maintenance(p.extra_maintenance.iter().cloned())
            .with_extra_kill(p.extra_kill.iter().cloned())
    }

    pub fn execution_params(&self) -> ExecutionParams {
        ExecutionParams::default()
            .with_command_timeout(Duration::from_secs(self.execution.timeout_seconds))
            .with_output_limit(self.execution.max_output_bytes)
            .with_interpreter(self.execution.interpreter.iter().cloned())
            .with_skip_elevation_check(self.execution.skip_elevation_check)
    }

    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig::new(self.policy_mode(), self.execution_params())
    }

    /// Configured keyword rules, compiled
    pub fn keyword_rules(&self) -> Result<Vec<KeywordRule>, DomainError> {
        self.planner.rules.iter().map(FileKeywordRule::to_rule).collect()
    }
}
