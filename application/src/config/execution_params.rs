//! Execution parameters for the action executor.
//!
//! [`ExecutionParams`] groups the static knobs that bound every spawned
//! process. They are resolved once from configuration and threaded through
//! construction; nothing reads them from globals.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default wall-clock limit per process
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

/// Default cap on captured stdout + stderr
pub const DEFAULT_OUTPUT_LIMIT: usize = 64 * 1024;

/// Process execution parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionParams {
    /// Deadline for each forward or undo process.
    pub command_timeout: Duration,
    /// Byte ceiling for captured output.
    pub output_limit: usize,
    /// Interpreter program and leading arguments; the script is appended.
    /// Empty means the platform default.
    pub interpreter: Vec<String>,
    /// Run elevated capabilities even when the engine is not elevated.
    pub skip_elevation_check: bool,
}

impl Default for ExecutionParams {
    fn default() -> Self {
        Self {
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            output_limit: DEFAULT_OUTPUT_LIMIT,
            interpreter: Vec::new(),
            skip_elevation_check: false,
        }
    }
}

impl ExecutionParams {
    // ==================== Builder Methods ====================

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn with_output_limit(mut self, bytes: usize) -> Self {
        self.output_limit = bytes;
        self
    }

    pub fn with_interpreter<I, S>(mut self, interpreter: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interpreter = interpreter.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_skip_elevation_check(mut self, skip: bool) -> Self {
        self.skip_elevation_check = skip;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = ExecutionParams::default();
        assert_eq!(params.command_timeout, Duration::from_secs(60));
        assert_eq!(params.output_limit, 65536);
        assert!(params.interpreter.is_empty());
        assert!(!params.skip_elevation_check);
    }

    #[test]
    fn test_builder() {
        let params = ExecutionParams::default()
            .with_command_timeout(Duration::from_secs(5))
            .with_output_limit(1024)
            .with_interpreter(["bash", "-c"])
            .with_skip_elevation_check(true);

        assert_eq!(params.command_timeout, Duration::from_secs(5));
        assert_eq!(params.output_limit, 1024);
        assert_eq!(params.interpreter, vec!["bash".to_string(), "-c".to_string()]);
        assert!(params.skip_elevation_check);
    }
}
