//! Application-level configuration.
//!
//! - [`ExecutionParams`]: process bounds (timeout, output ceiling, interpreter)
//! - [`EngineConfig`]: policy mode plus execution parameters

pub mod engine_config;
pub mod execution_params;

pub use engine_config::EngineConfig;
pub use execution_params::{DEFAULT_COMMAND_TIMEOUT, DEFAULT_OUTPUT_LIMIT, ExecutionParams};
