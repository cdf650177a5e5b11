//! Configuration file loading for mender
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. Environment variables `MENDER_<SECTION>__<KEY>`
//! 2. `--config <path>` specified file
//! 3. Project root: `./mender.toml` or `./.mender.toml`
//! 4. Global: `<config_dir>/mender/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileConfig, FileExecutionConfig, FileJournalConfig, FileKeywordRule,
    FileLoggingConfig, FilePlannerConfig, FilePolicyConfig,
};
pub use loader::{ConfigLoader, ConfigSource, ENV_PREFIX};
