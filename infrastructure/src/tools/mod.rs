//! Built-in capabilities
//!
//! The remediation payloads are PowerShell text: inert until the engine
//! hands them to the process runner. Every structured script ends by
//! printing a one-line JSON verdict, which the engine treats as
//! authoritative.
//!
//! | Tool | Kind | Reversible | Elevated |
//! |------|------|------------|----------|
//! | `run_command` | raw command | no | no |
//! | `DisableOutlookAddins` | structured | yes | no |
//! | `FlushDnsCache` | structured | no | no |
//! | `RestartService` | structured | no | yes |
//! | `SetServiceStartupType` | structured | yes | yes |

pub mod command;
pub mod network;
pub mod outlook;
pub mod script;
pub mod service;

pub use command::RunCommand;
pub use network::FlushDnsCache;
pub use outlook::DisableOutlookAddins;
pub use service::{RestartService, SetServiceStartupType};

use mender_domain::{Capability, DomainError, ToolCall, ToolCatalog};
use std::sync::Arc;

/// Every built-in capability, in display order
pub fn builtin_capabilities() -> Vec<Arc<dyn Capability>> {
    vec![
        Arc::new(RunCommand::new()),
        Arc::new(DisableOutlookAddins::new()),
        Arc::new(FlushDnsCache::new()),
        Arc::new(RestartService::new()),
        Arc::new(SetServiceStartupType::new()),
    ]
}

/// Create the closed catalog of built-in capabilities
pub fn builtin_catalog() -> Result<ToolCatalog, DomainError> {
    ToolCatalog::new(builtin_capabilities())
}

/// Canonical spelling of a `OneOf` argument, matched case-insensitively
pub(crate) fn canonical_choice<'a>(
    call: &ToolCall,
    name: &str,
    allowed: &[&'a str],
) -> Option<&'a str> {
    let value = call.get_string(name)?.trim();
    allowed
        .iter()
        .copied()
        .find(|choice| choice.eq_ignore_ascii_case(value))
}
