//! Domain layer for mender
//!
//! This crate contains the core types and pure logic of the remediation
//! engine. It has no dependencies on infrastructure or presentation concerns:
//! nothing here spawns a process, reads the environment or touches a file.
//!
//! # Core Concepts
//!
//! ## Capabilities
//!
//! A capability is a named unit of remediation logic registered in an
//! immutable [`ToolCatalog`]. Given validated arguments it produces a forward
//! script and, when the action can be reversed, an undo script.
//!
//! ## Policy
//!
//! Raw command lines are gated by the [`PolicyClassifier`]: a default-deny
//! classifier with a hard-deny ceiling that no [`PolicyMode`] can lift.
//!
//! ## Journal
//!
//! Every attempted action becomes exactly one [`JournalEntry`]. Entries of
//! one [`SessionId`] are replayed newest-first by undo.

pub mod core;
pub mod journal;
pub mod policy;
pub mod tool;
pub mod util;

// Re-export commonly used types
pub use core::error::DomainError;
pub use journal::{EntryKind, JournalEntry, SessionId, StepOutcome};
pub use policy::{PolicyClassifier, PolicyDecision, PolicyMode, PolicyPatterns, PolicyRule, Verdict};
pub use tool::{
    ArgumentValidator, Capability, ExecutionResult, ParamType, SchemaValidator, ToolCall,
    ToolCatalog, ToolDescriptor, ToolKind, ToolParameter, ValidationFailed, ValidationIssue,
};
