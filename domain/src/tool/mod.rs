//! Tool domain module
//!
//! Defines the **capability system**: how a proposed remediation step is
//! described, validated and turned into scripts, independent of how those
//! scripts are eventually run.
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌─────────────────┐
//! │ ToolCatalog  │───▶│ ToolCall     │───▶│ ExecutionResult │
//! │ (registry)   │    │ (untrusted)  │    │ (fwd/undo)      │
//! └──────┬───────┘    └──────────────┘    └─────────────────┘
//!        │
//!        └─ "restartservice" → Arc<dyn Capability>
//! ```
//!
//! # Key Types
//!
//! - [`ToolCatalog`]: closed registry, case-insensitive lookup
//! - [`ToolDescriptor`]: name, schema, elevation and reversibility
//! - [`ToolCall`]: a planner's proposal, never trusted
//! - [`Capability`]: `describe()`, `validate()`, `execute()`
//! - [`SchemaValidator`]: pure argument validation
//! - [`ExecutionResult`]: forward/undo scripts and the final verdict

pub mod catalog;
pub mod entities;
pub mod traits;
pub mod value_objects;

pub use catalog::ToolCatalog;
pub use entities::{ParamType, ToolCall, ToolDescriptor, ToolKind, ToolParameter};
pub use traits::{ArgumentValidator, Capability, SchemaValidator};
pub use value_objects::{ExecutionResult, ValidationFailed, ValidationIssue};
