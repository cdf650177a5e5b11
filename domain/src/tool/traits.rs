//! Tool domain traits
//!
//! Pure contracts: argument validation and the capability interface.
//! Nothing here spawns processes or touches the file system; running the
//! scripts a capability produces is the job of the application layer.

use super::entities::{ToolCall, ToolDescriptor};
use super::value_objects::{ExecutionResult, ValidationFailed, ValidationIssue};
use serde_json::Value;

/// Validator for tool arguments
///
/// Validates untrusted arguments against a descriptor's declared schema
/// without any I/O.
pub trait ArgumentValidator {
    /// Validate raw arguments against a descriptor
    fn validate(&self, descriptor: &ToolDescriptor, arguments: &Value)
    -> Result<(), ValidationFailed>;
}

/// Default implementation of ArgumentValidator.
///
/// Collects every violation instead of stopping at the first one.
#[derive(Debug, Clone, Default)]
pub struct SchemaValidator;

impl ArgumentValidator for SchemaValidator {
    fn validate(
        &self,
        descriptor: &ToolDescriptor,
        arguments: &Value,
    ) -> Result<(), ValidationFailed> {
        let fail = |issues: Vec<ValidationIssue>| ValidationFailed {
            tool_name: descriptor.name.clone(),
            issues,
        };

        let empty = serde_json::Map::new();
        let args = match arguments {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => {
                return Err(fail(vec![ValidationIssue::new(
                    None,
                    format!("arguments must be an object, got {}", json_kind(other)),
                )]));
            }
        };

        let mut issues = Vec::new();

        // Required parameters must be present and non-null
        for param in &descriptor.parameters {
            match args.get(&param.name) {
                None | Some(Value::Null) if param.required => {
                    issues.push(ValidationIssue::new(
                        Some(&param.name),
                        "required parameter is missing",
                    ));
                }
                Some(value) if !value.is_null() && !param.param_type.accepts(value) => {
                    issues.push(ValidationIssue::new(
                        Some(&param.name),
                        format!("expected {}, got {}", param.param_type, json_kind(value)),
                    ));
                }
                _ => {}
            }
        }

        // Every provided argument must be a declared parameter
        let mut unknown: Vec<&String> = args
            .keys()
            .filter(|k| descriptor.parameter(k).is_none())
            .collect();
        unknown.sort();
        for name in unknown {
            issues.push(ValidationIssue::new(Some(name), "unknown parameter"));
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(fail(issues))
        }
    }
}

fn json_kind(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "boolean".to_string(),
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer".to_string(),
        Value::Number(_) => "number".to_string(),
        Value::String(s) => format!("string \"{}\"", crate::util::truncate_str(s, 40)),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}

/// A named unit of remediation logic.
///
/// Implementations are registered once in a [`ToolCatalog`](super::catalog::ToolCatalog)
/// and never mutated afterwards. `execute` only *plans*: it returns the
/// forward script (and, for reversible capabilities, the undo script) as
/// text. Running the script is the executor's job.
pub trait Capability: Send + Sync {
    /// Static description and argument schema
    fn describe(&self) -> &ToolDescriptor;

    /// Validate arguments before anything else happens
    fn validate(&self, arguments: &Value) -> Result<(), ValidationFailed> {
        SchemaValidator.validate(self.describe(), arguments)
    }

    /// Whether this particular call needs an elevated engine
    fn requires_elevation(&self, _call: &ToolCall) -> bool {
        self.describe().requires_elevated_privilege
    }

    /// Produce the scripts for an already-validated call
    fn execute(&self, call: &ToolCall) -> ExecutionResult;
}
