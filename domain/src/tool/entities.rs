//! Tool domain entities

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// How a tool's forward action reaches the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// The capability generates a forward script (and optionally an undo script)
    Structured,
    /// The capability passes an operator-supplied command line through the policy classifier
    RawCommand,
}

impl ToolKind {
    pub fn as_str(&self) -> &str {
        match self {
            ToolKind::Structured => "structured",
            ToolKind::RawCommand => "raw_command",
        }
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Declared type of a tool parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "values")]
pub enum ParamType {
    String,
    Integer,
    Boolean,
    /// A string restricted to one of the listed values (compared case-insensitively)
    OneOf(Vec<String>),
}

impl ParamType {
    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ParamType::OneOf(values.into_iter().map(Into::into).collect())
    }

    /// Check whether a JSON value satisfies this type
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::OneOf(allowed) => value
                .as_str()
                .is_some_and(|s| allowed.iter().any(|a| a.eq_ignore_ascii_case(s))),
        }
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamType::String => write!(f, "string"),
            ParamType::Integer => write!(f, "integer"),
            ParamType::Boolean => write!(f, "boolean"),
            ParamType::OneOf(values) => write!(f, "one of [{}]", values.join(", ")),
        }
    }
}

/// Parameter specification for a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    /// Parameter name
    pub name: String,
    /// Parameter description
    pub description: String,
    /// Whether this parameter is required
    pub required: bool,
    /// Declared value type
    pub param_type: ParamType,
}

impl ToolParameter {
    pub fn new(name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required,
            param_type: ParamType::String,
        }
    }

    pub fn with_type(mut self, param_type: ParamType) -> Self {
        self.param_type = param_type;
        self
    }
}

/// Description of a capability: its name, argument schema and requirements.
///
/// Constructed once at startup; the catalog never mutates a descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique name of the tool (case-insensitive key)
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Whether the forward action needs an elevated (admin/root) process
    pub requires_elevated_privilege: bool,
    /// Structured script generator or raw command pass-through
    pub kind: ToolKind,
    /// Whether the capability produces an undo script.
    /// `false` documents a mutating action as non-reversible.
    pub reversible: bool,
    /// Argument schema
    pub parameters: Vec<ToolParameter>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            requires_elevated_privilege: false,
            kind: ToolKind::Structured,
            reversible: false,
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, param: ToolParameter) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn elevated(mut self) -> Self {
        self.requires_elevated_privilege = true;
        self
    }

    pub fn reversible(mut self) -> Self {
        self.reversible = true;
        self
    }

    pub fn raw_command(mut self) -> Self {
        self.kind = ToolKind::RawCommand;
        self
    }

    pub fn is_raw_command(&self) -> bool {
        self.kind == ToolKind::RawCommand
    }

    pub fn parameter(&self, name: &str) -> Option<&ToolParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// A proposed call to a tool, as produced by a planner.
///
/// Arguments are untyped and untrusted until validated against the live catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the tool to call
    #[serde(alias = "name")]
    pub tool_name: String,
    /// Arguments passed to the tool
    #[serde(default, alias = "args")]
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments: Value::Object(Map::new()),
        }
    }

    pub fn with_arguments(mut self, arguments: Value) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        if !self.arguments.is_object() {
            self.arguments = Value::Object(Map::new());
        }
        if let Value::Object(map) = &mut self.arguments {
            map.insert(key.into(), value.into());
        }
        self
    }

    /// Get an argument by name
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.arguments.as_object().and_then(|m| m.get(key))
    }

    /// Get a string argument
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.as_str())
    }

    /// Get a required string argument or return an error message
    pub fn require_string(&self, key: &str) -> Result<&str, String> {
        self.get_string(key)
            .ok_or_else(|| format!("Missing required argument: {}", key))
    }

    /// Get an optional bool argument
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.as_bool())
    }
}
