use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::error::{RegistryError, ToolError};

/// Primitive kind of a tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
}

impl ParamKind {
    fn matches(self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Integer => value.is_i64(),
            ParamKind::Number => value.is_number(),
            ParamKind::Boolean => value.is_boolean(),
            ParamKind::Object => value.is_object(),
            ParamKind::Array => value.is_array(),
        }
    }

    fn json_type(self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
            ParamKind::Number => "number",
            ParamKind::Boolean => "boolean",
            ParamKind::Object => "object",
            ParamKind::Array => "array",
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.json_type())
    }
}

/// What a tool hands back to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnKind {
    Nothing,
    Text,
    Boolean,
    Table,
}

impl fmt::Display for ReturnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReturnKind::Nothing => "none",
            ReturnKind::Text => "string",
            ReturnKind::Boolean => "boolean",
            ReturnKind::Table => "table",
        };
        f.write_str(s)
    }
}

/// A single named parameter of a tool
#[derive(Debug, Clone, Serialize)]
pub struct Parameter {
    pub name: String,
    pub kind: ParamKind,
    pub description: String,
    pub required: bool,
}

/// The contract a tool exposes to the reasoning loop.
///
/// The structured part (name, parameters, return kind) is what gets validated;
/// the prose part (descriptions) is handed to the model verbatim.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Vec<Parameter>,
    pub returns: ReturnKind,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub returns_description: String,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
            returns: ReturnKind::Nothing,
            returns_description: String::new(),
        }
    }

    /// Add a required parameter
    pub fn param(mut self, name: &str, kind: ParamKind, description: &str) -> Self {
        self.parameters.push(Parameter {
            name: name.to_string(),
            kind,
            description: description.to_string(),
            required: true,
        });
        self
    }

    /// Add an optional parameter
    pub fn optional_param(mut self, name: &str, kind: ParamKind, description: &str) -> Self {
        self.parameters.push(Parameter {
            name: name.to_string(),
            kind,
            description: description.to_string(),
            required: false,
        });
        self
    }

    pub fn returns(mut self, kind: ReturnKind, description: &str) -> Self {
        self.returns = kind;
        self.returns_description = description.to_string();
        self
    }

    /// Check the invariants a registry relies on.
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.description.trim().is_empty() {
            return Err(RegistryError::EmptyDescription(self.name.clone()));
        }

        for (i, param) in self.parameters.iter().enumerate() {
            let invalid = |message: String| RegistryError::InvalidParameter {
                tool: self.name.clone(),
                message,
            };
            if param.name.trim().is_empty() {
                return Err(invalid(format!("parameter #{} has no name", i + 1)));
            }
            if param.description.trim().is_empty() {
                return Err(invalid(format!("'{}' has no description", param.name)));
            }
            if self.parameters[..i].iter().any(|p| p.name == param.name) {
                return Err(invalid(format!("'{}' is declared twice", param.name)));
            }
        }

        Ok(())
    }

    /// JSON schema for the parameters, in the shape function-calling APIs expect.
    pub fn json_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.parameters {
            properties.insert(
                param.name.clone(),
                json!({
                    "type": param.kind.json_type(),
                    "description": param.description,
                }),
            );
        }

        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// One-line signature, e.g. `is_prime(n: integer) -> boolean`
    pub fn signature(&self) -> String {
        let params: Vec<String> = self
            .parameters
            .iter()
            .map(|p| {
                if p.required {
                    format!("{}: {}", p.name, p.kind)
                } else {
                    format!("{}?: {}", p.name, p.kind)
                }
            })
            .collect();
        format!("{}({}) -> {}", self.name, params.join(", "), self.returns)
    }

    /// Signature followed by the description and an `Args:` block.
    pub fn render_doc(&self) -> String {
        let mut doc = format!("{}\n    {}", self.signature(), self.description);
        if !self.parameters.is_empty() {
            doc.push_str("\n\n    Args:");
            for param in &self.parameters {
                doc.push_str(&format!("\n        {}: {}", param.name, param.description));
            }
        }
        if !self.returns_description.is_empty() {
            doc.push_str(&format!("\n\n    Returns:\n        {}", self.returns_description));
        }
        doc
    }

    /// Check raw call arguments against the parameter schema.
    pub fn validate_args(&self, args: &Value) -> Result<Arguments, ToolError> {
        let invalid = |message: String| ToolError::InvalidArguments {
            tool: self.name.clone(),
            message,
        };

        let map = match args {
            Value::Object(map) => map.clone(),
            // A call with no arguments may arrive as null
            Value::Null => Map::new(),
            other => {
                return Err(invalid(format!(
                    "expected a JSON object of arguments, got {}",
                    other
                )));
            }
        };

        for param in &self.parameters {
            match map.get(&param.name) {
                None | Some(Value::Null) if param.required => {
                    return Err(invalid(format!(
                        "missing required argument '{}'",
                        param.name
                    )));
                }
                Some(value)
                    if param.kind == ParamKind::Integer && value.is_u64() && !value.is_i64() =>
                {
                    return Err(invalid(format!(
                        "argument '{}' is out of range for a 64-bit integer: {}",
                        param.name, value
                    )));
                }
                Some(value) if !value.is_null() && !param.kind.matches(value) => {
                    return Err(invalid(format!(
                        "argument '{}' must be of type {}, got {}",
                        param.name, param.kind, value
                    )));
                }
                _ => {}
            }
        }

        if let Some(unexpected) = map
            .keys()
            .find(|key| !self.parameters.iter().any(|p| &p.name == *key))
        {
            return Err(invalid(format!("unexpected argument '{}'", unexpected)));
        }

        Ok(Arguments { values: map })
    }
}

/// Call arguments that passed schema validation.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    values: Map<String, Value>,
}

impl Arguments {
    /// Build arguments from a JSON object without validation (tests, direct calls).
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(values) => Self { values },
            _ => Self::default(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name).filter(|v| !v.is_null())
    }

    pub fn str(&self, name: &str) -> anyhow::Result<&str> {
        self.get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow::anyhow!("missing '{}' parameter", name))
    }

    pub fn int(&self, name: &str) -> anyhow::Result<i64> {
        let value = self.value(name)?;
        value.as_i64().ok_or_else(|| {
            anyhow::anyhow!(
                "argument '{}' is not an integer in the 64-bit range: {}",
                name,
                value
            )
        })
    }

    pub fn value(&self, name: &str) -> anyhow::Result<&Value> {
        self.get(name)
            .ok_or_else(|| anyhow::anyhow!("missing '{}' parameter", name))
    }
}
