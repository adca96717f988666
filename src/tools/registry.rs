use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::{Tool, ToolDescriptor};
use crate::error::{RegistryError, ToolError};

/// Outcome of one tool call as the reasoning loop sees it
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Success(Value),
    Failure(String),
}

impl ToolOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ToolOutcome::Failure(_))
    }

    /// Render the outcome as the text fed back into the conversation.
    pub fn render(&self) -> String {
        match self {
            ToolOutcome::Success(Value::Null) => "done".to_string(),
            ToolOutcome::Success(Value::String(s)) => s.clone(),
            ToolOutcome::Success(Value::Bool(b)) => b.to_string(),
            ToolOutcome::Success(other) => other.to_string(),
            ToolOutcome::Failure(message) => message.clone(),
        }
    }
}

/// Registry for tools, keyed by name
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, enforcing the descriptor invariants
    pub fn register(&mut self, tool: impl Tool + 'static) -> Result<(), RegistryError> {
        self.register_shared(Arc::new(tool))
    }

    /// Register a tool that is already shared with another registry
    pub fn register_shared(&mut self, tool: Arc<dyn Tool>) -> Result<(), RegistryError> {
        tool.descriptor().validate()?;
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Build a registry holding the named tools, sharing them with this one
    pub fn subset<S: AsRef<str>>(&self, names: &[S]) -> Result<ToolRegistry, RegistryError> {
        let mut subset = ToolRegistry::new();
        for name in names {
            let name = name.as_ref();
            let tool = self
                .get(name)
                .ok_or_else(|| RegistryError::NotRegistered(name.to_string()))?;
            subset.register_shared(tool)?;
        }
        Ok(subset)
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Descriptors of all tools, sorted by name
    pub fn descriptors(&self) -> Vec<&ToolDescriptor> {
        self.tools.values().map(|t| t.descriptor()).collect()
    }

    /// Get tool names
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validate the arguments and run the named tool.
    pub async fn try_invoke(&self, name: &str, args: &Value) -> Result<Value, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        let args = tool.descriptor().validate_args(args)?;

        tool.execute(&args)
            .await
            .map_err(|source| ToolError::Execution {
                tool: name.to_string(),
                source,
            })
    }

    /// Run the named tool, converting any failure into a descriptive string.
    pub async fn invoke(&self, name: &str, args: &Value) -> ToolOutcome {
        debug!(tool = name, "invoking tool");
        match self.try_invoke(name, args).await {
            Ok(value) => ToolOutcome::Success(value),
            Err(e) => {
                warn!(tool = name, error = %e, "tool call failed");
                ToolOutcome::Failure(format!("Error: {}", e))
            }
        }
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}
