pub mod agents;
pub mod config;
pub mod crew;
pub mod error;
pub mod llm;
pub mod runtime;
pub mod tools;

pub use agents::{Agent, AgentBuilder, ImportAllowList, ToolAgent};
pub use config::{PromptCatalog, PromptEntry, Settings};
pub use crew::{AgentRole, Crew, standard_registry};
pub use error::{AgentError, AgentToolsError, ConfigError, RegistryError, ToolError};
pub use llm::{
    Backend, BackendProvider, LlmProvider, LlmResponse, Message, MessageRole, ToolCall, ToolResult,
};
pub use runtime::{Executor, TaskRun, TaskState};
pub use tools::{
    Arguments, Database, ParamKind, ReturnKind, Tool, ToolDescriptor, ToolOutcome, ToolRegistry,
};
