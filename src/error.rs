/// Errors raised while dispatching a tool call.
///
/// These never reach the reasoning loop as errors: [`ToolRegistry::invoke`]
/// renders them into a failure string.
///
/// [`ToolRegistry::invoke`]: crate::tools::ToolRegistry::invoke
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("invalid arguments for '{tool}': {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("{tool} failed: {source:#}")]
    Execution {
        tool: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Errors raised while building a registry.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tool name must not be empty")]
    EmptyName,

    #[error("tool '{0}' is already registered")]
    DuplicateName(String),

    #[error("tool '{0}' has an empty description")]
    EmptyDescription(String),

    #[error("tool '{tool}' has an invalid parameter: {message}")]
    InvalidParameter { tool: String, message: String },

    #[error("tool '{0}' is not registered")]
    NotRegistered(String),
}

/// Errors raised while binding or running an agent.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("agent configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("max iterations exceeded: {agent_name} after {iterations} iterations")]
    MaxIterations {
        agent_name: String,
        iterations: usize,
    },

    #[error("{agent_name} agent: provider call failed: {source:#}")]
    Provider {
        agent_name: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is not set")]
    MissingCredential(String),

    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("unsupported database url '{0}' (expected sqlite://<path>)")]
    UnsupportedDatabase(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
}

/// Top-level error for the crate's public entry points.
#[derive(Debug, thiserror::Error)]
pub enum AgentToolsError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("agent error: {0}")]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
