mod imports;
mod prompt;
pub(crate) mod runner;
mod tool_agent;

pub use imports::ImportAllowList;
pub use prompt::{DEFAULT_SYSTEM_PROMPT, PromptContext, render_template};
pub use tool_agent::{AgentBuilder, DEFAULT_MAX_ITERATIONS, ToolAgent};

use async_trait::async_trait;

use crate::error::AgentError;
use crate::llm::LlmProvider;

/// A reasoning role that turns a task into a final text answer
#[async_trait]
pub trait Agent: Send + Sync {
    /// Name other agents use to delegate to this one
    fn name(&self) -> &str;

    /// What this agent is good for; shown to agents that can delegate to it
    fn description(&self) -> &str;

    /// The system prompt for this agent
    fn system_prompt(&self) -> String;

    /// Run the agent with a task until it produces a final answer
    async fn run(&self, task: &str, provider: &dyn LlmProvider) -> Result<String, AgentError>;
}
