use anyhow::Result;
use async_trait::async_trait;

use super::{Message, ToolCall};
use crate::tools::ToolDescriptor;

/// Response from an LLM
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// The message content
    pub message: Message,
    /// Tool calls requested by the LLM; empty means this is the final answer
    pub tool_calls: Vec<ToolCall>,
}

impl LlmResponse {
    /// A final answer with no tool calls
    pub fn answer(content: impl Into<String>) -> Self {
        Self {
            message: Message::assistant(content),
            tool_calls: Vec::new(),
        }
    }
}

/// The external reasoning engine: conversation and tool catalog in,
/// tool calls or a final answer out.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send messages to the LLM and get a response
    async fn chat(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[&ToolDescriptor],
    ) -> Result<LlmResponse>;

    /// Get the provider name
    fn name(&self) -> &str;
}
