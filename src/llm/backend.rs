use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use llm::builder::{FunctionBuilder, LLMBackend, LLMBuilder};
use llm::chat::{ChatMessage, ChatRole, FunctionTool, MessageType, Tool as LlmTool};
use serde::{Deserialize, Serialize};
use tokio::time::{Duration, timeout};
use tracing::{debug, warn};

use super::{LlmProvider, LlmResponse, Message, MessageRole, ToolCall};
use crate::error::ConfigError;
use crate::tools::ToolDescriptor;

const API_TIMEOUT: Duration = Duration::from_secs(120);
const MAX_TOKENS: u32 = 8192;

/// Hosted model families reachable through the llm crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Google,
    Anthropic,
    OpenAI,
}

impl Backend {
    /// Environment variable holding the API key
    pub fn credential_var(self) -> &'static str {
        match self {
            Backend::Google => "GEMINI_API_KEY",
            Backend::Anthropic => "ANTHROPIC_API_KEY",
            Backend::OpenAI => "OPENAI_API_KEY",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Backend::Google => "gemini-2.0-flash",
            Backend::Anthropic => "claude-sonnet-4-20250514",
            Backend::OpenAI => "gpt-4o",
        }
    }

    fn llm_backend(self) -> LLMBackend {
        match self {
            Backend::Google => LLMBackend::Google,
            Backend::Anthropic => LLMBackend::Anthropic,
            Backend::OpenAI => LLMBackend::OpenAI,
        }
    }
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "google" | "gemini" => Ok(Backend::Google),
            "anthropic" => Ok(Backend::Anthropic),
            "openai" => Ok(Backend::OpenAI),
            _ => Err(ConfigError::UnknownProvider(s.to_string())),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Backend::Google => "google",
            Backend::Anthropic => "anthropic",
            Backend::OpenAI => "openai",
        };
        f.write_str(s)
    }
}

/// LLM provider backed by the llm crate
pub struct BackendProvider {
    backend: Backend,
    model: String,
    api_key: String,
}

impl BackendProvider {
    /// Create a provider, reading the backend's API key from the environment.
    ///
    /// A missing key is a fatal startup condition for callers.
    pub fn new(backend: Backend, model: Option<&str>) -> Result<Self, ConfigError> {
        let var = backend.credential_var();
        let api_key = std::env::var(var)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingCredential(var.to_string()))?;

        Ok(Self {
            backend,
            model: model.unwrap_or(backend.default_model()).to_string(),
            api_key,
        })
    }

    /// Gemini 2.0 Flash, the default model
    pub fn gemini() -> Result<Self, ConfigError> {
        Self::new(Backend::Google, None)
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

fn to_llm_call(id: &str, name: &str, arguments: String) -> llm::ToolCall {
    llm::ToolCall {
        id: id.to_string(),
        call_type: "function".to_string(),
        function: llm::FunctionCall {
            name: name.to_string(),
            arguments,
        },
    }
}

fn to_chat_messages(messages: &[Message]) -> Vec<ChatMessage> {
    messages
        .iter()
        .filter_map(|msg| match msg.role {
            MessageRole::User => Some(ChatMessage {
                role: ChatRole::User,
                message_type: MessageType::Text,
                content: msg.content.clone(),
            }),
            MessageRole::Assistant if msg.tool_calls.is_empty() => Some(ChatMessage {
                role: ChatRole::Assistant,
                message_type: MessageType::Text,
                content: msg.content.clone(),
            }),
            MessageRole::Assistant => {
                let calls = msg
                    .tool_calls
                    .iter()
                    .map(|tc| to_llm_call(&tc.id, &tc.name, tc.arguments.to_string()))
                    .collect();
                Some(ChatMessage {
                    role: ChatRole::Assistant,
                    message_type: MessageType::ToolUse(calls),
                    content: msg.content.clone(),
                })
            }
            // Results travel in the function-call slot the llm crate reserves for them
            MessageRole::Tool => msg.tool_result.as_ref().map(|result| ChatMessage {
                role: ChatRole::User,
                message_type: MessageType::ToolResult(vec![to_llm_call(
                    &result.tool_call_id,
                    &result.name,
                    result.result.clone(),
                )]),
                content: String::new(),
            }),
        })
        .collect()
}

#[async_trait]
impl LlmProvider for BackendProvider {
    fn name(&self) -> &str {
        match self.backend {
            Backend::Google => "google",
            Backend::Anthropic => "anthropic",
            Backend::OpenAI => "openai",
        }
    }

    async fn chat(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[&ToolDescriptor],
    ) -> Result<LlmResponse> {
        let llm_tools: Vec<LlmTool> = tools
            .iter()
            .map(|t| LlmTool {
                tool_type: "function".to_string(),
                cache_control: None,
                function: FunctionTool {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.json_schema(),
                },
            })
            .collect();

        // The llm crate takes functions at build time, so the client is rebuilt per call
        let mut builder = LLMBuilder::new()
            .backend(self.backend.llm_backend())
            .api_key(&self.api_key)
            .model(&self.model)
            .system(system)
            .max_tokens(MAX_TOKENS);

        for tool in &llm_tools {
            builder = builder.function(
                FunctionBuilder::new(&tool.function.name)
                    .description(&tool.function.description)
                    .json_schema(tool.function.parameters.clone()),
            );
        }

        let client = builder.build().context("failed to build LLM client")?;
        let chat_messages = to_chat_messages(messages);

        debug!(
            provider = %self.backend,
            model = %self.model,
            messages = chat_messages.len(),
            tools = llm_tools.len(),
            "sending chat request"
        );

        let response = if llm_tools.is_empty() {
            timeout(API_TIMEOUT, client.chat(&chat_messages))
                .await
                .with_context(|| format!("{} API call timed out", self.backend))?
                .with_context(|| format!("failed to call {} API", self.backend))?
        } else {
            timeout(
                API_TIMEOUT,
                client.chat_with_tools(&chat_messages, Some(&llm_tools)),
            )
            .await
            .with_context(|| format!("{} API call timed out", self.backend))?
            .with_context(|| format!("failed to call {} API with tools", self.backend))?
        };

        let content = response.text().unwrap_or_else(|| {
            warn!(provider = %self.backend, "API returned empty or missing response text");
            String::new()
        });

        let tool_calls = response
            .tool_calls()
            .map(|calls| {
                calls
                    .iter()
                    .map(|tc| ToolCall {
                        id: tc.id.clone(),
                        name: tc.function.name.clone(),
                        arguments: serde_json::from_str(&tc.function.arguments).unwrap_or_else(
                            |e| {
                                warn!(error = %e, "failed to parse tool call arguments as JSON");
                                serde_json::Value::Null
                            },
                        ),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(LlmResponse {
            message: Message::assistant(content),
            tool_calls,
        })
    }
}
