mod backend;
mod message;
mod provider;

pub use backend::{Backend, BackendProvider};
pub use message::{Message, MessageRole, ToolCall, ToolResult};
pub use provider::{LlmProvider, LlmResponse};
