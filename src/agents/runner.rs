use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::Agent;
use crate::error::AgentError;
use crate::llm::{LlmProvider, Message, ToolCall, ToolResult};
use crate::tools::{ParamKind, ReturnKind, ToolDescriptor, ToolOutcome, ToolRegistry};

/// Descriptor under which a delegate agent is offered to its manager.
pub fn delegate_descriptor(agent: &dyn Agent) -> ToolDescriptor {
    ToolDescriptor::new(agent.name(), agent.description())
        .param(
            "task",
            ParamKind::String,
            "The task for this team member. Be specific and include every detail it needs.",
        )
        .returns(ReturnKind::Text, "The team member's final answer.")
}

/// Shared agent execution loop.
///
/// Sends the conversation and the tool catalog to the provider, executes the
/// requested tool calls in order, appends their results, and repeats until the
/// provider answers without tool calls.
///
/// - `agent_name`: For logging and errors
/// - `tools`: The agent's own tool set
/// - `delegates`: Agents offered as extra tools taking a single `task` argument
/// - `max_iterations`: Maximum number of LLM round-trips before failing
pub async fn agent_loop(
    agent_name: &str,
    system_prompt: &str,
    mut messages: Vec<Message>,
    provider: &dyn LlmProvider,
    tools: &ToolRegistry,
    delegates: &[Arc<dyn Agent>],
    max_iterations: usize,
) -> Result<String, AgentError> {
    let delegate_descriptors: Vec<ToolDescriptor> = delegates
        .iter()
        .map(|d| delegate_descriptor(d.as_ref()))
        .collect();
    let catalog: Vec<&ToolDescriptor> = tools
        .descriptors()
        .into_iter()
        .chain(delegate_descriptors.iter())
        .collect();

    for iteration in 0..max_iterations {
        debug!(agent = agent_name, iteration, "agent iteration");

        let response = provider
            .chat(system_prompt, &messages, &catalog)
            .await
            .map_err(|source| AgentError::Provider {
                agent_name: agent_name.to_string(),
                source,
            })?;

        debug!(agent = agent_name, content = %response.message.content, "llm response");

        let tool_calls = response.tool_calls;
        if tool_calls.is_empty() {
            info!(agent = agent_name, iteration, "agent completed");
            return Ok(response.message.content);
        }

        let mut results = Vec::with_capacity(tool_calls.len());
        for call in &tool_calls {
            debug!(agent = agent_name, tool = %call.name, "executing tool");

            let outcome = dispatch(call, tools, delegates, &delegate_descriptors, provider).await;
            let result = ToolResult {
                tool_call_id: call.id.clone(),
                name: call.name.clone(),
                result: outcome.render(),
                is_error: outcome.is_failure(),
            };

            debug!(agent = agent_name, tool = %call.name, result = %result.result, "tool result");
            results.push(result);
        }

        messages.push(Message::assistant_with_tools(
            response.message.content,
            tool_calls,
        ));
        messages.extend(results.into_iter().map(Message::tool_result));
    }

    warn!(agent = agent_name, max_iterations, "agent ran out of iterations");
    Err(AgentError::MaxIterations {
        agent_name: agent_name.to_string(),
        iterations: max_iterations,
    })
}

async fn dispatch(
    call: &ToolCall,
    tools: &ToolRegistry,
    delegates: &[Arc<dyn Agent>],
    delegate_descriptors: &[ToolDescriptor],
    provider: &dyn LlmProvider,
) -> ToolOutcome {
    let Some(index) = delegates.iter().position(|d| d.name() == call.name) else {
        return tools.invoke(&call.name, &call.arguments).await;
    };

    let delegate = &delegates[index];
    let task = match delegate_descriptors[index].validate_args(&call.arguments) {
        Ok(args) => match args.str("task") {
            Ok(task) => task.to_string(),
            Err(e) => return ToolOutcome::Failure(format!("Error: {}", e)),
        },
        Err(e) => return ToolOutcome::Failure(format!("Error: {}", e)),
    };

    info!(delegate = delegate.name(), "delegating sub-task");
    match delegate.run(&task, provider).await {
        Ok(answer) => ToolOutcome::Success(Value::String(answer)),
        Err(e) => {
            warn!(delegate = delegate.name(), error = %e, "delegate failed");
            ToolOutcome::Failure(format!("Error: {}", e))
        }
    }
}
