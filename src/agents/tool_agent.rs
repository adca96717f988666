use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::imports::ImportAllowList;
use super::prompt::{DEFAULT_SYSTEM_PROMPT, PromptContext, render_template};
use super::runner::agent_loop;
use super::Agent;
use crate::error::AgentError;
use crate::llm::{LlmProvider, Message};
use crate::tools::ToolRegistry;

pub const DEFAULT_MAX_ITERATIONS: usize = 20;

/// An agent bound to a fixed tool set, an import allow-list and optional
/// delegates.
pub struct ToolAgent {
    name: String,
    description: String,
    tools: ToolRegistry,
    imports: ImportAllowList,
    prompt_template: Option<String>,
    delegates: Vec<Arc<dyn Agent>>,
    max_iterations: usize,
}

impl ToolAgent {
    pub fn builder(name: impl Into<String>) -> AgentBuilder {
        AgentBuilder::new(name)
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn authorized_imports(&self) -> &ImportAllowList {
        &self.imports
    }

    pub fn delegates(&self) -> &[Arc<dyn Agent>] {
        &self.delegates
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Whether code written by this agent may import `module`
    pub fn is_import_authorized(&self, module: &str) -> bool {
        self.imports.is_authorized(module)
    }

    fn prompt_context(&self) -> PromptContext {
        let tool_descriptions = if self.tools.is_empty() {
            "(none)".to_string()
        } else {
            self.tools
                .descriptors()
                .iter()
                .map(|d| d.render_doc())
                .collect::<Vec<_>>()
                .join("\n\n")
        };

        let managed_agents_descriptions = if self.delegates.is_empty() {
            "(none)".to_string()
        } else {
            self.delegates
                .iter()
                .map(|d| format!("- {}: {}", d.name(), d.description()))
                .collect::<Vec<_>>()
                .join("\n")
        };

        PromptContext {
            name: self.name.clone(),
            tool_descriptions,
            managed_agents_descriptions,
            authorized_imports: self.imports.render(),
        }
    }
}

impl std::fmt::Debug for ToolAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolAgent")
            .field("name", &self.name)
            .field("tools", &self.tools)
            .field("imports", &self.imports)
            .field(
                "delegates",
                &self.delegates.iter().map(|d| d.name()).collect::<Vec<_>>(),
            )
            .field("max_iterations", &self.max_iterations)
            .finish()
    }
}

#[async_trait]
impl Agent for ToolAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn system_prompt(&self) -> String {
        let template = self
            .prompt_template
            .as_deref()
            .unwrap_or(DEFAULT_SYSTEM_PROMPT);
        render_template(template, &self.prompt_context())
    }

    async fn run(&self, task: &str, provider: &dyn LlmProvider) -> Result<String, AgentError> {
        info!(agent = %self.name, tools = self.tools.len(), "starting agent run");
        agent_loop(
            &self.name,
            &self.system_prompt(),
            vec![Message::user(task)],
            provider,
            &self.tools,
            &self.delegates,
            self.max_iterations,
        )
        .await
    }
}

/// Binds a tool subset, imports, prompt and delegates into a [`ToolAgent`].
pub struct AgentBuilder {
    name: String,
    description: String,
    tools: ToolRegistry,
    imports: ImportAllowList,
    prompt_template: Option<String>,
    delegates: Vec<Arc<dyn Agent>>,
    max_iterations: usize,
}

impl std::fmt::Debug for AgentBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentBuilder")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("imports", &self.imports)
            .field("prompt_template", &self.prompt_template)
            .field("max_iterations", &self.max_iterations)
            .finish_non_exhaustive()
    }
}

impl AgentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            tools: ToolRegistry::new(),
            imports: ImportAllowList::default(),
            prompt_template: None,
            delegates: Vec::new(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Take the named tools from `registry`. Fails on the first name the
    /// registry does not hold.
    pub fn tools<S: AsRef<str>>(
        mut self,
        registry: &ToolRegistry,
        names: &[S],
    ) -> Result<Self, AgentError> {
        for name in names {
            let name = name.as_ref();
            if self.tools.contains(name) {
                continue;
            }
            let tool = registry.get(name).ok_or_else(|| {
                AgentError::Config(format!(
                    "agent '{}' requests unknown tool '{}'",
                    self.name, name
                ))
            })?;
            self.tools.register_shared(tool)?;
        }
        Ok(self)
    }

    pub fn authorized_imports<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.imports.extend(modules);
        self
    }

    /// Replace the default system prompt template
    pub fn system_prompt(mut self, template: impl Into<String>) -> Self {
        self.prompt_template = Some(template.into());
        self
    }

    pub fn delegate(mut self, agent: Arc<dyn Agent>) -> Self {
        self.delegates.push(agent);
        self
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn build(self) -> Result<ToolAgent, AgentError> {
        if self.name.trim().is_empty() {
            return Err(AgentError::Config("agent name must not be empty".to_string()));
        }
        if self.description.trim().is_empty() {
            return Err(AgentError::Config(format!(
                "agent '{}' has an empty description",
                self.name
            )));
        }
        if self.max_iterations == 0 {
            return Err(AgentError::Config(format!(
                "agent '{}' needs at least one iteration",
                self.name
            )));
        }

        let mut seen: Vec<&str> = Vec::with_capacity(self.delegates.len());
        for delegate in &self.delegates {
            let name = delegate.name();
            if name == self.name {
                return Err(AgentError::Config(format!(
                    "agent '{}' cannot delegate to itself",
                    self.name
                )));
            }
            if self.tools.contains(name) || seen.contains(&name) {
                return Err(AgentError::Config(format!(
                    "agent '{}' has a delegate named '{}' that clashes with another tool or delegate",
                    self.name, name
                )));
            }
            seen.push(name);
        }

        Ok(ToolAgent {
            name: self.name,
            description: self.description,
            tools: self.tools,
            imports: self.imports,
            prompt_template: self.prompt_template,
            delegates: self.delegates,
            max_iterations: self.max_iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use anyhow::Result;
    use serde_json::json;

    use super::*;
    use crate::llm::{LlmResponse, ToolCall};
    use crate::tools::{IsPrimeTool, ToolDescriptor};

    struct Scripted {
        responses: Mutex<VecDeque<LlmResponse>>,
        seen_tools: Mutex<Vec<Vec<String>>>,
    }

    impl Scripted {
        fn new(responses: Vec<LlmResponse>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                seen_tools: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for Scripted {
        async fn chat(
            &self,
            _system: &str,
            _messages: &[Message],
            tools: &[&ToolDescriptor],
        ) -> Result<LlmResponse> {
            self.seen_tools
                .lock()
                .unwrap()
                .push(tools.iter().map(|t| t.name.clone()).collect());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("script exhausted"))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn call(name: &str, arguments: serde_json::Value) -> LlmResponse {
        LlmResponse {
            message: Message::assistant(""),
            tool_calls: vec![ToolCall {
                id: "call_1".to_string(),
                name: name.to_string(),
                arguments,
            }],
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(IsPrimeTool::new()).unwrap();
        registry
    }

    fn math_agent() -> ToolAgent {
        AgentBuilder::new("math_agent")
            .description("Checks numbers.")
            .tools(&registry(), &["is_prime"])
            .unwrap()
            .authorized_imports(["json"])
            .build()
            .unwrap()
    }

    #[test]
    fn unknown_tool_is_rejected() {
        let err = AgentBuilder::new("a")
            .description("d")
            .tools(&registry(), &["no_such_tool"])
            .unwrap_err();
        assert!(err.to_string().contains("no_such_tool"));
    }

    #[test]
    fn empty_description_is_rejected() {
        let err = AgentBuilder::new("a").build().unwrap_err();
        assert!(matches!(err, AgentError::Config(_)));
    }

    #[test]
    fn delegate_clashing_with_tool_is_rejected() {
        let clash: Arc<dyn Agent> = Arc::new(
            AgentBuilder::new("is_prime")
                .description("Shadows a tool.")
                .build()
                .unwrap(),
        );
        let err = AgentBuilder::new("manager")
            .description("Manages.")
            .tools(&registry(), &["is_prime"])
            .unwrap()
            .delegate(clash)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("clashes"));
    }

    #[test]
    fn system_prompt_lists_tools_and_imports() {
        let agent = math_agent();
        let prompt = agent.system_prompt();
        assert!(prompt.contains("You are math_agent"));
        assert!(prompt.contains("is_prime(n: integer) -> boolean"));
        assert!(prompt.contains("may import: json"));
        assert!(agent.is_import_authorized("json"));
        assert!(!agent.is_import_authorized("subprocess"));
    }

    #[test]
    fn custom_template_is_used() {
        let agent = AgentBuilder::new("terse")
            .description("Short prompt.")
            .system_prompt("I am {{name}}.")
            .build()
            .unwrap();
        assert_eq!(agent.system_prompt(), "I am terse.");
    }

    #[tokio::test]
    async fn runs_tool_then_answers() {
        let provider = Scripted::new(vec![
            call("is_prime", json!({"n": 7})),
            LlmResponse::answer("7 is prime"),
        ]);
        let answer = math_agent().run("is 7 prime?", &provider).await.unwrap();
        assert_eq!(answer, "7 is prime");
        assert_eq!(provider.seen_tools.lock().unwrap()[0], vec!["is_prime"]);
    }

    #[tokio::test]
    async fn delegate_is_offered_as_tool() {
        let worker: Arc<dyn Agent> = Arc::new(math_agent());
        let manager = AgentBuilder::new("manager")
            .description("Hands work out.")
            .delegate(worker)
            .build()
            .unwrap();
        assert!(manager.system_prompt().contains("- math_agent: Checks numbers."));

        let provider = Scripted::new(vec![
            call("math_agent", json!({"task": "is 7 prime?"})),
            LlmResponse::answer("yes"),
            LlmResponse::answer("the worker says yes"),
        ]);
        let answer = manager.run("ask the worker", &provider).await.unwrap();
        assert_eq!(answer, "the worker says yes");

        let seen = provider.seen_tools.lock().unwrap();
        assert_eq!(seen[0], vec!["math_agent"]);
        assert_eq!(seen[1], vec!["is_prime"]);
    }

    #[tokio::test]
    async fn stops_after_max_iterations() {
        let agent = AgentBuilder::new("looper")
            .description("Never finishes.")
            .tools(&registry(), &["is_prime"])
            .unwrap()
            .max_iterations(2)
            .build()
            .unwrap();
        let provider = Scripted::new(vec![
            call("is_prime", json!({"n": 2})),
            call("is_prime", json!({"n": 3})),
        ]);
        let err = agent.run("loop", &provider).await.unwrap_err();
        assert!(matches!(
            err,
            AgentError::MaxIterations { iterations: 2, .. }
        ));
    }
}
