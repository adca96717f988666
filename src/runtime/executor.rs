use anyhow::Result;
use tracing::{error, info};

use super::TaskRun;
use crate::agents::Agent;
use crate::error::AgentError;
use crate::llm::LlmProvider;

/// Issues tasks to agents against a single provider
pub struct Executor {
    provider: Box<dyn LlmProvider>,
}

impl Executor {
    pub fn new(provider: impl LlmProvider + 'static) -> Self {
        Self::from_boxed(Box::new(provider))
    }

    pub fn from_boxed(provider: Box<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &dyn LlmProvider {
        self.provider.as_ref()
    }

    /// Run an agent with a task (no run tracking)
    pub async fn run(&self, agent: &dyn Agent, task: &str) -> Result<String, AgentError> {
        info!(agent = agent.name(), provider = self.provider.name(), "starting agent execution");
        let result = agent.run(task, self.provider.as_ref()).await?;
        info!(agent = agent.name(), "agent execution completed");
        Ok(result)
    }

    /// Run an agent on the task recorded in `run`, moving it through its states
    pub async fn run_tracked(&self, agent: &dyn Agent, run: &mut TaskRun) -> Result<String> {
        info!(run_id = %run.id, agent = %run.agent, task = %run.task, "starting task run");
        run.start()?;

        match agent.run(&run.task, self.provider.as_ref()).await {
            Ok(output) => {
                run.complete(output.clone())?;
                info!(run_id = %run.id, "task run completed");
                Ok(output)
            }
            Err(e) => {
                run.fail(e.to_string())?;
                error!(run_id = %run.id, error = %e, "task run failed");
                Err(e.into())
            }
        }
    }
}
