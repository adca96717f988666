use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// State of a single task run
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "output", rename_all = "snake_case")]
pub enum TaskState {
    /// Created but not started
    #[default]
    Idle,
    /// The agent is working on the task
    Running,
    /// Finished with a final answer
    Completed(String),
    /// Finished with an error
    Failed(String),
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed(_))
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Completed(_) => write!(f, "completed"),
            Self::Failed(_) => write!(f, "failed"),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("task {id}: cannot move from {from} to {to}")]
pub struct TransitionError {
    pub id: String,
    pub from: String,
    pub to: String,
}

/// Record of one task issued to one agent.
///
/// Runs go `Idle -> Running -> Completed | Failed`; terminal states are final,
/// so a new task always gets a new record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRun {
    pub id: String,
    pub agent: String,
    pub task: String,
    pub state: TaskState,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl TaskRun {
    pub fn new(agent: impl Into<String>, task: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            agent: agent.into(),
            task: task.into(),
            state: TaskState::Idle,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    pub fn start(&mut self) -> Result<(), TransitionError> {
        if self.state != TaskState::Idle {
            return Err(self.transition_error("running"));
        }
        self.state = TaskState::Running;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    pub fn complete(&mut self, output: impl Into<String>) -> Result<(), TransitionError> {
        self.finish(TaskState::Completed(output.into()))
    }

    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), TransitionError> {
        self.finish(TaskState::Failed(error.into()))
    }

    /// The final answer, if the run completed
    pub fn output(&self) -> Option<&str> {
        match &self.state {
            TaskState::Completed(output) => Some(output),
            _ => None,
        }
    }

    fn finish(&mut self, state: TaskState) -> Result<(), TransitionError> {
        if self.state != TaskState::Running {
            return Err(self.transition_error(&state.to_string()));
        }
        self.state = state;
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    fn transition_error(&self, to: &str) -> TransitionError {
        TransitionError {
            id: self.id.clone(),
            from: self.state.to_string(),
            to: to.to_string(),
        }
    }
}
