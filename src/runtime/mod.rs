mod executor;
mod task;

pub use executor::Executor;
pub use task::{TaskRun, TaskState, TransitionError};
