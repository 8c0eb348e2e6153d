mod error;
mod queue;
mod scheduler;

pub use error::{TaskError, TaskResult};
pub use queue::TaskQueue;
pub use scheduler::{RunSummary, Scheduler};
