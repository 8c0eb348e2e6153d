// Module declarations in dependency order
pub mod utils;
pub mod core;
pub mod processing;
pub mod worker;

// Public exports for external consumers
pub use core::{ConfigParams, ProgressSink, RunContext, RunEvent, Task, plan_jobs};
pub use processing::ProcessRunner;
pub use utils::{UpscaleError, UpscaleResult};
pub use worker::{RunSummary, Scheduler, TaskError, TaskQueue};
