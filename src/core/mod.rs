//! Core types of a processing run.
//!
//! - [`ConfigParams`]: immutable run configuration
//! - [`Task`]: a unit of work and its variants
//! - [`ProgressSink`]: ordered hand-off of progress text to the caller
//! - [`RunContext`]: collaborators shared by every task of a run
//! - [`plan_jobs`]: turns a user-selected input into top-level tasks

mod args;
mod models;
mod naming;
mod plan;
mod progress;
mod state;
mod task;
mod types;

pub use args::executable_args;
pub use models::{DEFAULT_SCALE_FACTOR, discover_models, model_scale_factor};
pub use naming::{
    nested_output_path, output_dir_path, output_extension, output_path, output_suffix,
};
pub use plan::plan_jobs;
pub use progress::{ProgressSink, RunEvent};
pub use state::RunContext;
pub use task::{
    AnimationTiming, DecomposeTask, FrameGroup, FrameSlot, RecombineTask, Task, TaskKind,
    TaskOutcome, TaskStatus, UpscaleTask,
};
pub use types::{ConfigParams, DownsampleFilter, ResizeMode};
