//! Units of work executed by the scheduler.
//!
//! A task runs to a terminal status and may hand back follow-up tasks; the
//! scheduler, not the task, decides where they go in the queue.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use image::Delay;
use image::codecs::gif::Repeat;
use tempfile::TempDir;
use tracing::{debug, warn};

use crate::core::{ConfigParams, ProgressSink, RunContext};
use crate::processing::{decompose, recombine, upscale};
use crate::utils::format_from_extension;
use crate::worker::TaskError;

/// Variant chosen for a top-level input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Upscale,
    Decompose,
}

impl TaskKind {
    /// Pure classification by extension: GIFs are composite, everything else is
    /// a single raster.
    pub fn classify(path: &Path) -> Self {
        match format_from_extension(path) {
            Ok(format) if format.is_animated() => Self::Decompose,
            _ => Self::Upscale,
        }
    }
}

/// Failure bookkeeping shared by the frame tasks of one composite job and its
/// recombination step.
#[derive(Debug)]
pub struct FrameGroup {
    source: PathBuf,
    total: usize,
    failed: AtomicUsize,
}

impl FrameGroup {
    pub fn new(source: impl Into<PathBuf>, total: usize) -> Self {
        Self {
            source: source.into(),
            total,
            failed: AtomicUsize::new(0),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }
}

/// Position of a frame task inside its composite job.
#[derive(Debug, Clone)]
pub struct FrameSlot {
    pub index: usize,
    pub group: Arc<FrameGroup>,
}

/// One raster image in, one raster image out.
#[derive(Debug, Clone)]
pub struct UpscaleTask {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub config: Arc<ConfigParams>,
    /// Set for frames derived from a composite job
    pub frame: Option<FrameSlot>,
}

/// One animated image in; expands into frame tasks plus a recombination.
#[derive(Debug, Clone)]
pub struct DecomposeTask {
    pub input_path: PathBuf,
    /// Final destination of the recombined animation
    pub output_path: PathBuf,
    pub config: Arc<ConfigParams>,
}

/// Timing metadata captured from the source animation.
#[derive(Debug, Clone)]
pub struct AnimationTiming {
    /// Per-frame display duration, in frame order
    pub delays: Vec<Delay>,
    /// `None` when the source had no loop extension
    pub repeat: Option<Repeat>,
}

/// Reassembles upscaled frames into the final animation.
///
/// Owns the temporary workspace holding every frame file of the job; it is
/// removed when the task finishes, whatever the outcome, or when the task is
/// discarded without running.
#[derive(Debug)]
pub struct RecombineTask {
    pub source_path: PathBuf,
    pub output_path: PathBuf,
    /// Upscaled frame files, in frame order
    pub frames: Vec<PathBuf>,
    pub timing: AnimationTiming,
    pub group: Arc<FrameGroup>,
    pub(crate) workspace: TempDir,
}

impl RecombineTask {
    pub fn workspace_path(&self) -> &Path {
        self.workspace.path()
    }
}

#[derive(Debug)]
pub enum Task {
    Upscale(UpscaleTask),
    Decompose(DecomposeTask),
    Recombine(RecombineTask),
}

/// Terminal state of an executed task.
#[derive(Debug)]
pub enum TaskStatus {
    Done,
    Failed(TaskError),
}

#[derive(Debug)]
pub struct TaskOutcome {
    pub status: TaskStatus,
    /// Tasks to run next, in execution order
    pub follow_ups: Vec<Task>,
}

impl TaskOutcome {
    fn from_result(result: Result<(), TaskError>) -> Self {
        let status = match result {
            Ok(()) => TaskStatus::Done,
            Err(e) => TaskStatus::Failed(e),
        };
        Self { status, follow_ups: Vec::new() }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn absolute(path: PathBuf) -> PathBuf {
    std::path::absolute(&path).unwrap_or(path)
}

impl Task {
    /// Builds the task for one top-level input.
    ///
    /// Relative paths are resolved against the current directory, since the
    /// upscaler runs from its own directory.
    pub fn top_level(
        input_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        config: Arc<ConfigParams>,
    ) -> Self {
        let input_path = absolute(input_path.into());
        let output_path = absolute(output_path.into());
        match TaskKind::classify(&input_path) {
            TaskKind::Decompose => Task::Decompose(DecomposeTask { input_path, output_path, config }),
            TaskKind::Upscale => Task::Upscale(UpscaleTask {
                input_path,
                output_path,
                config,
                frame: None,
            }),
        }
    }

    pub fn output_path(&self) -> &Path {
        match self {
            Task::Upscale(task) => &task.output_path,
            Task::Decompose(task) => &task.output_path,
            Task::Recombine(task) => &task.output_path,
        }
    }

    pub fn is_frame(&self) -> bool {
        matches!(self, Task::Upscale(UpscaleTask { frame: Some(_), .. }))
    }

    /// Runs the task to a terminal status.
    ///
    /// Errors never escape: they become `TaskStatus::Failed`. A failed frame is
    /// recorded on its group so the recombination step can refuse to run.
    pub async fn execute(self, ctx: &RunContext, sink: &ProgressSink) -> TaskOutcome {
        match self {
            Task::Upscale(task) => {
                let result = upscale(&task, ctx, sink).await;
                if let (Err(_), Some(slot)) = (&result, &task.frame) {
                    slot.group.record_failure();
                }
                TaskOutcome::from_result(result)
            }
            Task::Decompose(task) => match decompose(&task, sink).await {
                Ok(follow_ups) => TaskOutcome { status: TaskStatus::Done, follow_ups },
                Err(e) => TaskOutcome::from_result(Err(e)),
            },
            Task::Recombine(task) => TaskOutcome::from_result(recombine(task, sink).await),
        }
    }

    /// Drops a task that will never run, releasing anything it owns.
    pub fn discard(self) {
        if let Task::Recombine(task) = self {
            let path = task.workspace.path().to_path_buf();
            match task.workspace.close() {
                Ok(()) => debug!("Removed frame workspace {}", path.display()),
                Err(e) => warn!("Failed to remove frame workspace {}: {}", path.display(), e),
            }
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::Upscale(UpscaleTask { input_path, frame: None, .. }) => {
                write!(f, "upscale {}", display_name(input_path))
            }
            Task::Upscale(UpscaleTask { frame: Some(slot), .. }) => write!(
                f,
                "upscale frame {}/{} of {}",
                slot.index + 1,
                slot.group.total(),
                display_name(slot.group.source())
            ),
            Task::Decompose(task) => write!(f, "decompose {}", display_name(&task.input_path)),
            Task::Recombine(task) => write!(f, "recombine {}", display_name(&task.source_path)),
        }
    }
}
