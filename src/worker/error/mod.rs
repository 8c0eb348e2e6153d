use std::path::PathBuf;
use std::time::Duration;

/// Terminal failure of a single task.
///
/// Every variant is handled at the task boundary: the scheduler reports it to
/// the sink and moves on to the next task.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("Failed to launch {program}: {reason}")]
    Spawn { program: String, reason: String },

    #[error("Upscaler exited with code {exit_code}{}", format_diagnostics(.diagnostics))]
    ProcessFailure { exit_code: i32, diagnostics: Vec<String> },

    #[error("Upscaler timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("{failed} of {total} frames failed to upscale")]
    RecombineDependency { failed: usize, total: usize },

    #[error("Expected output was not written: {0}")]
    MissingOutput(PathBuf),

    #[error("Image processing failed: {0}")]
    Image(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Cancelled")]
    Cancelled,
}

pub type TaskResult<T> = Result<T, TaskError>;

fn format_diagnostics(lines: &[String]) -> String {
    match lines.last() {
        Some(last) => format!(" ({last})"),
        None => String::new(),
    }
}

impl TaskError {
    pub fn decode(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        TaskError::Decode { path: path.into(), reason: reason.to_string() }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        TaskError::Io(msg.into())
    }
}

impl From<std::io::Error> for TaskError {
    fn from(err: std::io::Error) -> Self {
        TaskError::Io(err.to_string())
    }
}

impl From<image::ImageError> for TaskError {
    fn from(err: image::ImageError) -> Self {
        TaskError::Image(err.to_string())
    }
}

impl From<tokio::task::JoinError> for TaskError {
    fn from(err: tokio::task::JoinError) -> Self {
        TaskError::Image(format!("Image worker failed: {err}"))
    }
}
