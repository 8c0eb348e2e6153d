//! Shared run state handed to every task.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use crate::processing::ProcessRunner;

/// Run-wide collaborators.
///
/// Cloning is cheap: the runner sits behind an `Arc` and the token is a handle
/// to the same cancellation state.
#[derive(Debug, Clone)]
pub struct RunContext {
    runner: Arc<ProcessRunner>,
    cancel: CancellationToken,
}

impl RunContext {
    pub fn new(runner: ProcessRunner) -> Self {
        debug!("Run context created for {}", runner.program().display());
        Self {
            runner: Arc::new(runner),
            cancel: CancellationToken::new(),
        }
    }

    pub fn runner(&self) -> &ProcessRunner {
        &self.runner
    }

    /// Token checked between tasks and while reading process output.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
