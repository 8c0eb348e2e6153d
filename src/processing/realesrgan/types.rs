use std::collections::VecDeque;
use serde::Serialize;

/// Number of stderr lines kept for diagnostics.
pub const STDERR_TAIL_LINES: usize = 20;

/// Outcome of one supervised upscaler invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResult {
    /// Exit code, `128 + signal` when the process was killed by a signal
    pub exit_code: i32,
    /// The process was killed because it ran past the timeout
    pub timed_out: bool,
    /// Last stderr lines, oldest first
    pub stderr_tail: Vec<String>,
}

impl ProcessResult {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == 0
    }
}

/// Bounded ring of the most recent stderr lines.
#[derive(Debug, Default)]
pub(crate) struct StderrTail {
    lines: VecDeque<String>,
}

impl StderrTail {
    pub(crate) fn push(&mut self, line: &str) {
        if self.lines.len() == STDERR_TAIL_LINES {
            self.lines.pop_front();
        }
        self.lines.push_back(line.to_string());
    }

    pub(crate) fn into_vec(self) -> Vec<String> {
        self.lines.into()
    }
}
