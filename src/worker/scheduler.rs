//! Single-consumer task runner.
//!
//! Drains a [`TaskQueue`] on one worker, one task at a time. Follow-up tasks
//! returned by an execution go to the front of the queue. Every task's outcome
//! is reported to the sink and none of them stops the run.

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::core::{ProgressSink, RunContext, TaskStatus};
use crate::worker::TaskQueue;

/// Per-task outcome counts of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Executed tasks that reached `Done`
    pub done: usize,
    /// Executed tasks that reached `Failed`
    pub failed: usize,
    /// Pending tasks were discarded after cancellation
    pub cancelled: bool,
}

pub struct Scheduler {
    ctx: RunContext,
}

impl Scheduler {
    pub fn new(ctx: RunContext) -> Self {
        Self { ctx }
    }

    /// Pops the head task and runs it to a terminal status.
    ///
    /// Returns `None` when the queue is empty.
    pub async fn run_next(&self, queue: &mut TaskQueue, sink: &ProgressSink) -> Option<TaskStatus> {
        let task = queue.pop_front()?;
        let description = task.to_string();

        debug!("Running {} ({} pending)", description, queue.len());
        sink.write(format!("Starting {description}"));

        let outcome = task.execute(&self.ctx, sink).await;

        match &outcome.status {
            TaskStatus::Done => sink.write(format!("Finished {description}")),
            TaskStatus::Failed(e) => {
                warn!("Task failed: {}: {}", description, e);
                sink.write(format!("Failed {description}: {e}"));
            }
        }

        if !outcome.follow_ups.is_empty() {
            debug!("Scheduling {} follow-up tasks of {}", outcome.follow_ups.len(), description);
            queue.push_front_all(outcome.follow_ups);
        }

        Some(outcome.status)
    }

    /// Drains `queue`, then calls `on_complete` exactly once.
    ///
    /// Cancellation is checked between tasks: the remaining tasks are
    /// discarded, releasing any frame workspace they own.
    pub async fn run<F>(&self, mut queue: TaskQueue, sink: &ProgressSink, on_complete: F) -> RunSummary
    where
        F: FnOnce(),
    {
        let mut summary = RunSummary::default();
        info!("Starting run with {} tasks", queue.len());

        loop {
            if self.ctx.is_cancelled() {
                let pending = queue.len();
                while let Some(task) = queue.pop_front() {
                    task.discard();
                }
                summary.cancelled = true;
                sink.write(format!("Cancelled, {pending} pending tasks discarded"));
                break;
            }

            match self.run_next(&mut queue, sink).await {
                Some(TaskStatus::Done) => summary.done += 1,
                Some(TaskStatus::Failed(_)) => summary.failed += 1,
                None => break,
            }
        }

        sink.write(format!(
            "All tasks finished: {} done, {} failed",
            summary.done, summary.failed
        ));
        info!("Run finished: {:?}", summary);
        on_complete();
        summary
    }

    /// Runs the queue on a dedicated worker task.
    ///
    /// Progress lines and the final [`crate::core::RunEvent::Completed`] are
    /// delivered through `sink`.
    pub fn spawn(self, queue: TaskQueue, sink: ProgressSink) -> JoinHandle<RunSummary> {
        tokio::spawn(async move {
            let completion = sink.clone();
            self.run(queue, &sink, move || completion.complete()).await
        })
    }
}
