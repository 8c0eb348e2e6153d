use std::collections::VecDeque;
use crate::core::Task;

/// Pending tasks of one run.
///
/// Top-level jobs are appended at the back before the run starts. A task's
/// expansion goes to the front so a composite job drains completely before the
/// next top-level job. The scheduler takes the queue by value, so nothing else
/// can push once the run is underway.
#[derive(Debug, Default)]
pub struct TaskQueue {
    tasks: VecDeque<Task>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_back(&mut self, task: Task) {
        self.tasks.push_back(task);
    }

    /// Inserts `tasks` at the head so they dequeue in the given order.
    pub fn push_front_all(&mut self, tasks: Vec<Task>) {
        for task in tasks.into_iter().rev() {
            self.tasks.push_front(task);
        }
    }

    pub fn pop_front(&mut self) -> Option<Task> {
        self.tasks.pop_front()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }
}

impl FromIterator<Task> for TaskQueue {
    fn from_iter<I: IntoIterator<Item = Task>>(iter: I) -> Self {
        Self { tasks: iter.into_iter().collect() }
    }
}
