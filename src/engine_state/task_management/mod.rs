//! # Task Management System
//!
//! A tick-keyed queue of deferred tasks. Gameplay never waits: anything that
//! should happen "later" is published with a delay in ticks and handed back by
//! the tick loop when it comes due.
//!
//! ## Ordering
//! Tasks due on the same tick come back in publish order. A task published
//! with a zero delay runs on the next call to [`TaskManager::take_due`].
//!
//! ## Example Usage
//! ```rust
//! use voxel_dungeon::engine_state::task_management::{task::Task, TaskManager};
//!
//! let mut task_manager = TaskManager::new();
//! task_manager.publish_task(10, 5, Task::ExpireNotification { id: 1 });
//!
//! assert!(task_manager.take_due(14).is_empty());
//! assert_eq!(task_manager.take_due(15), vec![Task::ExpireNotification { id: 1 }]);
//! ```

pub mod task;

use std::collections::BTreeMap;

use task::Task;

/// Deferred tasks keyed by the tick they fire on.
#[derive(Debug, Default)]
pub struct TaskManager {
    queued_tasks: BTreeMap<u64, Vec<Task>>,
}

impl TaskManager {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `task` to fire `delay` ticks after `now`.
    pub fn publish_task(&mut self, now: u64, delay: u64, task: Task) {
        self.queued_tasks.entry(now + delay).or_default().push(task);
    }

    /// Removes and returns every task due at or before `now`, oldest first.
    pub fn take_due(&mut self, now: u64) -> Vec<Task> {
        let later = self.queued_tasks.split_off(&(now + 1));
        let due = std::mem::replace(&mut self.queued_tasks, later);
        due.into_values().flatten().collect()
    }

    /// Number of tasks still waiting.
    pub fn len(&self) -> usize {
        self.queued_tasks.values().map(Vec::len).sum()
    }

    /// Whether nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.queued_tasks.is_empty()
    }

    /// Drops every waiting task.
    pub fn clear(&mut self) {
        self.queued_tasks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_tasks_come_back_in_tick_then_publish_order() {
        let mut tasks = TaskManager::new();
        tasks.publish_task(0, 3, Task::ExpireNotification { id: 2 });
        tasks.publish_task(0, 1, Task::ExpireNotification { id: 1 });
        tasks.publish_task(1, 2, Task::ExpireNotification { id: 3 });
        tasks.publish_task(0, 9, Task::ExpireNotification { id: 4 });
        assert_eq!(tasks.len(), 4);

        assert_eq!(tasks.take_due(0), vec![]);
        assert_eq!(
            tasks.take_due(3),
            vec![
                Task::ExpireNotification { id: 1 },
                Task::ExpireNotification { id: 2 },
                Task::ExpireNotification { id: 3 },
            ]
        );
        assert_eq!(tasks.len(), 1);
        assert!(!tasks.is_empty());
    }
}
