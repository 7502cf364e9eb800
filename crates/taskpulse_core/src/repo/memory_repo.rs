//! Process-local task repository for the in-memory server variant.

use super::task_repo::{RepoError, RepoResult, TaskRepository};
use crate::model::task::{Task, TaskId, TaskStatus};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct MemoryState {
    tasks: Vec<Task>,
    history: Vec<Task>,
}

/// Keeps tasks in memory; contents are lost when the process exits.
#[derive(Default)]
pub struct InMemoryTaskRepository {
    state: Mutex<MemoryState>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the active list, e.g. from a fixture.
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                tasks,
                history: Vec::new(),
            }),
        }
    }

    fn state(&self) -> RepoResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| RepoError::Unavailable("in-memory task lock poisoned".to_string()))
    }
}

impl TaskRepository for InMemoryTaskRepository {
    fn list_tasks(&self) -> RepoResult<Vec<Task>> {
        Ok(self.state()?.tasks.clone())
    }

    fn save_tasks(&self, tasks: &[Task]) -> RepoResult<()> {
        for task in tasks {
            task.validate()?;
        }
        self.state()?.tasks = tasks.to_vec();
        Ok(())
    }

    fn list_history(&self) -> RepoResult<Vec<Task>> {
        Ok(self.state()?.history.clone())
    }

    fn append_history(&self, tasks: &[Task]) -> RepoResult<()> {
        self.state()?.history.extend_from_slice(tasks);
        Ok(())
    }

    fn relocate_completed(&self, ids: &[TaskId]) -> RepoResult<Vec<Task>> {
        let mut state = self.state()?;
        let (moved, kept): (Vec<Task>, Vec<Task>) =
            std::mem::take(&mut state.tasks).into_iter().partition(|task| {
                task.status == TaskStatus::Completed && ids.contains(&task.id)
            });
        state.tasks = kept;
        state.history.extend_from_slice(&moved);
        Ok(moved)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
