//! Single-writer task store.
//!
//! # Responsibility
//! - Serialize every read-modify-write of the active task list.
//! - Relocate finished tasks from the active list into history.
//!
//! # Invariants
//! - A mutation is persisted with one whole-store `save_tasks` call before
//!   `mutate` returns; callers may act on the result only afterwards.
//! - When the closure's changes cannot be saved, nothing is persisted.
//! - A relocation lands in history and leaves the active list together, or
//!   not at all.

use crate::model::task::{Task, TaskId};
use crate::repo::task_repo::{RepoError, RepoResult, TaskRepository};
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared handle over one repository.
pub struct TaskStore {
    repo: Arc<dyn TaskRepository>,
    write_lock: Mutex<()>,
}

impl TaskStore {
    pub fn new(repo: Arc<dyn TaskRepository>) -> Self {
        Self {
            repo,
            write_lock: Mutex::new(()),
        }
    }

    /// Current active tasks in store order.
    pub fn snapshot(&self) -> RepoResult<Vec<Task>> {
        self.repo.list_tasks()
    }

    pub fn find(&self, id: TaskId) -> RepoResult<Option<Task>> {
        Ok(self.snapshot()?.into_iter().find(|task| task.id == id))
    }

    pub fn history(&self) -> RepoResult<Vec<Task>> {
        self.repo.list_history()
    }

    pub fn backend_name(&self) -> &'static str {
        self.repo.backend_name()
    }

    /// Loads, applies `change`, and saves the whole list.
    ///
    /// The closure reports whether it changed anything; unchanged lists are
    /// not written back.
    pub fn mutate<R>(&self, change: impl FnOnce(&mut Vec<Task>) -> (R, bool)) -> RepoResult<R> {
        let _guard = self.lock()?;
        let mut tasks = self.repo.list_tasks()?;
        let (result, changed) = change(&mut tasks);
        if changed {
            self.repo.save_tasks(&tasks)?;
        }
        Ok(result)
    }

    /// Moves the given tasks from the active list into history.
    ///
    /// Only tasks that are still completed move; ids no longer present or
    /// reopened since are ignored. Returns the relocated tasks.
    pub fn relocate_to_history(&self, ids: &[TaskId]) -> RepoResult<Vec<Task>> {
        let _guard = self.lock()?;
        self.repo.relocate_completed(ids)
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| RepoError::Unavailable("task store write lock poisoned".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::TaskStore;
    use crate::model::task::Task;
    use crate::model::time::TimeOfDay;
    use crate::repo::memory_repo::InMemoryTaskRepository;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn sample(title: &str) -> Task {
        let created = NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        Task::new(title, TimeOfDay::from_hm(9, 0).unwrap(), created)
    }

    #[test]
    fn mutate_persists_only_when_changed() {
        let repo = Arc::new(InMemoryTaskRepository::new());
        let store = TaskStore::new(repo.clone());

        store
            .mutate(|tasks| {
                tasks.push(sample("discarded"));
                ((), false)
            })
            .unwrap();
        assert!(store.snapshot().unwrap().is_empty());

        let task = sample("stretch");
        store
            .mutate(|tasks| {
                tasks.push(task.clone());
                ((), true)
            })
            .unwrap();
        assert_eq!(store.snapshot().unwrap(), vec![task]);
    }

    #[test]
    fn relocate_moves_completed_tasks_and_ignores_unknown_ids() {
        let mut first = sample("first");
        first.complete(first.created_at);
        let second = sample("second");
        let repo = Arc::new(InMemoryTaskRepository::with_tasks(vec![
            first.clone(),
            second.clone(),
        ]));
        let store = TaskStore::new(repo);

        let moved = store
            .relocate_to_history(&[first.id, uuid::Uuid::now_v7()])
            .unwrap();
        assert_eq!(moved, vec![first.clone()]);
        assert_eq!(store.snapshot().unwrap(), vec![second]);
        assert_eq!(store.history().unwrap(), vec![first]);
    }

    #[test]
    fn relocate_leaves_pending_tasks_in_place() {
        let pending = sample("reopened");
        let repo = Arc::new(InMemoryTaskRepository::with_tasks(vec![pending.clone()]));
        let store = TaskStore::new(repo);

        assert!(store.relocate_to_history(&[pending.id]).unwrap().is_empty());
        assert_eq!(store.snapshot().unwrap(), vec![pending]);
        assert!(store.history().unwrap().is_empty());
    }
}
