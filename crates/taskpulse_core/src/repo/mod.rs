//! Persistence contracts and implementations.
//!
//! # Responsibility
//! - Define the persistence collaborator consumed by the task store.
//! - Keep SQL and in-process storage details out of scheduling code.
//!
//! # Invariants
//! - `save_tasks` is a whole-store replacement: either every row lands or
//!   none does.
//! - Write paths validate tasks before touching storage.

pub mod memory_repo;
pub mod task_repo;

use crate::config::StorageBackend;
use memory_repo::InMemoryTaskRepository;
use std::path::Path;
use std::sync::Arc;
use task_repo::{RepoResult, SqliteTaskRepository, TaskRepository};

/// Opens the configured backend. `database_path` is ignored for `memory`.
pub fn open_repository(
    backend: StorageBackend,
    database_path: &Path,
) -> RepoResult<Arc<dyn TaskRepository>> {
    let repo: Arc<dyn TaskRepository> = match backend {
        StorageBackend::Sqlite => Arc::new(SqliteTaskRepository::open(database_path)?),
        StorageBackend::Memory => Arc::new(InMemoryTaskRepository::new()),
    };
    log::info!(
        "event=repo_open module=repo status=ok backend={}",
        repo.backend_name()
    );
    Ok(repo)
}
