//! Core domain logic for TaskPulse.
//! Owns the task model, persistence, and the reminder scheduler that
//! every transport (HTTP, CLI) drives.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod scheduler;
pub mod service;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, ConfigError, Profile, StorageBackend};
pub use logging::{default_log_level, init_logging, init_stderr_logging, logging_status};
pub use model::task::{Mood, Priority, Task, TaskId, TaskStatus, TaskValidationError};
pub use model::time::TimeOfDay;
pub use repo::open_repository;
pub use repo::task_repo::{RepoError, RepoResult, SqliteTaskRepository, TaskRepository};
pub use scheduler::actions::{ActionHandler, ActionOutcome, NotificationAction};
pub use scheduler::dispatcher::{
    Channel, Notification, NotificationDispatcher, PermissionProvider, PresentError, Presenter,
};
pub use scheduler::evaluator::DueTaskEvaluator;
pub use scheduler::runner::run_scheduler;
pub use scheduler::session::SchedulerSession;
pub use scheduler::SchedulerSettings;
pub use service::stats::{compute_stats, TaskStats};
pub use service::task_service::{NewTask, ServiceError, TaskPatch, TaskService};
pub use store::TaskStore;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
