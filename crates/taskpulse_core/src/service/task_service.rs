//! Task CRUD use cases.
//!
//! # Responsibility
//! - Create, edit, toggle, delete and read tasks through the single-writer
//!   store.
//!
//! # Invariants
//! - New tasks start `pending` and not notified.
//! - Re-timing a task always re-arms its reminder.
//! - Unknown ids are reported as `NotFound`; only the notification action
//!   handler treats them as a no-op.

use crate::clock::Clock;
use crate::model::task::{
    validate_title, Mood, Priority, Task, TaskId, TaskStatus, TaskValidationError,
};
use crate::model::time::TimeOfDay;
use crate::repo::task_repo::RepoError;
use crate::store::TaskStore;
use chrono::NaiveDate;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    NotFound(TaskId),
    Validation(TaskValidationError),
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<TaskValidationError> for ServiceError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Input for task creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub scheduled_time: TimeOfDay,
    pub priority: Priority,
    pub mood: Option<Mood>,
    pub deadline: Option<NaiveDate>,
}

impl NewTask {
    pub fn new(title: impl Into<String>, scheduled_time: TimeOfDay) -> Self {
        Self {
            title: title.into(),
            scheduled_time,
            priority: Priority::default(),
            mood: None,
            deadline: None,
        }
    }
}

/// Partial edit. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub scheduled_time: Option<TimeOfDay>,
    pub priority: Option<Priority>,
    pub mood: Option<Mood>,
    pub deadline: Option<NaiveDate>,
    /// Drops the date anchor so the task is evaluated against "today".
    pub clear_deadline: bool,
    pub status: Option<TaskStatus>,
}

/// CRUD service over the shared store.
pub struct TaskService {
    store: Arc<TaskStore>,
    clock: Arc<dyn Clock>,
}

impl TaskService {
    pub fn new(store: Arc<TaskStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn list_tasks(&self) -> ServiceResult<Vec<Task>> {
        Ok(self.store.snapshot()?)
    }

    pub fn list_history(&self) -> ServiceResult<Vec<Task>> {
        Ok(self.store.history()?)
    }

    pub fn get_task(&self, id: TaskId) -> ServiceResult<Task> {
        self.store.find(id)?.ok_or(ServiceError::NotFound(id))
    }

    /// Appends a new pending task to the store.
    pub fn create_task(&self, input: NewTask) -> ServiceResult<Task> {
        validate_title(&input.title)?;

        let mut task = Task::new(input.title.trim(), input.scheduled_time, self.clock.now());
        task.priority = input.priority;
        task.mood = input.mood;
        task.deadline = input.deadline;

        let created = task.clone();
        self.store.mutate(move |tasks| {
            tasks.push(task);
            ((), true)
        })?;
        info!(
            "event=task_create module=service status=ok task_id={} scheduled_time={}",
            created.id, created.scheduled_time
        );
        Ok(created)
    }

    /// Applies a partial edit.
    pub fn update_task(&self, id: TaskId, patch: TaskPatch) -> ServiceResult<Task> {
        if let Some(title) = patch.title.as_deref() {
            validate_title(title)?;
        }
        let now = self.clock.now();

        let updated = self.store.mutate(|tasks| {
            let Some(task) = tasks.iter_mut().find(|task| task.id == id) else {
                return (None, false);
            };
            if let Some(title) = patch.title {
                task.title = title.trim().to_string();
            }
            // Resending the same time must not re-arm the reminder.
            if let Some(time) = patch
                .scheduled_time
                .filter(|time| *time != task.scheduled_time)
            {
                task.set_scheduled_time(time);
            }
            if let Some(priority) = patch.priority {
                task.priority = priority;
            }
            if let Some(mood) = patch.mood {
                task.mood = Some(mood);
            }
            if patch.clear_deadline {
                task.deadline = None;
            } else if let Some(deadline) = patch.deadline {
                task.deadline = Some(deadline);
            }
            if let Some(status) = patch.status {
                task.set_status(status, now);
            }
            (Some(task.clone()), true)
        })?;

        let task = updated.ok_or(ServiceError::NotFound(id))?;
        info!("event=task_update module=service status=ok task_id={id}");
        Ok(task)
    }

    /// Flips pending and completed.
    pub fn toggle_status(&self, id: TaskId) -> ServiceResult<Task> {
        let now = self.clock.now();
        let toggled = self.store.mutate(|tasks| {
            let Some(task) = tasks.iter_mut().find(|task| task.id == id) else {
                return (None, false);
            };
            match task.status {
                TaskStatus::Pending => task.complete(now),
                TaskStatus::Completed => task.reopen(),
            }
            (Some(task.clone()), true)
        })?;

        let task = toggled.ok_or(ServiceError::NotFound(id))?;
        info!(
            "event=task_toggle module=service status=ok task_id={id} task_status={}",
            task.status.as_str()
        );
        Ok(task)
    }

    pub fn delete_task(&self, id: TaskId) -> ServiceResult<()> {
        let removed = self.store.mutate(|tasks| {
            let before = tasks.len();
            tasks.retain(|task| task.id != id);
            let removed = tasks.len() != before;
            (removed, removed)
        })?;

        if !removed {
            return Err(ServiceError::NotFound(id));
        }
        info!("event=task_delete module=service status=ok task_id={id}");
        Ok(())
    }
}
