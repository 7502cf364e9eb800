//! Task record and lifecycle helpers.
//!
//! # Responsibility
//! - Define the canonical `Task` shape persisted by the store and sent over
//!   the wire.
//! - Provide the only mutation paths for re-timing and completion so the
//!   lifecycle invariants cannot be bypassed.
//!
//! # Invariants
//! - `id` is assigned once at creation and never reused.
//! - A task is eligible for dispatch only when `status == Pending` and
//!   `notified == false`.
//! - `completed_at` is `Some` exactly when `status == Completed`.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

use super::time::TimeOfDay;

/// Stable task identifier (time-ordered UUIDv7).
pub type TaskId = Uuid;

/// Maximum accepted title length, in characters.
pub const MAX_TITLE_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[serde(alias = "Low", alias = "LOW")]
    Low,
    #[default]
    #[serde(alias = "Medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "High", alias = "HIGH")]
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Case-insensitive parse.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// How the user felt about a task when creating it. Shown in reminders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Excited,
    Neutral,
    Dreading,
    Challenging,
    Routine,
}

impl Mood {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Excited => "excited",
            Self::Neutral => "neutral",
            Self::Dreading => "dreading",
            Self::Challenging => "challenging",
            Self::Routine => "routine",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "excited" => Some(Self::Excited),
            "neutral" => Some(Self::Neutral),
            "dreading" => Some(Self::Dreading),
            "challenging" => Some(Self::Challenging),
            "routine" => Some(Self::Routine),
            _ => None,
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Self::Excited => "😃",
            Self::Neutral => "😐",
            Self::Dreading => "😫",
            Self::Challenging => "💡",
            Self::Routine => "🔁",
        }
    }
}

/// Field-level validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    EmptyTitle,
    TitleTooLong { chars: usize, max: usize },
    InvalidTime(String),
    InvalidPriority(String),
    InvalidMood(String),
    InvalidDate(String),
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "task title cannot be empty"),
            Self::TitleTooLong { chars, max } => {
                write!(f, "task title has {chars} characters; maximum is {max}")
            }
            Self::InvalidTime(value) => {
                write!(f, "invalid time `{value}`; expected HH:MM (00:00-23:59)")
            }
            Self::InvalidPriority(value) => {
                write!(f, "invalid priority `{value}`; expected low|medium|high")
            }
            Self::InvalidMood(value) => write!(
                f,
                "invalid mood `{value}`; expected excited|neutral|dreading|challenging|routine"
            ),
            Self::InvalidDate(value) => write!(f, "invalid date `{value}`; expected YYYY-MM-DD"),
        }
    }
}

impl Error for TaskValidationError {}

/// Scheduled task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    /// Re-time through [`Task::set_scheduled_time`] so `notified` is reset.
    pub scheduled_time: TimeOfDay,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: TaskStatus,
    /// True once a reminder fired for the current `scheduled_time`.
    #[serde(default)]
    pub notified: bool,
    #[serde(default)]
    pub completed_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub mood: Option<Mood>,
    /// Calendar date the task is anchored to. `None` means "today".
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
}

impl Task {
    /// Creates a pending, not-yet-notified task with a fresh id.
    pub fn new(title: impl Into<String>, scheduled_time: TimeOfDay, created_at: NaiveDateTime) -> Self {
        Self::with_id(Uuid::now_v7(), title, scheduled_time, created_at)
    }

    /// Creates a task with a caller-provided id (import paths, tests).
    pub fn with_id(
        id: TaskId,
        title: impl Into<String>,
        scheduled_time: TimeOfDay,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            scheduled_time,
            priority: Priority::default(),
            status: TaskStatus::Pending,
            notified: false,
            completed_at: None,
            mood: None,
            deadline: None,
            created_at,
        }
    }

    /// Checks title rules. Time and enums are valid by construction.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        validate_title(&self.title)
    }

    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }

    /// Whether the evaluator may consider this task at all.
    pub fn is_eligible(&self) -> bool {
        self.is_pending() && !self.notified
    }

    /// Re-times the task and re-arms its reminder.
    pub fn set_scheduled_time(&mut self, time: TimeOfDay) {
        self.scheduled_time = time;
        self.notified = false;
    }

    /// Absolute due instant when evaluated on `today`.
    pub fn scheduled_datetime(&self, today: NaiveDate) -> NaiveDateTime {
        self.scheduled_time.on(self.deadline.unwrap_or(today))
    }

    /// Pushes the due time forward by `minutes` and re-arms the reminder.
    ///
    /// Crossing midnight moves the date anchor forward so the reminder is
    /// not lost to the grace-window policy.
    pub fn snooze(&mut self, minutes: u32, today: NaiveDate) {
        let (time, days) = self.scheduled_time.add_minutes(minutes);
        if days > 0 {
            let anchor = self.deadline.unwrap_or(today);
            self.deadline = Some(anchor + Duration::days(i64::from(days)));
        }
        self.set_scheduled_time(time);
    }

    pub fn complete(&mut self, at: NaiveDateTime) {
        self.status = TaskStatus::Completed;
        self.completed_at = Some(at);
    }

    pub fn reopen(&mut self) {
        self.status = TaskStatus::Pending;
        self.completed_at = None;
    }

    /// Applies a status while keeping `completed_at` consistent.
    pub fn set_status(&mut self, status: TaskStatus, at: NaiveDateTime) {
        match (self.status, status) {
            (TaskStatus::Pending, TaskStatus::Completed) => self.complete(at),
            (TaskStatus::Completed, TaskStatus::Pending) => self.reopen(),
            _ => {}
        }
    }
}

/// Trims and checks a title.
pub fn validate_title(title: &str) -> Result<(), TaskValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(TaskValidationError::EmptyTitle);
    }
    let chars = trimmed.chars().count();
    if chars > MAX_TITLE_CHARS {
        return Err(TaskValidationError::TitleTooLong {
            chars,
            max: MAX_TITLE_CHARS,
        });
    }
    Ok(())
}

/// Parses a `YYYY-MM-DD` calendar date.
pub fn parse_date(value: &str) -> Result<NaiveDate, TaskValidationError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| TaskValidationError::InvalidDate(value.trim().to_string()))
}
