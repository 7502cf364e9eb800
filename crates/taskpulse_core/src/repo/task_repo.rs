//! Task repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide list/save over the active task list and append/list over the
//!   completed-task history.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Store order is preserved through the `position` column.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::task::{Mood, Priority, Task, TaskId, TaskStatus, TaskValidationError};
use crate::model::time::TimeOfDay;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

// `%.f` keeps sub-second precision and still reads whole-second rows.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const DATE_FORMAT: &str = "%Y-%m-%d";

const TASK_COLUMNS: &str = "id, title, scheduled_time, priority, status, notified, completed_at, mood, deadline, created_at";

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence failure.
#[derive(Debug)]
pub enum RepoError {
    Validation(TaskValidationError),
    Db(DbError),
    InvalidData(String),
    /// Backend cannot serve requests right now (lock poisoned, I/O down).
    Unavailable(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
            Self::Unavailable(message) => write!(f, "task storage unavailable: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidData(_) | Self::Unavailable(_) => None,
        }
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence collaborator for the task store.
pub trait TaskRepository: Send + Sync {
    /// Active tasks in store order.
    fn list_tasks(&self) -> RepoResult<Vec<Task>>;
    /// Replaces the whole active task list.
    fn save_tasks(&self, tasks: &[Task]) -> RepoResult<()>;
    /// Relocated tasks, oldest first.
    fn list_history(&self) -> RepoResult<Vec<Task>>;
    fn append_history(&self, tasks: &[Task]) -> RepoResult<()>;
    /// Moves the completed tasks among `ids` from the active list into
    /// history as one atomic step and returns them.
    ///
    /// Unknown ids and tasks that are no longer completed are left alone.
    fn relocate_completed(&self, ids: &[TaskId]) -> RepoResult<Vec<Task>>;
    /// Short backend label for diagnostics (`sqlite`, `memory`).
    fn backend_name(&self) -> &'static str;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository {
    conn: Mutex<Connection>,
}

impl SqliteTaskRepository {
    /// Wraps an already-migrated connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Opens and migrates the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    pub fn open_in_memory() -> RepoResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    fn conn(&self) -> RepoResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| RepoError::Unavailable("sqlite connection lock poisoned".to_string()))
    }
}

impl TaskRepository for SqliteTaskRepository {
    fn list_tasks(&self) -> RepoResult<Vec<Task>> {
        let conn = self.conn()?;
        query_tasks(&conn, "tasks", "position")
    }

    fn save_tasks(&self, tasks: &[Task]) -> RepoResult<()> {
        for task in tasks {
            task.validate()?;
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM tasks;", [])?;
        {
            let mut insert = tx.prepare(&format!(
                "INSERT INTO tasks (position, {TASK_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);"
            ))?;
            for (position, task) in tasks.iter().enumerate() {
                insert.execute(params![
                    position as i64,
                    task.id.to_string(),
                    task.title.as_str(),
                    task.scheduled_time.to_string(),
                    task.priority.as_str(),
                    task.status.as_str(),
                    bool_to_int(task.notified),
                    task.completed_at.map(format_timestamp),
                    task.mood.map(Mood::as_str),
                    task.deadline.map(format_date),
                    format_timestamp(task.created_at),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn list_history(&self) -> RepoResult<Vec<Task>> {
        let conn = self.conn()?;
        query_tasks(&conn, "task_history", "seq")
    }

    fn append_history(&self, tasks: &[Task]) -> RepoResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        insert_history(&tx, tasks)?;
        tx.commit()?;
        Ok(())
    }

    fn relocate_completed(&self, ids: &[TaskId]) -> RepoResult<Vec<Task>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let moved: Vec<Task> = query_tasks(&tx, "tasks", "position")?
            .into_iter()
            .filter(|task| task.status == TaskStatus::Completed && ids.contains(&task.id))
            .collect();
        if moved.is_empty() {
            return Ok(moved);
        }

        insert_history(&tx, &moved)?;
        {
            let mut delete = tx.prepare("DELETE FROM tasks WHERE id = ?1;")?;
            for task in &moved {
                delete.execute(params![task.id.to_string()])?;
            }
        }
        tx.commit()?;
        Ok(moved)
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

fn query_tasks(conn: &Connection, table: &str, order_by: &str) -> RepoResult<Vec<Task>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM {table} ORDER BY {order_by} ASC;"
    ))?;
    let mut rows = stmt.query([])?;
    let mut tasks = Vec::new();
    while let Some(row) = rows.next()? {
        tasks.push(parse_task_row(row)?);
    }
    Ok(tasks)
}

fn insert_history(conn: &Connection, tasks: &[Task]) -> RepoResult<()> {
    let mut insert = conn.prepare(&format!(
        "INSERT INTO task_history ({TASK_COLUMNS})
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);"
    ))?;
    for task in tasks {
        insert.execute(params![
            task.id.to_string(),
            task.title.as_str(),
            task.scheduled_time.to_string(),
            task.priority.as_str(),
            task.status.as_str(),
            bool_to_int(task.notified),
            task.completed_at.map(format_timestamp),
            task.mood.map(Mood::as_str),
            task.deadline.map(format_date),
            format_timestamp(task.created_at),
        ])?;
    }
    Ok(())
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text)
        .map_err(|_| RepoError::InvalidData(format!("invalid task id `{id_text}`")))?;

    let time_text: String = row.get("scheduled_time")?;
    let scheduled_time = TimeOfDay::parse(&time_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid scheduled_time `{time_text}` for task {id}"))
    })?;

    let priority_text: String = row.get("priority")?;
    let priority = Priority::parse(&priority_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid priority `{priority_text}` for task {id}"))
    })?;

    let status_text: String = row.get("status")?;
    let status = TaskStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid status `{status_text}` for task {id}"))
    })?;

    let notified = match row.get::<_, i64>("notified")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid notified flag `{other}` for task {id}"
            )));
        }
    };

    let mood = match row.get::<_, Option<String>>("mood")? {
        Some(value) => Some(Mood::parse(&value).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid mood `{value}` for task {id}"))
        })?),
        None => None,
    };

    let deadline = match row.get::<_, Option<String>>("deadline")? {
        Some(value) => Some(NaiveDate::parse_from_str(&value, DATE_FORMAT).map_err(|_| {
            RepoError::InvalidData(format!("invalid deadline `{value}` for task {id}"))
        })?),
        None => None,
    };

    let completed_at = match row.get::<_, Option<String>>("completed_at")? {
        Some(value) => Some(parse_timestamp(&value, id)?),
        None => None,
    };
    let created_text: String = row.get("created_at")?;
    let created_at = parse_timestamp(&created_text, id)?;

    let task = Task {
        id,
        title: row.get("title")?,
        scheduled_time,
        priority,
        status,
        notified,
        completed_at,
        mood,
        deadline,
        created_at,
    };
    task.validate()?;
    Ok(task)
}

fn parse_timestamp(value: &str, id: Uuid) -> RepoResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map_err(|_| RepoError::InvalidData(format!("invalid timestamp `{value}` for task {id}")))
}

fn format_timestamp(value: NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

fn format_date(value: NaiveDate) -> String {
    value.format(DATE_FORMAT).to_string()
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
