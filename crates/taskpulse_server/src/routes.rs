//! REST surface.
//!
//! CRUD routes are passthroughs to [`TaskService`]; only the action routes
//! reach the scheduler.

use crate::app::AppState;
use crate::error::ApiError;
use crate::presenters::PushSubscription;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use taskpulse_core::model::task::parse_date;
use taskpulse_core::scheduler::dispatcher::ActionKind;
use taskpulse_core::{
    compute_stats, ActionOutcome, Clock, Mood, NewTask, Notification, NotificationAction, Priority, Task,
    TaskId, TaskPatch, TaskStats, TaskStatus, TaskValidationError, TimeOfDay,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/:id",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/api/tasks/:id/actions", post(task_action))
        .route("/api/actions", post(action))
        .route("/api/notifications", get(list_notifications))
        .route("/api/history", get(list_history))
        .route("/api/stats", get(stats))
        .route("/api/push/subscribe", post(subscribe))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: String,
    pub scheduled_time: String,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
}

/// Partial update. An empty `deadline` string clears the date anchor.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub scheduled_time: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Body of `POST /api/tasks/:id/actions`.
#[derive(Debug, Deserialize)]
pub struct TaskActionRequest {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    #[serde(default)]
    pub minutes: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    pub outcome: &'static str,
    pub task_id: TaskId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<Task>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_at: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

impl From<ActionOutcome> for ActionResponse {
    fn from(value: ActionOutcome) -> Self {
        let task_id = value.task_id();
        let (outcome, task, remove_at, reason) = match value {
            ActionOutcome::Completed { task, remove_at } => {
                ("completed", Some(task), Some(remove_at), None)
            }
            ActionOutcome::Snoozed { task } => ("snoozed", Some(task), None, None),
            ActionOutcome::Dismissed { .. } => ("dismissed", None, None, None),
            ActionOutcome::Ignored { reason, .. } => ("ignored", None, None, Some(reason)),
            ActionOutcome::TaskMissing { .. } => ("task_missing", None, None, None),
        };
        Self {
            outcome,
            task_id,
            task,
            remove_at,
            reason,
        }
    }
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": taskpulse_core::core_version(),
        "uptime_secs": state.started_at.elapsed().as_secs(),
        "timestamp": state.clock.now().format("%Y-%m-%dT%H:%M:%S").to_string(),
        "storage": state.session.store().backend_name(),
    }))
}

async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<Task>>, ApiError> {
    Ok(Json(state.service.list_tasks()?))
}

async fn get_task(
    Path(id): Path<TaskId>,
    State(state): State<AppState>,
) -> Result<Json<Task>, ApiError> {
    Ok(Json(state.service.get_task(id)?))
}

async fn create_task(
    State(state): State<AppState>,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let mut input = NewTask::new(payload.title, TimeOfDay::parse(&payload.scheduled_time)?);
    if let Some(priority) = payload.priority.as_deref() {
        input.priority = parse_priority(priority)?;
    }
    input.mood = payload.mood.as_deref().map(parse_mood).transpose()?;
    input.deadline = payload.deadline.as_deref().map(parse_date).transpose()?;

    let task = state.service.create_task(input)?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task(
    Path(id): Path<TaskId>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    let mut patch = TaskPatch {
        title: payload.title,
        ..TaskPatch::default()
    };
    patch.scheduled_time = payload
        .scheduled_time
        .as_deref()
        .map(TimeOfDay::parse)
        .transpose()?;
    patch.priority = payload.priority.as_deref().map(parse_priority).transpose()?;
    patch.mood = payload.mood.as_deref().map(parse_mood).transpose()?;
    match payload.deadline.as_deref().map(str::trim) {
        Some("") => patch.clear_deadline = true,
        Some(value) => patch.deadline = Some(parse_date(value)?),
        None => {}
    }
    if let Some(status) = payload.status.as_deref() {
        patch.status = Some(
            TaskStatus::parse(status)
                .ok_or_else(|| ApiError::bad_request(format!("invalid status `{status}`")))?,
        );
    }

    Ok(Json(state.service.update_task(id, patch)?))
}

async fn delete_task(
    Path(id): Path<TaskId>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    state.service.delete_task(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn task_action(
    Path(id): Path<TaskId>,
    State(state): State<AppState>,
    Json(payload): Json<TaskActionRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    let action = match payload.kind {
        ActionKind::Complete => NotificationAction::Complete { task_id: id },
        ActionKind::Snooze => NotificationAction::Snooze {
            task_id: id,
            minutes: payload.minutes,
        },
        ActionKind::Dismiss => NotificationAction::Dismiss { task_id: id },
    };
    apply_action(&state, action)
}

/// Channel-agnostic entry point taking the tagged action message.
async fn action(
    State(state): State<AppState>,
    Json(action): Json<NotificationAction>,
) -> Result<Json<ActionResponse>, ApiError> {
    apply_action(&state, action)
}

fn apply_action(
    state: &AppState,
    action: NotificationAction,
) -> Result<Json<ActionResponse>, ApiError> {
    let outcome = state.session.handle_action(action)?;
    Ok(Json(outcome.into()))
}

async fn list_notifications(State(state): State<AppState>) -> Json<Vec<Notification>> {
    Json(state.feed.open_notifications())
}

async fn list_history(State(state): State<AppState>) -> Result<Json<Vec<Task>>, ApiError> {
    Ok(Json(state.service.list_history()?))
}

async fn stats(State(state): State<AppState>) -> Result<Json<TaskStats>, ApiError> {
    let active = state.service.list_tasks()?;
    let history = state.service.list_history()?;
    Ok(Json(compute_stats(&active, &history)))
}

async fn subscribe(
    State(state): State<AppState>,
    Json(subscription): Json<PushSubscription>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let endpoint = subscription.endpoint.trim();
    if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
        return Err(ApiError::bad_request("push endpoint must be an http(s) URL"));
    }
    let count = state.push.subscribe(PushSubscription {
        endpoint: endpoint.to_string(),
    });
    Ok((StatusCode::CREATED, Json(json!({ "subscriptions": count }))))
}

fn parse_priority(value: &str) -> Result<Priority, TaskValidationError> {
    Priority::parse(value).ok_or_else(|| TaskValidationError::InvalidPriority(value.to_string()))
}

fn parse_mood(value: &str) -> Result<Mood, TaskValidationError> {
    Mood::parse(value).ok_or_else(|| TaskValidationError::InvalidMood(value.to_string()))
}
