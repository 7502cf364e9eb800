//! User responses to a reminder.
//!
//! # Responsibility
//! - Define the one typed message every channel translates its callbacks
//!   into.
//! - Apply the matching store mutation.
//!
//! # Invariants
//! - An unknown task id is a no-op, never an error.
//! - Snooze only applies to pending tasks and always re-arms `notified`.
//! - Dismiss never writes to the store.

use crate::model::task::{Task, TaskId};
use crate::repo::task_repo::RepoResult;
use crate::store::TaskStore;
use chrono::{Duration, NaiveDateTime};
use log::info;
use serde::{Deserialize, Serialize};

/// Response delivered by any presentation channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NotificationAction {
    Complete {
        #[serde(rename = "taskId")]
        task_id: TaskId,
    },
    Snooze {
        #[serde(rename = "taskId")]
        task_id: TaskId,
        /// Overrides the configured snooze length when present.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minutes: Option<u32>,
    },
    Dismiss {
        #[serde(rename = "taskId")]
        task_id: TaskId,
    },
}

impl NotificationAction {
    pub fn task_id(&self) -> TaskId {
        match self {
            Self::Complete { task_id }
            | Self::Snooze { task_id, .. }
            | Self::Dismiss { task_id } => *task_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Complete { .. } => "complete",
            Self::Snooze { .. } => "snooze",
            Self::Dismiss { .. } => "dismiss",
        }
    }
}

/// What an action did to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Completed; the task leaves the active list at `remove_at`.
    Completed { task: Task, remove_at: NaiveDateTime },
    Snoozed { task: Task },
    Dismissed { task_id: TaskId },
    /// The task exists but the action does not apply to its state.
    Ignored { task_id: TaskId, reason: &'static str },
    TaskMissing { task_id: TaskId },
}

impl ActionOutcome {
    pub fn task_id(&self) -> TaskId {
        match self {
            Self::Completed { task, .. } | Self::Snoozed { task } => task.id,
            Self::Dismissed { task_id }
            | Self::Ignored { task_id, .. }
            | Self::TaskMissing { task_id } => *task_id,
        }
    }
}

/// Applies [`NotificationAction`]s to the store.
#[derive(Debug, Clone, Copy)]
pub struct ActionHandler {
    snooze_minutes: u32,
    removal_delay: Duration,
}

impl ActionHandler {
    pub fn new(snooze_minutes: u32, removal_delay: Duration) -> Self {
        Self {
            snooze_minutes,
            removal_delay,
        }
    }

    pub fn snooze_minutes(&self) -> u32 {
        self.snooze_minutes
    }

    pub fn handle(
        &self,
        store: &TaskStore,
        action: NotificationAction,
        now: NaiveDateTime,
    ) -> RepoResult<ActionOutcome> {
        let outcome = match action {
            NotificationAction::Complete { task_id } => store.mutate(|tasks| {
                let Some(task) = tasks.iter_mut().find(|task| task.id == task_id) else {
                    return (ActionOutcome::TaskMissing { task_id }, false);
                };
                task.complete(now);
                (
                    ActionOutcome::Completed {
                        task: task.clone(),
                        remove_at: now + self.removal_delay,
                    },
                    true,
                )
            })?,
            NotificationAction::Snooze { task_id, minutes } => {
                let minutes = minutes
                    .filter(|minutes| *minutes > 0)
                    .unwrap_or(self.snooze_minutes);
                store.mutate(|tasks| {
                    let Some(task) = tasks.iter_mut().find(|task| task.id == task_id) else {
                        return (ActionOutcome::TaskMissing { task_id }, false);
                    };
                    if !task.is_pending() {
                        return (
                            ActionOutcome::Ignored {
                                task_id,
                                reason: "not_pending",
                            },
                            false,
                        );
                    }
                    task.snooze(minutes, now.date());
                    (ActionOutcome::Snoozed { task: task.clone() }, true)
                })?
            }
            NotificationAction::Dismiss { task_id } => match store.find(task_id)? {
                Some(_) => ActionOutcome::Dismissed { task_id },
                None => ActionOutcome::TaskMissing { task_id },
            },
        };

        info!(
            "event=notification_action module=scheduler status={} action={} task_id={}",
            outcome_status(&outcome),
            action.kind(),
            action.task_id()
        );
        Ok(outcome)
    }
}

impl Default for ActionHandler {
    fn default() -> Self {
        Self::new(5, Duration::milliseconds(2000))
    }
}

fn outcome_status(outcome: &ActionOutcome) -> &'static str {
    match outcome {
        ActionOutcome::Completed { .. } | ActionOutcome::Snoozed { .. } | ActionOutcome::Dismissed { .. } => "ok",
        ActionOutcome::Ignored { .. } => "ignored",
        ActionOutcome::TaskMissing { .. } => "missing",
    }
}

#[cfg(test)]
mod tests {
    use super::NotificationAction;
    use uuid::Uuid;

    #[test]
    fn actions_use_tagged_wire_shape() {
        let id = Uuid::now_v7();
        let raw = format!(r#"{{"type":"snooze","taskId":"{id}"}}"#);
        let action: NotificationAction = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            action,
            NotificationAction::Snooze {
                task_id: id,
                minutes: None
            }
        );

        let value = serde_json::to_value(NotificationAction::Complete { task_id: id }).unwrap();
        assert_eq!(value["type"], "complete");
        assert_eq!(value["taskId"], id.to_string());
    }

    #[test]
    fn unknown_action_type_is_rejected() {
        let raw = format!(r#"{{"type":"explode","taskId":"{}"}}"#, Uuid::now_v7());
        assert!(serde_json::from_str::<NotificationAction>(&raw).is_err());
    }
}
