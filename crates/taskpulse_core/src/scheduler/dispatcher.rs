//! Notification fan-out.
//!
//! # Responsibility
//! - Present one due task on the native, modal and cue channels.
//! - Track open in-app notifications so they can auto-close.
//!
//! # Invariants
//! - Channels are independent: an error or skip on one never prevents the
//!   others from being attempted.
//! - Presentation errors are logged and swallowed, never returned.
//! - The native channel is skipped silently without permission.
//! - The dispatcher does not deduplicate; the evaluator already guarantees
//!   at-most-once per re-arm.

use crate::model::task::{Mood, Priority, Task, TaskId};
use crate::model::time::TimeOfDay;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard};

/// Presentation channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// OS/browser notification. Needs permission.
    Native,
    /// In-app notification card with action controls.
    Modal,
    /// Sound/vibration. Fire-and-forget.
    Cue,
}

impl Channel {
    /// Fan-out order.
    pub const ALL: [Channel; 3] = [Channel::Native, Channel::Modal, Channel::Cue];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Modal => "modal",
            Self::Cue => "cue",
        }
    }
}

/// Action control offered on a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Complete,
    Snooze,
    Dismiss,
}

/// Everything a channel needs to render a reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub task_id: TaskId,
    /// Stable per-task tag so a channel can replace or close its entry.
    pub tag: String,
    pub title: String,
    pub body: String,
    pub scheduled_time: TimeOfDay,
    pub priority: Priority,
    pub mood: Option<Mood>,
    pub deadline: Option<NaiveDate>,
    pub snooze_minutes: u32,
    pub actions: Vec<ActionKind>,
    pub presented_at: NaiveDateTime,
}

impl Notification {
    pub fn for_task(task: &Task, snooze_minutes: u32, presented_at: NaiveDateTime) -> Self {
        let mut body = format!(
            "Time: {} · Priority: {}",
            task.scheduled_time,
            task.priority.as_str()
        );
        if let Some(mood) = task.mood {
            body.push_str(&format!(" · Mood: {} {}", mood.emoji(), mood.as_str()));
        }
        if let Some(deadline) = task.deadline {
            body.push_str(&format!(" · Deadline: {deadline}"));
        }

        Self {
            task_id: task.id,
            tag: format!("task-{}", task.id),
            title: task.title.clone(),
            body,
            scheduled_time: task.scheduled_time,
            priority: task.priority,
            mood: task.mood,
            deadline: task.deadline,
            snooze_minutes,
            actions: vec![ActionKind::Complete, ActionKind::Snooze, ActionKind::Dismiss],
            presented_at,
        }
    }
}

/// Failure reported by a presentation collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentError(pub String);

impl PresentError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl Display for PresentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "presentation failed: {}", self.0)
    }
}

impl Error for PresentError {}

/// Presentation collaborator.
pub trait Presenter: Send + Sync {
    fn present(&self, notification: &Notification, channel: Channel) -> Result<(), PresentError>;

    /// Withdraws a previously presented notification.
    fn close(&self, _task_id: TaskId, _channel: Channel) -> Result<(), PresentError> {
        Ok(())
    }
}

/// Permission collaborator for the native channel.
pub trait PermissionProvider: Send + Sync {
    fn has_permission(&self) -> bool;
    /// Asks for permission; may need a user gesture and may be denied.
    fn request_permission(&self) -> bool;
}

/// Permission that never changes.
#[derive(Debug, Clone, Copy)]
pub struct StaticPermission(pub bool);

impl PermissionProvider for StaticPermission {
    fn has_permission(&self) -> bool {
        self.0
    }

    fn request_permission(&self) -> bool {
        self.0
    }
}

/// Why a channel was not attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoPresenter,
    PermissionDenied,
}

/// Per-dispatch outcome, for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchReport {
    pub task_id: TaskId,
    pub delivered: Vec<Channel>,
    pub skipped: Vec<(Channel, SkipReason)>,
    pub failed: Vec<Channel>,
}

#[derive(Debug, Clone, Copy)]
struct OpenModal {
    task_id: TaskId,
    expires_at: NaiveDateTime,
}

/// Fans a due task out to the registered presenters.
pub struct NotificationDispatcher {
    presenters: BTreeMap<Channel, Arc<dyn Presenter>>,
    permission: Arc<dyn PermissionProvider>,
    snooze_minutes: u32,
    modal_timeout: Duration,
    open_modals: Mutex<Vec<OpenModal>>,
}

impl NotificationDispatcher {
    pub fn new(permission: Arc<dyn PermissionProvider>, snooze_minutes: u32, modal_timeout: Duration) -> Self {
        Self {
            presenters: BTreeMap::new(),
            permission,
            snooze_minutes,
            modal_timeout,
            open_modals: Mutex::new(Vec::new()),
        }
    }

    /// Routes `channel` to `presenter`, replacing any previous one.
    pub fn with_presenter(mut self, channel: Channel, presenter: Arc<dyn Presenter>) -> Self {
        self.presenters.insert(channel, presenter);
        self
    }

    pub fn channels(&self) -> Vec<Channel> {
        self.presenters.keys().copied().collect()
    }

    /// Best-effort permission request; the answer is only logged.
    pub fn request_permission(&self) -> bool {
        if self.permission.has_permission() {
            return true;
        }
        let granted = self.permission.request_permission();
        info!(
            "event=permission_request module=dispatcher status={} channel=native",
            if granted { "ok" } else { "denied" }
        );
        granted
    }

    /// Presents `task` on every channel.
    pub fn dispatch(&self, task: &Task, now: NaiveDateTime) -> DispatchReport {
        let notification = Notification::for_task(task, self.snooze_minutes, now);
        let mut report = DispatchReport {
            task_id: task.id,
            delivered: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        };

        for channel in Channel::ALL {
            let Some(presenter) = self.presenters.get(&channel) else {
                report.skipped.push((channel, SkipReason::NoPresenter));
                continue;
            };
            if channel == Channel::Native && !self.permission.has_permission() {
                debug!(
                    "event=notification_present module=dispatcher status=skip channel=native task_id={} reason=permission",
                    task.id
                );
                report.skipped.push((channel, SkipReason::PermissionDenied));
                continue;
            }

            match presenter.present(&notification, channel) {
                Ok(()) => {
                    if channel == Channel::Modal {
                        self.track_modal(task.id, now + self.modal_timeout);
                    }
                    report.delivered.push(channel);
                }
                Err(err) => {
                    warn!(
                        "event=notification_present module=dispatcher status=error channel={} task_id={} error={err}",
                        channel.as_str(),
                        task.id
                    );
                    report.failed.push(channel);
                }
            }
        }

        info!(
            "event=notification_dispatch module=dispatcher status=ok task_id={} delivered={} skipped={} failed={}",
            task.id,
            report.delivered.len(),
            report.skipped.len(),
            report.failed.len()
        );
        report
    }

    /// Closes the task's native and modal entries after a user response.
    pub fn acknowledge(&self, task_id: TaskId) {
        self.modals().retain(|modal| modal.task_id != task_id);
        for channel in [Channel::Native, Channel::Modal] {
            self.close(task_id, channel);
        }
    }

    /// Closes in-app notifications whose timeout elapsed. The tasks are
    /// left untouched.
    pub fn expire_modals(&self, now: NaiveDateTime) -> Vec<TaskId> {
        let expired: Vec<TaskId> = {
            let mut modals = self.modals();
            let expired = modals
                .iter()
                .filter(|modal| modal.expires_at <= now)
                .map(|modal| modal.task_id)
                .collect();
            modals.retain(|modal| modal.expires_at > now);
            expired
        };

        for task_id in &expired {
            self.close(*task_id, Channel::Modal);
            debug!("event=modal_expire module=dispatcher status=ok task_id={task_id}");
        }
        expired
    }

    pub fn next_modal_expiry(&self) -> Option<NaiveDateTime> {
        self.modals().iter().map(|modal| modal.expires_at).min()
    }

    pub fn open_modal_ids(&self) -> Vec<TaskId> {
        self.modals().iter().map(|modal| modal.task_id).collect()
    }

    fn track_modal(&self, task_id: TaskId, expires_at: NaiveDateTime) {
        let mut modals = self.modals();
        modals.retain(|modal| modal.task_id != task_id);
        modals.push(OpenModal {
            task_id,
            expires_at,
        });
    }

    fn close(&self, task_id: TaskId, channel: Channel) {
        let Some(presenter) = self.presenters.get(&channel) else {
            return;
        };
        if let Err(err) = presenter.close(task_id, channel) {
            warn!(
                "event=notification_close module=dispatcher status=error channel={} task_id={task_id} error={err}",
                channel.as_str()
            );
        }
    }

    fn modals(&self) -> MutexGuard<'_, Vec<OpenModal>> {
        // The modal list stays consistent even if a holder panicked.
        self.open_modals
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::parse_date;

    #[derive(Default)]
    struct Recording {
        presented: Mutex<Vec<(TaskId, Channel)>>,
        closed: Mutex<Vec<(TaskId, Channel)>>,
        fail_on: Option<Channel>,
    }

    impl Presenter for Recording {
        fn present(&self, notification: &Notification, channel: Channel) -> Result<(), PresentError> {
            if self.fail_on == Some(channel) {
                return Err(PresentError::new("unsupported"));
            }
            self.presented
                .lock()
                .unwrap()
                .push((notification.task_id, channel));
            Ok(())
        }

        fn close(&self, task_id: TaskId, channel: Channel) -> Result<(), PresentError> {
            self.closed.lock().unwrap().push((task_id, channel));
            Ok(())
        }
    }

    fn at(time: &str) -> NaiveDateTime {
        TimeOfDay::parse(time)
            .unwrap()
            .on(parse_date("2026-03-02").unwrap())
    }

    fn due_task() -> Task {
        let mut task = Task::new("call mom", TimeOfDay::parse("09:00").unwrap(), at("07:00"));
        task.mood = Some(Mood::Dreading);
        task
    }

    fn dispatcher(permission: bool, presenter: Arc<Recording>) -> NotificationDispatcher {
        NotificationDispatcher::new(Arc::new(StaticPermission(permission)), 5, Duration::seconds(30))
            .with_presenter(Channel::Native, presenter.clone())
            .with_presenter(Channel::Modal, presenter.clone())
            .with_presenter(Channel::Cue, presenter)
    }

    #[test]
    fn native_is_skipped_without_permission_but_modal_still_fires() {
        let presenter = Arc::new(Recording::default());
        let report = dispatcher(false, presenter.clone()).dispatch(&due_task(), at("09:01"));

        assert_eq!(report.delivered, vec![Channel::Modal, Channel::Cue]);
        assert_eq!(
            report.skipped,
            vec![(Channel::Native, SkipReason::PermissionDenied)]
        );
        assert_eq!(presenter.presented.lock().unwrap().len(), 2);
    }

    #[test]
    fn failing_channel_does_not_block_others() {
        let presenter = Arc::new(Recording {
            fail_on: Some(Channel::Native),
            ..Recording::default()
        });
        let report = dispatcher(true, presenter).dispatch(&due_task(), at("09:01"));
        assert_eq!(report.failed, vec![Channel::Native]);
        assert_eq!(report.delivered, vec![Channel::Modal, Channel::Cue]);
    }

    #[test]
    fn modal_expires_after_timeout() {
        let presenter = Arc::new(Recording::default());
        let dispatcher = dispatcher(true, presenter.clone());
        let task = due_task();
        dispatcher.dispatch(&task, at("09:01"));

        assert_eq!(dispatcher.next_modal_expiry(), Some(at("09:01") + Duration::seconds(30)));
        assert!(dispatcher
            .expire_modals(at("09:01") + Duration::seconds(29))
            .is_empty());
        assert_eq!(
            dispatcher.expire_modals(at("09:01") + Duration::seconds(30)),
            vec![task.id]
        );
        assert!(dispatcher.open_modal_ids().is_empty());
        assert_eq!(
            presenter.closed.lock().unwrap().as_slice(),
            &[(task.id, Channel::Modal)]
        );
    }

    #[test]
    fn notification_carries_full_task_detail() {
        let mut task = due_task();
        task.deadline = Some(parse_date("2026-03-02").unwrap());
        let notification = Notification::for_task(&task, 5, at("09:00"));
        assert_eq!(notification.tag, format!("task-{}", task.id));
        assert!(notification.body.contains("09:00"));
        assert!(notification.body.contains("dreading"));
        assert!(notification.body.contains("2026-03-02"));
        assert_eq!(notification.actions.len(), 3);
    }
}
