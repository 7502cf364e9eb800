use std::sync::{Mutex, MutexGuard};
use taskpulse_core::{Channel, Notification, PresentError, Presenter, TaskId};

/// Open in-app notifications, newest last. One entry per task.
#[derive(Default)]
pub struct NotificationFeed {
    open: Mutex<Vec<Notification>>,
}

impl NotificationFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_notifications(&self) -> Vec<Notification> {
        self.entries().clone()
    }

    fn entries(&self) -> MutexGuard<'_, Vec<Notification>> {
        self.open
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Presenter for NotificationFeed {
    fn present(&self, notification: &Notification, _channel: Channel) -> Result<(), PresentError> {
        let mut entries = self.entries();
        entries.retain(|entry| entry.task_id != notification.task_id);
        entries.push(notification.clone());
        Ok(())
    }

    fn close(&self, task_id: TaskId, _channel: Channel) -> Result<(), PresentError> {
        self.entries().retain(|entry| entry.task_id != task_id);
        Ok(())
    }
}
