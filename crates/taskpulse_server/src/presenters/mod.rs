//! Server-side presentation collaborators.
//!
//! - modal: [`NotificationFeed`], polled by the web client.
//! - native: [`PushOutbox`], web-push style delivery to subscribed endpoints.
//! - cue: [`LogCue`], a log line the client has no other way to observe.

mod feed;
mod push;

pub use feed::NotificationFeed;
pub use push::{PushOutbox, PushPayload, PushSubscription};

use log::info;
use taskpulse_core::{Channel, Notification, PresentError, Presenter};

/// Cue channel for headless deployments.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogCue;

impl Presenter for LogCue {
    fn present(&self, notification: &Notification, channel: Channel) -> Result<(), PresentError> {
        info!(
            "event=notification_cue module=server status=ok channel={} task_id={} priority={}",
            channel.as_str(),
            notification.task_id,
            notification.priority.as_str()
        );
        Ok(())
    }
}
