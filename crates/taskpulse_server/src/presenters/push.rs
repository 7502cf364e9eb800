//! Push delivery for the native channel.
//!
//! # Invariants
//! - Permission exists exactly while at least one endpoint is subscribed.
//! - Delivery is fire-and-forget; a failing endpoint is logged and kept.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};
use taskpulse_core::scheduler::dispatcher::ActionKind;
use taskpulse_core::{Channel, Notification, PermissionProvider, PresentError, Presenter, TaskId};
use tokio::runtime::Handle;

/// Registered push endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSubscription {
    pub endpoint: String,
}

/// JSON body POSTed to each endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    pub tag: String,
    pub task_id: TaskId,
    pub snooze_minutes: u32,
    pub actions: Vec<ActionKind>,
}

impl PushPayload {
    pub fn from_notification(notification: &Notification) -> Self {
        Self {
            title: notification.title.clone(),
            body: notification.body.clone(),
            tag: notification.tag.clone(),
            task_id: notification.task_id,
            snooze_minutes: notification.snooze_minutes,
            // Push cards offer the two actions that mutate the task.
            actions: vec![ActionKind::Complete, ActionKind::Snooze],
        }
    }
}

pub struct PushOutbox {
    client: reqwest::Client,
    runtime: Handle,
    subscriptions: Mutex<Vec<PushSubscription>>,
}

impl PushOutbox {
    pub fn new(client: reqwest::Client, runtime: Handle) -> Self {
        Self {
            client,
            runtime,
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    /// Adds `subscription`; re-subscribing the same endpoint is a no-op.
    /// Returns the number of subscriptions.
    pub fn subscribe(&self, subscription: PushSubscription) -> usize {
        let mut subscriptions = self.subscriptions();
        if !subscriptions.contains(&subscription) {
            subscriptions.push(subscription);
            info!(
                "event=push_subscribe module=server status=ok count={}",
                subscriptions.len()
            );
        }
        subscriptions.len()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions().len()
    }

    fn subscriptions(&self) -> MutexGuard<'_, Vec<PushSubscription>> {
        self.subscriptions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PermissionProvider for PushOutbox {
    fn has_permission(&self) -> bool {
        self.subscription_count() > 0
    }

    /// Permission is granted by the client subscribing; nothing to prompt.
    fn request_permission(&self) -> bool {
        self.has_permission()
    }
}

impl Presenter for PushOutbox {
    fn present(&self, notification: &Notification, _channel: Channel) -> Result<(), PresentError> {
        let endpoints: Vec<String> = self
            .subscriptions()
            .iter()
            .map(|subscription| subscription.endpoint.clone())
            .collect();
        if endpoints.is_empty() {
            return Err(PresentError::new("no push subscriptions"));
        }

        let payload = PushPayload::from_notification(notification);
        for endpoint in endpoints {
            let client = self.client.clone();
            let payload = payload.clone();
            self.runtime.spawn(async move {
                match client.post(&endpoint).json(&payload).send().await {
                    Ok(response) if response.status().is_success() => debug!(
                        "event=push_deliver module=server status=ok task_id={}",
                        payload.task_id
                    ),
                    Ok(response) => warn!(
                        "event=push_deliver module=server status=error task_id={} http_status={}",
                        payload.task_id,
                        response.status()
                    ),
                    Err(err) => warn!(
                        "event=push_deliver module=server status=error task_id={} error={err}",
                        payload.task_id
                    ),
                }
            });
        }
        Ok(())
    }
}
