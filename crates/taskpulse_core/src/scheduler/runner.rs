//! Async driver for a [`SchedulerSession`].
//!
//! The loop owns the poll timer. Cancelling the token stops the timer; a
//! presenter call already in progress is not interrupted.

use super::actions::NotificationAction;
use super::session::SchedulerSession;
use chrono::NaiveDateTime;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Drives `session` until `cancel` fires.
///
/// Evaluates once at start, then every `poll_interval`. Actions received on
/// `actions` are applied as they arrive; the loop keeps polling after the
/// sender side is dropped. Transports that call
/// [`SchedulerSession::handle_action`] directly pass `None`.
pub async fn run_scheduler(
    session: Arc<SchedulerSession>,
    mut actions: Option<mpsc::Receiver<NotificationAction>>,
    poll_interval: Duration,
    cancel: CancellationToken,
) {
    if let Err(err) = session.start() {
        warn!("event=scheduler_tick module=scheduler status=error error={err}");
    }

    let mut interval = tokio::time::interval(poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately and `start` already evaluated.
    interval.tick().await;

    let mut actions_open = actions.is_some();
    loop {
        let housekeeping_delay = session
            .next_deadline()
            .map(|deadline| until(deadline, session.now()));

        tokio::select! {
            _ = cancel.cancelled() => {
                info!("event=scheduler_stop module=scheduler status=ok");
                break;
            }
            _ = interval.tick() => {
                match session.tick() {
                    Ok(report) if !report.dispatched.is_empty() => debug!(
                        "event=scheduler_tick module=scheduler status=ok dispatched={}",
                        report.dispatched.len()
                    ),
                    Ok(_) => {}
                    Err(err) => warn!("event=scheduler_tick module=scheduler status=error error={err}"),
                }
            }
            received = next_action(&mut actions), if actions_open => {
                match received {
                    Some(action) => {
                        if let Err(err) = session.handle_action(action) {
                            warn!(
                                "event=notification_action module=scheduler status=error action={} task_id={} error={err}",
                                action.kind(),
                                action.task_id()
                            );
                        }
                    }
                    None => {
                        debug!("event=action_channel_closed module=scheduler status=ok");
                        actions_open = false;
                    }
                }
            }
            _ = session.wake().notified() => {}
            _ = sleep_for(housekeeping_delay), if housekeeping_delay.is_some() => {
                session.housekeeping();
            }
        }
    }
}

async fn next_action(
    actions: &mut Option<mpsc::Receiver<NotificationAction>>,
) -> Option<NotificationAction> {
    match actions {
        Some(rx) => rx.recv().await,
        None => None,
    }
}

fn until(deadline: NaiveDateTime, now: NaiveDateTime) -> Duration {
    (deadline - now).to_std().unwrap_or(Duration::ZERO)
}

async fn sleep_for(delay: Option<Duration>) {
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
}
