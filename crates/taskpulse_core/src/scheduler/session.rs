//! One active scheduling session.
//!
//! # Responsibility
//! - Own the evaluator, dispatcher and action handler for a store.
//! - Run one evaluation cycle per `tick` and the timed housekeeping between
//!   ticks (modal auto-close, delayed relocation of completed tasks).
//!
//! # Invariants
//! - A persistence error aborts the current cycle before any dispatch.
//! - Completed tasks are relocated no earlier than their `remove_at`.

use super::actions::{ActionHandler, ActionOutcome, NotificationAction};
use super::dispatcher::{DispatchReport, NotificationDispatcher};
use super::evaluator::DueTaskEvaluator;
use super::SchedulerSettings;
use crate::clock::Clock;
use crate::model::task::TaskId;
use crate::repo::task_repo::RepoResult;
use crate::store::TaskStore;
use chrono::NaiveDateTime;
use log::{info, warn};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingRemoval {
    task_id: TaskId,
    remove_at: NaiveDateTime,
}

/// Result of one evaluation cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub dispatched: Vec<DispatchReport>,
    pub housekeeping: HousekeepingReport,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HousekeepingReport {
    pub expired_modals: Vec<TaskId>,
    pub relocated: Vec<TaskId>,
}

pub struct SchedulerSession {
    store: Arc<TaskStore>,
    clock: Arc<dyn Clock>,
    evaluator: DueTaskEvaluator,
    dispatcher: NotificationDispatcher,
    handler: ActionHandler,
    removals: Mutex<Vec<PendingRemoval>>,
    wake: Notify,
}

impl SchedulerSession {
    pub fn new(
        store: Arc<TaskStore>,
        clock: Arc<dyn Clock>,
        dispatcher: NotificationDispatcher,
        settings: &SchedulerSettings,
    ) -> Self {
        Self {
            store,
            clock,
            evaluator: DueTaskEvaluator::new(settings.grace_window),
            dispatcher,
            handler: ActionHandler::new(settings.snooze_minutes, settings.removal_delay),
            removals: Mutex::new(Vec::new()),
            wake: Notify::new(),
        }
    }

    pub fn store(&self) -> &Arc<TaskStore> {
        &self.store
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher {
        &self.dispatcher
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    /// Session start: ask for native permission, then evaluate immediately.
    pub fn start(&self) -> RepoResult<TickReport> {
        self.dispatcher.request_permission();
        info!(
            "event=scheduler_start module=scheduler status=ok backend={}",
            self.store.backend_name()
        );
        self.tick()
    }

    /// One evaluation cycle.
    pub fn tick(&self) -> RepoResult<TickReport> {
        let now = self.clock.now();
        let housekeeping = self.housekeeping_at(now);
        let due = self.evaluator.evaluate(&self.store, now)?;
        let dispatched = due
            .iter()
            .map(|task| self.dispatcher.dispatch(task, now))
            .collect();
        Ok(TickReport {
            dispatched,
            housekeeping,
        })
    }

    /// Closes expired modals and relocates completed tasks whose delay has
    /// passed.
    pub fn housekeeping(&self) -> HousekeepingReport {
        self.housekeeping_at(self.clock.now())
    }

    /// Applies a user response and closes the task's open notifications.
    pub fn handle_action(&self, action: NotificationAction) -> RepoResult<ActionOutcome> {
        let outcome = self.handler.handle(&self.store, action, self.clock.now())?;
        self.dispatcher.acknowledge(outcome.task_id());
        if let ActionOutcome::Completed { task, remove_at } = &outcome {
            self.removals().push(PendingRemoval {
                task_id: task.id,
                remove_at: *remove_at,
            });
            self.wake.notify_one();
        }
        Ok(outcome)
    }

    /// Earliest instant housekeeping has work to do.
    pub fn next_deadline(&self) -> Option<NaiveDateTime> {
        let removal = self.removals().iter().map(|removal| removal.remove_at).min();
        match (removal, self.dispatcher.next_modal_expiry()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Woken whenever `next_deadline` may have moved earlier.
    pub fn wake(&self) -> &Notify {
        &self.wake
    }

    fn housekeeping_at(&self, now: NaiveDateTime) -> HousekeepingReport {
        let expired_modals = self.dispatcher.expire_modals(now);

        let ready: Vec<TaskId> = self
            .removals()
            .iter()
            .filter(|removal| removal.remove_at <= now)
            .map(|removal| removal.task_id)
            .collect();
        if ready.is_empty() {
            return HousekeepingReport {
                expired_modals,
                relocated: Vec::new(),
            };
        }

        match self.store.relocate_to_history(&ready) {
            Ok(moved) => {
                // Tasks reopened since completion are not moved; their
                // removal is dropped with the rest.
                self.removals()
                    .retain(|removal| !ready.contains(&removal.task_id));
                info!(
                    "event=task_relocate module=scheduler status=ok count={}",
                    moved.len()
                );
                HousekeepingReport {
                    expired_modals,
                    relocated: moved.into_iter().map(|task| task.id).collect(),
                }
            }
            Err(err) => {
                // Removals stay queued and are retried next time.
                warn!("event=task_relocate module=scheduler status=error error={err}");
                HousekeepingReport {
                    expired_modals,
                    relocated: Vec::new(),
                }
            }
        }
    }

    fn removals(&self) -> MutexGuard<'_, Vec<PendingRemoval>> {
        self.removals
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
