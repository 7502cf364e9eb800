//! Due-task evaluator.
//!
//! # Invariants
//! - Due means: pending, not notified, and `0 <= now - scheduled <= W`.
//! - Tasks later than `W` are missed and skipped without a back-dated
//!   reminder; they stay pending.
//! - Due tasks are marked and saved before they are returned.

use crate::model::task::Task;
use crate::repo::task_repo::RepoResult;
use crate::store::TaskStore;
use chrono::{Duration, NaiveDateTime};
use log::debug;

/// Where a task stands relative to `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueState {
    /// Completed or already notified.
    Ineligible,
    Upcoming,
    Due,
    /// Past the grace window.
    Missed,
}

#[derive(Debug, Clone, Copy)]
pub struct DueTaskEvaluator {
    grace_window: Duration,
}

impl DueTaskEvaluator {
    pub fn new(grace_window: Duration) -> Self {
        Self { grace_window }
    }

    pub fn grace_window(&self) -> Duration {
        self.grace_window
    }

    pub fn classify(&self, task: &Task, now: NaiveDateTime) -> DueState {
        if !task.is_eligible() {
            return DueState::Ineligible;
        }
        let elapsed = now - task.scheduled_datetime(now.date());
        if elapsed < Duration::zero() {
            DueState::Upcoming
        } else if elapsed <= self.grace_window {
            DueState::Due
        } else {
            DueState::Missed
        }
    }

    pub fn is_due(&self, task: &Task, now: NaiveDateTime) -> bool {
        self.classify(task, now) == DueState::Due
    }

    /// Marks every due task as notified, persists, and returns them.
    ///
    /// Returns an empty list without writing when nothing is due.
    pub fn evaluate(&self, store: &TaskStore, now: NaiveDateTime) -> RepoResult<Vec<Task>> {
        store.mutate(|tasks| {
            let mut due = Vec::new();
            for task in tasks.iter_mut() {
                match self.classify(task, now) {
                    DueState::Due => {
                        task.notified = true;
                        due.push(task.clone());
                    }
                    DueState::Missed => debug!(
                        "event=task_missed module=scheduler status=skip task_id={} scheduled_time={}",
                        task.id, task.scheduled_time
                    ),
                    DueState::Upcoming | DueState::Ineligible => {}
                }
            }
            let changed = !due.is_empty();
            (due, changed)
        })
    }
}

impl Default for DueTaskEvaluator {
    fn default() -> Self {
        Self::new(Duration::minutes(5))
    }
}

#[cfg(test)]
mod tests {
    use super::{DueState, DueTaskEvaluator};
    use crate::model::task::{parse_date, Task};
    use crate::model::time::TimeOfDay;
    use chrono::NaiveDateTime;

    fn at(time: &str) -> NaiveDateTime {
        TimeOfDay::parse(time)
            .unwrap()
            .on(parse_date("2026-03-02").unwrap())
    }

    fn task(time: &str) -> Task {
        Task::new("standup", TimeOfDay::parse(time).unwrap(), at("07:00"))
    }

    #[test]
    fn window_bounds_are_closed() {
        let evaluator = DueTaskEvaluator::default();
        let task = task("09:00");
        assert_eq!(evaluator.classify(&task, at("08:59")), DueState::Upcoming);
        assert_eq!(evaluator.classify(&task, at("09:00")), DueState::Due);
        assert_eq!(evaluator.classify(&task, at("09:05")), DueState::Due);
        assert_eq!(evaluator.classify(&task, at("09:06")), DueState::Missed);
    }

    #[test]
    fn notified_and_completed_tasks_are_ineligible() {
        let evaluator = DueTaskEvaluator::default();
        let mut notified = task("09:00");
        notified.notified = true;
        assert_eq!(evaluator.classify(&notified, at("09:01")), DueState::Ineligible);

        let mut done = task("09:00");
        done.complete(at("08:30"));
        assert_eq!(evaluator.classify(&done, at("09:01")), DueState::Ineligible);
    }

    #[test]
    fn future_deadline_date_keeps_task_upcoming() {
        let evaluator = DueTaskEvaluator::default();
        let mut task = task("09:00");
        task.deadline = Some(parse_date("2026-03-03").unwrap());
        assert_eq!(evaluator.classify(&task, at("09:02")), DueState::Upcoming);
    }
}
