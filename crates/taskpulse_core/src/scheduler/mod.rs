//! Due-task detection, notification fan-out and action handling.
//!
//! # Responsibility
//! - Decide which pending tasks became due within the grace window.
//! - Present each due task on every enabled channel, best-effort.
//! - Turn user responses into store mutations.
//!
//! # Invariants
//! - Write-before-notify: `notified = true` is persisted before any channel
//!   sees the task, so a task is dispatched at most once per re-arm.
//! - No operation here is fatal; the worst outcome is a missed reminder.

use chrono::Duration;

pub mod actions;
pub mod dispatcher;
pub mod evaluator;
pub mod runner;
pub mod session;

/// Timing knobs for one scheduler session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// Evaluator cadence.
    pub poll_interval: std::time::Duration,
    /// How long after its scheduled minute a task still counts as due.
    pub grace_window: Duration,
    pub snooze_minutes: u32,
    /// Unanswered in-app notifications close after this long.
    pub modal_timeout: Duration,
    /// Delay between completing a task and relocating it to history.
    pub removal_delay: Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            poll_interval: std::time::Duration::from_secs(10),
            grace_window: Duration::minutes(5),
            snooze_minutes: 5,
            modal_timeout: Duration::seconds(30),
            removal_delay: Duration::milliseconds(2000),
        }
    }
}
