//! Dashboard statistics.

use crate::model::task::{Task, TaskStatus};
use serde::Serialize;

/// Completion ratio and per-hour load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    /// Rounded `completed / total * 100`, `0` for an empty set.
    pub productivity_percent: u32,
    /// Number of tasks scheduled in each hour of the day.
    pub heatmap: [u32; 24],
}

/// Computes stats over the active list and the history together.
pub fn compute_stats(active: &[Task], history: &[Task]) -> TaskStats {
    let mut heatmap = [0u32; 24];
    let mut completed = 0usize;
    let mut pending = 0usize;

    for task in active.iter().chain(history) {
        match task.status {
            TaskStatus::Completed => completed += 1,
            TaskStatus::Pending => pending += 1,
        }
        heatmap[task.scheduled_time.hour() as usize] += 1;
    }

    let total = completed + pending;
    let productivity_percent = if total == 0 {
        0
    } else {
        ((completed as f64 / total as f64) * 100.0).round() as u32
    };

    TaskStats {
        total,
        completed,
        pending,
        productivity_percent,
        heatmap,
    }
}

#[cfg(test)]
mod tests {
    use super::compute_stats;
    use crate::model::task::Task;
    use crate::model::time::TimeOfDay;
    use chrono::NaiveDate;

    fn task(hour: u32) -> Task {
        let created = NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(7, 0, 0)
            .unwrap();
        Task::new("stat", TimeOfDay::from_hm(hour, 15).unwrap(), created)
    }

    #[test]
    fn empty_input_has_zero_productivity() {
        let stats = compute_stats(&[], &[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.productivity_percent, 0);
        assert!(stats.heatmap.iter().all(|count| *count == 0));
    }

    #[test]
    fn counts_history_as_completed_work() {
        let active = vec![task(9), task(9)];
        let mut done = task(17);
        done.complete(done.created_at);

        let stats = compute_stats(&active, &[done]);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.productivity_percent, 33);
        assert_eq!(stats.heatmap[9], 2);
        assert_eq!(stats.heatmap[17], 1);
    }
}
