use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::sync::Arc;
use taskpulse_core::repo::memory_repo::InMemoryTaskRepository;
use taskpulse_core::{
    ActionHandler, ActionOutcome, Clock, DueTaskEvaluator, ManualClock, NotificationAction, Task,
    TaskStatus, TaskStore, TimeOfDay,
};

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

fn at(time: &str) -> NaiveDateTime {
    TimeOfDay::parse(time).unwrap().on(day())
}

fn task(time: &str) -> Task {
    Task::new("morning run", TimeOfDay::parse(time).unwrap(), at("06:00"))
}

fn store_with(tasks: Vec<Task>) -> TaskStore {
    TaskStore::new(Arc::new(InMemoryTaskRepository::with_tasks(tasks)))
}

#[test]
fn due_task_fires_exactly_once_until_rearmed() {
    let evaluator = DueTaskEvaluator::default();
    let task = task("09:00");
    let store = store_with(vec![task.clone()]);

    for minute in ["09:00", "09:01", "09:03", "09:05"] {
        let due = evaluator.evaluate(&store, at(minute)).unwrap();
        if minute == "09:00" {
            assert_eq!(due.len(), 1);
            assert_eq!(due[0].id, task.id);
            assert!(due[0].notified);
        } else {
            assert!(due.is_empty(), "fired again at {minute}");
        }
    }
}

#[test]
fn future_tasks_never_fire() {
    let evaluator = DueTaskEvaluator::default();
    let store = store_with(vec![task("09:00"), task("12:30"), task("23:59")]);

    assert!(evaluator.evaluate(&store, at("08:59")).unwrap().is_empty());
    assert!(store.snapshot().unwrap().iter().all(|task| !task.notified));
}

#[test]
fn tasks_older_than_grace_window_are_skipped_and_stay_pending() {
    let evaluator = DueTaskEvaluator::default();
    let store = store_with(vec![task("09:00"), task("07:30")]);

    assert!(evaluator.evaluate(&store, at("09:07")).unwrap().is_empty());
    for task in store.snapshot().unwrap() {
        assert!(!task.notified);
        assert_eq!(task.status, TaskStatus::Pending);
    }
}

#[test]
fn back_to_back_evaluations_are_idempotent() {
    let evaluator = DueTaskEvaluator::default();
    let store = store_with(vec![task("09:00"), task("09:01"), task("10:00")]);

    let first = evaluator.evaluate(&store, at("09:02")).unwrap();
    let second = evaluator.evaluate(&store, at("09:02")).unwrap();
    assert_eq!(first.len(), 2);
    assert!(second.is_empty());
}

#[test]
fn scenario_nine_oh_two_marks_due() {
    let evaluator = DueTaskEvaluator::default();
    let store = store_with(vec![task("09:00")]);

    let due = evaluator.evaluate(&store, at("09:02")).unwrap();
    assert_eq!(due.len(), 1);
    assert!(store.snapshot().unwrap()[0].notified);
}

#[test]
fn scenario_nine_oh_seven_is_missed() {
    let evaluator = DueTaskEvaluator::default();
    let store = store_with(vec![task("09:00")]);

    assert!(evaluator.evaluate(&store, at("09:07")).unwrap().is_empty());
    assert!(!store.snapshot().unwrap()[0].notified);
}

#[test]
fn snooze_then_advance_reproduces_due_outcome() {
    let evaluator = DueTaskEvaluator::default();
    let handler = ActionHandler::new(5, Duration::seconds(2));
    let clock = ManualClock::new(at("09:02"));
    let task = task("09:00");
    let store = store_with(vec![task.clone()]);

    let first = evaluator.evaluate(&store, clock.now()).unwrap();
    assert_eq!(first.len(), 1);

    handler
        .handle(
            &store,
            NotificationAction::Snooze {
                task_id: task.id,
                minutes: None,
            },
            clock.now(),
        )
        .unwrap();
    assert!(evaluator.evaluate(&store, clock.now()).unwrap().is_empty());

    clock.advance(Duration::minutes(5));
    let again = evaluator.evaluate(&store, clock.now()).unwrap();
    assert_eq!(again.len(), 1);
    assert_eq!(again[0].id, task.id);
}

#[test]
fn scenario_snooze_advances_time_and_rearms() {
    let evaluator = DueTaskEvaluator::default();
    let handler = ActionHandler::default();
    let task = task("09:00");
    let store = store_with(vec![task.clone()]);
    evaluator.evaluate(&store, at("09:01")).unwrap();

    let outcome = handler
        .handle(
            &store,
            NotificationAction::Snooze {
                task_id: task.id,
                minutes: Some(5),
            },
            at("09:01"),
        )
        .unwrap();

    let ActionOutcome::Snoozed { task: snoozed } = outcome else {
        panic!("unexpected outcome: {outcome:?}");
    };
    assert_eq!(snoozed.scheduled_time.to_string(), "09:05");
    assert!(!snoozed.notified);
    assert!(snoozed.is_eligible());
    assert_eq!(store.snapshot().unwrap(), vec![snoozed]);
}

#[test]
fn snooze_late_in_the_evening_still_fires_after_midnight() {
    let evaluator = DueTaskEvaluator::default();
    let handler = ActionHandler::default();
    let clock = ManualClock::new(at("23:58"));
    let task = task("23:57");
    let store = store_with(vec![task.clone()]);

    assert_eq!(evaluator.evaluate(&store, clock.now()).unwrap().len(), 1);
    handler
        .handle(
            &store,
            NotificationAction::Snooze {
                task_id: task.id,
                minutes: None,
            },
            clock.now(),
        )
        .unwrap();

    clock.advance(Duration::minutes(5));
    let due = evaluator.evaluate(&store, clock.now()).unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].scheduled_time.to_string(), "00:02");
}

#[test]
fn complete_marks_task_and_schedules_removal() {
    let handler = ActionHandler::new(5, Duration::seconds(2));
    let task = task("09:00");
    let store = store_with(vec![task.clone()]);

    let outcome = handler
        .handle(&store, NotificationAction::Complete { task_id: task.id }, at("09:01"))
        .unwrap();
    let ActionOutcome::Completed {
        task: completed,
        remove_at,
    } = outcome
    else {
        panic!("unexpected outcome: {outcome:?}");
    };
    assert_eq!(completed.status, TaskStatus::Completed);
    assert_eq!(completed.completed_at, Some(at("09:01")));
    assert_eq!(remove_at, at("09:01") + Duration::seconds(2));
}

#[test]
fn dismiss_leaves_task_notified_and_pending() {
    let evaluator = DueTaskEvaluator::default();
    let handler = ActionHandler::default();
    let task = task("09:00");
    let store = store_with(vec![task.clone()]);
    evaluator.evaluate(&store, at("09:00")).unwrap();
    let before = store.snapshot().unwrap();

    let outcome = handler
        .handle(&store, NotificationAction::Dismiss { task_id: task.id }, at("09:01"))
        .unwrap();
    assert_eq!(outcome, ActionOutcome::Dismissed { task_id: task.id });
    assert_eq!(store.snapshot().unwrap(), before);
    assert!(evaluator.evaluate(&store, at("09:02")).unwrap().is_empty());
}

#[test]
fn unknown_task_id_is_a_noop() {
    let handler = ActionHandler::default();
    let store = store_with(vec![task("09:00")]);
    let before = store.snapshot().unwrap();
    let missing = uuid::Uuid::now_v7();

    for action in [
        NotificationAction::Complete { task_id: missing },
        NotificationAction::Snooze {
            task_id: missing,
            minutes: None,
        },
        NotificationAction::Dismiss { task_id: missing },
    ] {
        let outcome = handler.handle(&store, action, at("09:01")).unwrap();
        assert_eq!(outcome, ActionOutcome::TaskMissing { task_id: missing });
    }
    assert_eq!(store.snapshot().unwrap(), before);
}

#[test]
fn snooze_on_completed_task_is_ignored() {
    let handler = ActionHandler::default();
    let mut done = task("09:00");
    done.complete(at("08:00"));
    let store = store_with(vec![done.clone()]);

    let outcome = handler
        .handle(
            &store,
            NotificationAction::Snooze {
                task_id: done.id,
                minutes: None,
            },
            at("09:01"),
        )
        .unwrap();
    assert!(matches!(outcome, ActionOutcome::Ignored { .. }));
    assert_eq!(store.snapshot().unwrap(), vec![done]);
}
