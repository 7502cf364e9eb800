use chrono::{NaiveDate, NaiveDateTime};
use std::sync::Arc;
use taskpulse_core::repo::memory_repo::InMemoryTaskRepository;
use taskpulse_core::{
    compute_stats, DueTaskEvaluator, ManualClock, Mood, NewTask, Priority, SchedulerSettings,
    ServiceError, TaskPatch, TaskService, TaskStatus, TaskStore, TaskValidationError, TimeOfDay,
};

fn at(time: &str) -> NaiveDateTime {
    TimeOfDay::parse(time)
        .unwrap()
        .on(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap())
}

fn service() -> TaskService {
    let store = Arc::new(TaskStore::new(Arc::new(InMemoryTaskRepository::new())));
    TaskService::new(store, Arc::new(ManualClock::new(at("08:00"))))
}

#[test]
fn create_assigns_fresh_pending_task() {
    let service = service();
    let mut input = NewTask::new("  buy milk  ", TimeOfDay::parse("17:30").unwrap());
    input.priority = Priority::High;
    input.mood = Some(Mood::Routine);

    let task = service.create_task(input).unwrap();
    assert_eq!(task.title, "buy milk");
    assert_eq!(task.status, TaskStatus::Pending);
    assert!(!task.notified);
    assert_eq!(task.created_at, at("08:00"));
    assert_eq!(service.list_tasks().unwrap(), vec![task]);
}

#[test]
fn create_rejects_blank_title() {
    let err = service()
        .create_task(NewTask::new(" ", TimeOfDay::parse("09:00").unwrap()))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(TaskValidationError::EmptyTitle)
    ));
}

#[test]
fn retiming_rearms_a_notified_task() {
    let store = Arc::new(TaskStore::new(Arc::new(InMemoryTaskRepository::new())));
    let service = TaskService::new(store.clone(), Arc::new(ManualClock::new(at("08:00"))));
    let task = service
        .create_task(NewTask::new("call bank", TimeOfDay::parse("09:00").unwrap()))
        .unwrap();
    store
        .mutate(|tasks| {
            tasks[0].notified = true;
            ((), true)
        })
        .unwrap();

    let edited = service
        .update_task(
            task.id,
            TaskPatch {
                title: Some("call the bank".to_string()),
                ..TaskPatch::default()
            },
        )
        .unwrap();
    assert!(edited.notified, "title edits keep the reminder silenced");

    let retimed = service
        .update_task(
            task.id,
            TaskPatch {
                scheduled_time: Some(TimeOfDay::parse("10:15").unwrap()),
                ..TaskPatch::default()
            },
        )
        .unwrap();
    assert!(!retimed.notified);
    assert_eq!(retimed.title, "call the bank");
}

#[test]
fn resending_the_same_time_keeps_a_notified_task_silenced() {
    let store = Arc::new(TaskStore::new(Arc::new(InMemoryTaskRepository::new())));
    let service = TaskService::new(store.clone(), Arc::new(ManualClock::new(at("08:00"))));
    let evaluator = DueTaskEvaluator::new(SchedulerSettings::default().grace_window);
    let task = service
        .create_task(NewTask::new("water plants", TimeOfDay::parse("09:00").unwrap()))
        .unwrap();

    assert_eq!(evaluator.evaluate(&store, at("09:01")).unwrap().len(), 1);

    let edited = service
        .update_task(
            task.id,
            TaskPatch {
                title: Some("water the plants".to_string()),
                scheduled_time: Some(TimeOfDay::parse("09:00").unwrap()),
                ..TaskPatch::default()
            },
        )
        .unwrap();
    assert!(edited.notified);
    assert!(evaluator.evaluate(&store, at("09:02")).unwrap().is_empty());
}

#[test]
fn toggle_sets_and_clears_completion_time() {
    let service = service();
    let task = service
        .create_task(NewTask::new("read", TimeOfDay::parse("21:00").unwrap()))
        .unwrap();

    let done = service.toggle_status(task.id).unwrap();
    assert_eq!(done.status, TaskStatus::Completed);
    assert_eq!(done.completed_at, Some(at("08:00")));

    let reopened = service.toggle_status(task.id).unwrap();
    assert_eq!(reopened.status, TaskStatus::Pending);
    assert!(reopened.completed_at.is_none());
}

#[test]
fn unknown_ids_are_not_found() {
    let service = service();
    let id = uuid::Uuid::now_v7();
    assert!(matches!(service.get_task(id), Err(ServiceError::NotFound(_))));
    assert!(matches!(service.delete_task(id), Err(ServiceError::NotFound(_))));
    assert!(matches!(
        service.update_task(id, TaskPatch::default()),
        Err(ServiceError::NotFound(_))
    ));
}

#[test]
fn stats_cover_active_tasks() {
    let service = service();
    for time in ["09:00", "09:30", "14:00"] {
        service
            .create_task(NewTask::new("block", TimeOfDay::parse(time).unwrap()))
            .unwrap();
    }
    let first = service.list_tasks().unwrap()[0].id;
    service.toggle_status(first).unwrap();
    service.delete_task(service.list_tasks().unwrap()[2].id).unwrap();

    let stats = compute_stats(&service.list_tasks().unwrap(), &service.list_history().unwrap());
    assert_eq!(stats.total, 2);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.productivity_percent, 50);
    assert_eq!(stats.heatmap[9], 2);
    assert_eq!(stats.heatmap[14], 0);
}
