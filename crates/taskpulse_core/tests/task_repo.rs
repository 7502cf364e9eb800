use chrono::{NaiveDate, NaiveDateTime};
use taskpulse_core::db::open_db_in_memory;
use taskpulse_core::repo::memory_repo::InMemoryTaskRepository;
use taskpulse_core::{
    Mood, Priority, RepoError, SqliteTaskRepository, Task, TaskRepository, TaskValidationError,
    TimeOfDay,
};

fn created() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 2)
        .unwrap()
        .and_hms_opt(7, 30, 0)
        .unwrap()
}

fn task(title: &str, time: &str) -> Task {
    Task::new(title, TimeOfDay::parse(time).unwrap(), created())
}

fn detailed_task() -> Task {
    let mut task = task("quarterly report", "16:45");
    task.priority = Priority::High;
    task.mood = Some(Mood::Challenging);
    task.deadline = NaiveDate::from_ymd_opt(2026, 3, 5);
    task.notified = true;
    task
}

fn repositories() -> Vec<Box<dyn TaskRepository>> {
    vec![
        Box::new(SqliteTaskRepository::new(open_db_in_memory().unwrap())),
        Box::new(InMemoryTaskRepository::new()),
    ]
}

#[test]
fn save_tasks_replaces_whole_list_and_keeps_order() {
    for repo in repositories() {
        let first = task("first", "10:00");
        let second = detailed_task();
        let third = task("third", "08:00");

        repo.save_tasks(&[first.clone(), second.clone(), third.clone()])
            .unwrap();
        assert_eq!(
            repo.list_tasks().unwrap(),
            vec![first.clone(), second.clone(), third],
            "backend {}",
            repo.backend_name()
        );

        repo.save_tasks(&[second.clone()]).unwrap();
        assert_eq!(repo.list_tasks().unwrap(), vec![second]);
    }
}

#[test]
fn completed_task_keeps_completion_timestamp() {
    for repo in repositories() {
        let mut done = task("laundry", "11:00");
        done.complete(created());
        repo.save_tasks(&[done.clone()]).unwrap();

        let loaded = repo.list_tasks().unwrap();
        assert_eq!(loaded[0].completed_at, Some(created()));
        assert_eq!(loaded, vec![done]);
    }
}

#[test]
fn invalid_task_is_rejected_and_nothing_is_written() {
    for repo in repositories() {
        let kept = task("kept", "09:00");
        repo.save_tasks(&[kept.clone()]).unwrap();

        let mut blank = task("placeholder", "09:30");
        blank.title = "   ".to_string();
        let err = repo.save_tasks(&[kept.clone(), blank]).unwrap_err();
        assert!(matches!(
            err,
            RepoError::Validation(TaskValidationError::EmptyTitle)
        ));
        assert_eq!(repo.list_tasks().unwrap(), vec![kept]);
    }
}

#[test]
fn history_accumulates_in_append_order() {
    for repo in repositories() {
        let mut first = task("first", "09:00");
        first.complete(created());
        let mut second = detailed_task();
        second.complete(created());

        repo.append_history(&[first.clone()]).unwrap();
        repo.append_history(&[second.clone()]).unwrap();

        assert_eq!(repo.list_history().unwrap(), vec![first, second]);
        assert!(repo.list_tasks().unwrap().is_empty());
    }
}

#[test]
fn relocate_completed_moves_only_completed_tasks() {
    for repo in repositories() {
        let mut done = task("done", "08:00");
        done.complete(created());
        let pending = task("pending", "09:00");
        let mut other_done = task("other", "10:00");
        other_done.complete(created());
        repo.save_tasks(&[done.clone(), pending.clone(), other_done.clone()])
            .unwrap();

        let moved = repo.relocate_completed(&[done.id, pending.id]).unwrap();
        assert_eq!(moved, vec![done.clone()], "backend {}", repo.backend_name());
        assert_eq!(repo.list_tasks().unwrap(), vec![pending, other_done]);
        assert_eq!(repo.list_history().unwrap(), vec![done]);
    }
}

#[test]
fn failed_sqlite_relocation_rolls_back_history() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.db");
    let mut done = task("done", "08:00");
    done.complete(created());

    let repo = SqliteTaskRepository::open(&path).unwrap();
    repo.save_tasks(&[done.clone()]).unwrap();

    let blocker = rusqlite::Connection::open(&path).unwrap();
    blocker
        .execute_batch(
            "CREATE TRIGGER block_task_delete BEFORE DELETE ON tasks
             BEGIN SELECT RAISE(ABORT, 'tasks are read-only'); END;",
        )
        .unwrap();

    for _ in 0..2 {
        assert!(repo.relocate_completed(&[done.id]).is_err());
    }
    assert_eq!(repo.list_tasks().unwrap(), vec![done]);
    assert!(repo.list_history().unwrap().is_empty());
}

#[test]
fn timestamps_keep_sub_second_precision() {
    for repo in repositories() {
        let mut done = task("laundry", "11:00");
        let completed = created() + chrono::Duration::milliseconds(1_234);
        done.complete(completed);
        repo.save_tasks(&[done]).unwrap();

        assert_eq!(repo.list_tasks().unwrap()[0].completed_at, Some(completed));
    }
}

#[test]
fn sqlite_file_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.db");
    let stored = detailed_task();

    {
        let repo = SqliteTaskRepository::open(&path).unwrap();
        repo.save_tasks(&[stored.clone()]).unwrap();
    }

    let reopened = SqliteTaskRepository::open(&path).unwrap();
    assert_eq!(reopened.list_tasks().unwrap(), vec![stored]);
    assert_eq!(reopened.backend_name(), "sqlite");
}

#[test]
fn corrupt_row_is_reported_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO tasks (id, position, title, scheduled_time, priority, status, notified, created_at)
         VALUES ('not-a-uuid', 0, 'x', '09:00', 'medium', 'pending', 0, '2026-03-02 07:30:00');",
        [],
    )
    .unwrap();
    let repo = SqliteTaskRepository::new(conn);

    assert!(matches!(
        repo.list_tasks().unwrap_err(),
        RepoError::InvalidData(_)
    ));
}
