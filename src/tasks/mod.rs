//! CRUD façade over the task table. Mutations keep today's daily record in
//! sync and feed the achievement engine on qualifying completions.

use crate::achievements::{self, EngineEvent};
use crate::calendar;
use crate::db::{Database, Task, TaskFilter};
use anyhow::{Result, bail};
use chrono::{DateTime, Local};

pub fn add(database: &Database, title: &str, description: &str, now: DateTime<Local>) -> Result<Task> {
    if title.trim().is_empty() {
        bail!("Task title must not be empty");
    }

    let task = database.insert_task(title.trim(), description.trim(), now.timestamp())?;
    calendar::update_today_task_stats(database, now)?;

    Ok(task)
}

/// Marks a task completed. Only a false -> true transition updates the daily
/// record and runs the achievement checks; completing an already-completed
/// task changes nothing.
pub fn complete(
    database: &mut Database,
    id: i64,
    now: DateTime<Local>,
) -> Result<(Task, Vec<EngineEvent>)> {
    let Some(task) = database.task_by_id(id)? else {
        bail!("Task not found: {id}");
    };

    if task.is_completed {
        return Ok((task, Vec::new()));
    }

    database.set_task_completed(id, true)?;
    calendar::record_task_completion(database, now)?;
    calendar::update_today_task_stats(database, now)?;
    let events = achievements::check_task_completion(database, now)?;

    let task = database
        .task_by_id(id)?
        .ok_or_else(|| anyhow::anyhow!("Task disappeared: {id}"))?;

    Ok((task, events))
}

/// Re-opens a completed task. Counters derived from task rows re-sync; the
/// lifetime completion counters in user stats are deliberately left alone.
pub fn reopen(database: &Database, id: i64, now: DateTime<Local>) -> Result<Task> {
    let Some(task) = database.task_by_id(id)? else {
        bail!("Task not found: {id}");
    };

    if task.is_completed {
        database.set_task_completed(id, false)?;
        calendar::update_today_task_stats(database, now)?;
    }

    database
        .task_by_id(id)?
        .ok_or_else(|| anyhow::anyhow!("Task disappeared: {id}"))
}

pub fn list(database: &Database, filter: TaskFilter) -> Result<Vec<Task>> {
    database.list_tasks(filter)
}

pub fn remove(database: &Database, id: i64, now: DateTime<Local>) -> Result<()> {
    if !database.delete_task(id)? {
        bail!("Task not found: {id}");
    }

    calendar::update_today_task_stats(database, now)
}

pub fn clear(database: &Database, now: DateTime<Local>) -> Result<usize> {
    let removed = database.delete_all_tasks()?;
    calendar::update_today_task_stats(database, now)?;

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::achievements;
    use chrono::{NaiveDate, TimeZone};
    use tempfile::TempDir;

    fn setup(day: &str) -> (TempDir, Database, DateTime<Local>) {
        let dir = TempDir::new().expect("temp dir");
        let mut database = Database::open(&dir.path().join("doit.db")).expect("open db");
        let noon = Local
            .from_local_datetime(
                &NaiveDate::parse_from_str(day, "%Y-%m-%d")
                    .expect("date")
                    .and_hms_opt(12, 0, 0)
                    .expect("time"),
            )
            .single()
            .expect("local time");
        achievements::initialize(&mut database, noon).expect("initialize");
        (dir, database, noon)
    }

    #[test]
    fn add_rejects_blank_title() {
        let (_dir, database, noon) = setup("2026-03-01");
        assert!(add(&database, "   ", "", noon).is_err());
    }

    #[test]
    fn completing_first_task_unlocks_achievement_and_syncs_record() {
        let (_dir, mut database, noon) = setup("2026-03-01");
        let task = add(&database, "write report", "quarterly numbers", noon).expect("add");

        let (done, events) = complete(&mut database, task.id, noon).expect("complete");
        assert!(done.is_completed);
        // The returned row is the stored one, not a copy patched in memory.
        let stored = database
            .task_by_id(task.id)
            .expect("query")
            .expect("present");
        assert!(stored.is_completed);
        assert_eq!(stored.id, done.id);
        assert!(events.iter().any(|event| matches!(
            event,
            EngineEvent::Unlocked { id, .. } if id == "first_task"
        )));

        let record = database
            .daily_record(noon.date_naive())
            .expect("query")
            .expect("present");
        assert_eq!(record.total_tasks, 1);
        assert_eq!(record.completed_tasks, 1);
        assert!(record.first_task_time.is_some());
    }

    #[test]
    fn completing_twice_is_a_noop() {
        let (_dir, mut database, noon) = setup("2026-03-01");
        let task = add(&database, "write report", "", noon).expect("add");

        complete(&mut database, task.id, noon).expect("first");
        let before = database.require_user_stats().expect("stats");

        let (_, events) = complete(&mut database, task.id, noon).expect("second");
        assert!(events.is_empty());

        let after = database.require_user_stats().expect("stats");
        assert_eq!(after.total_points, before.total_points);
        assert_eq!(after.completed_tasks, before.completed_tasks);
    }

    #[test]
    fn completing_missing_task_fails() {
        let (_dir, mut database, noon) = setup("2026-03-01");
        assert!(complete(&mut database, 42, noon).is_err());
    }

    #[test]
    fn reopen_resyncs_daily_counts() {
        let (_dir, mut database, noon) = setup("2026-03-01");
        let task = add(&database, "write report", "", noon).expect("add");
        complete(&mut database, task.id, noon).expect("complete");

        let reopened = reopen(&database, task.id, noon).expect("reopen");
        assert!(!reopened.is_completed);

        let record = database
            .daily_record(noon.date_naive())
            .expect("query")
            .expect("present");
        assert_eq!(record.completed_tasks, 0);
        // Lifetime counters are append-only and survive a reopen.
        assert_eq!(database.require_user_stats().expect("stats").completed_tasks, 1);
    }

    #[test]
    fn clear_removes_all_tasks() {
        let (_dir, database, noon) = setup("2026-03-01");
        add(&database, "one", "", noon).expect("add");
        add(&database, "two", "", noon).expect("add");

        assert_eq!(clear(&database, noon).expect("clear"), 2);
        assert!(list(&database, TaskFilter::All).expect("list").is_empty());
    }
}
