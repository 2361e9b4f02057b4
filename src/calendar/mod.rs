//! Keeps one daily record per calendar date in sync with the task store and
//! module-usage events, and derives streaks and monthly rollups from them.

use crate::db::{DailyRecord, Database};
use anyhow::Result;
use chrono::{DateTime, Duration, Local, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyStats {
    pub year: i32,
    pub month: u32,
    /// Days with a record present.
    pub total_days: usize,
    /// Days with at least one completed task.
    pub active_days: usize,
    /// Days where every task was completed.
    pub perfect_days: usize,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    /// Sum-based integer percentage, 0 when no tasks were recorded.
    pub completion_rate: i64,
}

/// Recounts today's tasks from the task table (creation date in local time)
/// and upserts the record, creating a zero-count row when none exists yet.
pub fn update_today_task_stats(database: &Database, now: DateTime<Local>) -> Result<()> {
    let today = now.date_naive();
    let total = database.tasks_count_for_date(today)?;
    let completed = database.completed_tasks_count_for_date(today)?;

    let mut record = today_record(database, now)?;
    record.total_tasks = total;
    record.completed_tasks = completed;
    record.app_used = true;
    record.recorded_at = now.timestamp();

    database.upsert_daily_record(&record)
}

/// Called once per newly-completed task. Stamps the first completion time
/// once and keeps the latest completion time current.
pub fn record_task_completion(database: &Database, now: DateTime<Local>) -> Result<()> {
    let mut record = today_record(database, now)?;
    record.completed_tasks += 1;
    record.first_task_time.get_or_insert(now.timestamp());
    record.last_task_time = Some(now.timestamp());
    record.recorded_at = now.timestamp();

    database.upsert_daily_record(&record)
}

pub fn record_meditation_usage(
    database: &Database,
    minutes: i64,
    now: DateTime<Local>,
) -> Result<()> {
    let mut record = today_record(database, now)?;
    record.meditation_minutes += minutes;
    record.recorded_at = now.timestamp();

    database.upsert_daily_record(&record)
}

pub fn record_music_usage(database: &Database, now: DateTime<Local>) -> Result<()> {
    let mut record = today_record(database, now)?;
    record.music_used = true;
    record.recorded_at = now.timestamp();

    database.upsert_daily_record(&record)
}

pub fn record_pomodoro_session(database: &Database, now: DateTime<Local>) -> Result<()> {
    let mut record = today_record(database, now)?;
    record.pomodoro_sessions += 1;
    record.recorded_at = now.timestamp();

    database.upsert_daily_record(&record)
}

pub fn monthly_stats(database: &Database, year: i32, month: u32) -> Result<MonthlyStats> {
    let records = database.records_for_month(year, month)?;

    let total_days = records.len();
    let active_days = records
        .iter()
        .filter(|record| record.completed_tasks > 0)
        .count();
    let perfect_days = records
        .iter()
        .filter(|record| record.total_tasks > 0 && record.completed_tasks == record.total_tasks)
        .count();
    let total_tasks = records.iter().map(|record| record.total_tasks).sum::<i64>();
    let completed_tasks = records
        .iter()
        .map(|record| record.completed_tasks)
        .sum::<i64>();
    let completion_rate = if total_tasks > 0 {
        completed_tasks * 100 / total_tasks
    } else {
        0
    };

    Ok(MonthlyStats {
        year,
        month,
        total_days,
        active_days,
        perfect_days,
        total_tasks,
        completed_tasks,
        completion_rate,
    })
}

/// Walks backward from `today`, counting consecutive days that have a record
/// with at least one completed task; any missing or taskless day ends the
/// walk. The iteration is bounded by the number of active records rather than
/// elapsed calendar time, matching the historical behavior pinned by the
/// tests below.
pub fn current_streak(database: &Database, today: NaiveDate) -> Result<i64> {
    let records = database.active_days_desc()?;
    if records.is_empty() {
        return Ok(0);
    }

    let mut streak = 0;
    let mut cursor = today;

    for _ in 0..records.len() {
        if records.iter().any(|record| record.date == cursor) {
            streak += 1;
            cursor = cursor - Duration::days(1);
        } else {
            break;
        }
    }

    Ok(streak)
}

fn today_record(database: &Database, now: DateTime<Local>) -> Result<DailyRecord> {
    let today = now.date_naive();
    Ok(database
        .daily_record(today)?
        .unwrap_or_else(|| DailyRecord::new(today, now.timestamp())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DailyRecord, Database};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn open_test_db() -> (TempDir, Database) {
        let dir = TempDir::new().expect("temp dir");
        let database = Database::open(&dir.path().join("doit.db")).expect("open db");
        (dir, database)
    }

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("date")
    }

    fn local_noon(day: &str) -> DateTime<Local> {
        Local
            .from_local_datetime(&date(day).and_hms_opt(12, 0, 0).expect("time"))
            .single()
            .expect("local time")
    }

    fn active_day(database: &Database, day: &str, total: i64, completed: i64) {
        let mut record = DailyRecord::new(date(day), 0);
        record.total_tasks = total;
        record.completed_tasks = completed;
        database.upsert_daily_record(&record).expect("record");
    }

    #[test]
    fn update_creates_zero_count_record() {
        let (_dir, database) = open_test_db();
        update_today_task_stats(&database, local_noon("2026-03-01")).expect("update");

        let record = database
            .daily_record(date("2026-03-01"))
            .expect("query")
            .expect("present");
        assert_eq!(record.total_tasks, 0);
        assert_eq!(record.completed_tasks, 0);
        assert!(record.app_used);
    }

    #[test]
    fn update_counts_tasks_created_today() {
        let (_dir, database) = open_test_db();
        let noon = local_noon("2026-03-01");

        let task = database
            .insert_task("write report", "", noon.timestamp())
            .expect("insert");
        database.insert_task("call mom", "", noon.timestamp()).expect("insert");
        database.set_task_completed(task.id, true).expect("complete");

        update_today_task_stats(&database, noon).expect("update");

        let record = database
            .daily_record(date("2026-03-01"))
            .expect("query")
            .expect("present");
        assert_eq!(record.total_tasks, 2);
        assert_eq!(record.completed_tasks, 1);
    }

    #[test]
    fn completion_stamps_first_time_once() {
        let (_dir, database) = open_test_db();
        let morning = Local
            .from_local_datetime(&date("2026-03-01").and_hms_opt(9, 0, 0).expect("time"))
            .single()
            .expect("local");
        let evening = Local
            .from_local_datetime(&date("2026-03-01").and_hms_opt(21, 0, 0).expect("time"))
            .single()
            .expect("local");

        record_task_completion(&database, morning).expect("first");
        record_task_completion(&database, evening).expect("second");

        let record = database
            .daily_record(date("2026-03-01"))
            .expect("query")
            .expect("present");
        assert_eq!(record.completed_tasks, 2);
        assert_eq!(record.first_task_time, Some(morning.timestamp()));
        assert_eq!(record.last_task_time, Some(evening.timestamp()));
    }

    #[test]
    fn module_usage_records_accumulate() {
        let (_dir, database) = open_test_db();
        let noon = local_noon("2026-03-01");

        record_meditation_usage(&database, 15, noon).expect("meditation");
        record_meditation_usage(&database, 10, noon).expect("meditation again");
        record_music_usage(&database, noon).expect("music");
        record_pomodoro_session(&database, noon).expect("pomodoro");
        record_pomodoro_session(&database, noon).expect("pomodoro again");

        let record = database
            .daily_record(date("2026-03-01"))
            .expect("query")
            .expect("present");
        assert_eq!(record.meditation_minutes, 25);
        assert!(record.music_used);
        assert_eq!(record.pomodoro_sessions, 2);
    }

    #[test]
    fn monthly_rollup_sums_and_classifies_days() {
        let (_dir, database) = open_test_db();
        active_day(&database, "2026-03-01", 3, 3);
        active_day(&database, "2026-03-02", 4, 2);
        active_day(&database, "2026-03-03", 2, 0);
        active_day(&database, "2026-02-28", 5, 5); // other month

        let stats = monthly_stats(&database, 2026, 3).expect("stats");
        assert_eq!(stats.total_days, 3);
        assert_eq!(stats.active_days, 2);
        assert_eq!(stats.perfect_days, 1);
        assert_eq!(stats.total_tasks, 9);
        assert_eq!(stats.completed_tasks, 5);
        assert_eq!(stats.completion_rate, 55);
    }

    #[test]
    fn monthly_rollup_of_empty_month_is_zero() {
        let (_dir, database) = open_test_db();
        let stats = monthly_stats(&database, 2026, 4).expect("stats");
        assert_eq!(stats.total_days, 0);
        assert_eq!(stats.completion_rate, 0);
    }

    #[test]
    fn streak_counts_consecutive_days_until_gap() {
        let (_dir, database) = open_test_db();
        active_day(&database, "2026-03-10", 2, 2);
        active_day(&database, "2026-03-09", 1, 1);
        active_day(&database, "2026-03-08", 3, 1);
        // 2026-03-07 absent; older history beyond the gap is ignored.
        active_day(&database, "2026-03-05", 2, 2);

        assert_eq!(current_streak(&database, date("2026-03-10")).expect("streak"), 3);
    }

    #[test]
    fn streak_is_zero_without_a_record_today() {
        let (_dir, database) = open_test_db();
        active_day(&database, "2026-03-09", 1, 1);

        assert_eq!(current_streak(&database, date("2026-03-10")).expect("streak"), 0);
    }

    #[test]
    fn taskless_day_does_not_extend_streak() {
        let (_dir, database) = open_test_db();
        active_day(&database, "2026-03-10", 2, 1);
        active_day(&database, "2026-03-09", 2, 0); // present but nothing completed

        assert_eq!(current_streak(&database, date("2026-03-10")).expect("streak"), 1);
    }
}
