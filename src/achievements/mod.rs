pub mod catalog;

use crate::db::Database;
use anyhow::Result;
use chrono::{DateTime, Local, Timelike};
use std::fmt;
use tracing::{debug, info};

const NIGHT_OWL_HOUR: u32 = 23;
const MEDITATION_HOUR_MINUTES: i64 = 60;

/// Outcome of an engine check, returned as plain data so the caller decides
/// how to present it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Unlocked {
        id: String,
        title: String,
        points: i64,
    },
    LevelUp {
        level: i64,
        name: &'static str,
    },
}

impl fmt::Display for EngineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlocked { title, points, .. } => {
                write!(f, "🏆 Achievement unlocked: {title} (+{points} pts)")
            }
            Self::LevelUp { level, name } => {
                write!(f, "🎉 Level up! Reached level {level} ({name})")
            }
        }
    }
}

/// Seeds the achievement catalog and the singleton stats row when absent,
/// then runs the daily streak check. Safe to call at every app start.
pub fn initialize(database: &mut Database, now: DateTime<Local>) -> Result<Vec<EngineEvent>> {
    if database.achievements_count()? == 0 {
        for entry in &catalog::CATALOG {
            database.insert_achievement(
                entry.id,
                entry.title,
                entry.description,
                entry.icon,
                entry.points,
                entry.category,
            )?;
        }
        info!(count = catalog::CATALOG.len(), "achievement catalog seeded");
    }

    database.seed_user_stats(now.date_naive())?;

    check_daily_streak(database, now)
}

/// Invoked only when a task's completed flag transitions false -> true.
pub fn check_task_completion(
    database: &mut Database,
    now: DateTime<Local>,
) -> Result<Vec<EngineEvent>> {
    database.increment_completed_tasks()?;
    database.increment_today_completed_tasks()?;

    let stats = database.require_user_stats()?;
    let mut events = Vec::new();

    if stats.completed_tasks == 1 {
        push_unlock(database, "first_task", now, &mut events)?;
    } else if stats.today_completed_tasks == 5 {
        push_unlock(database, "daily_5_tasks", now, &mut events)?;
    } else if stats.completed_tasks == 50 {
        push_unlock(database, "total_50_tasks", now, &mut events)?;
    }

    if now.hour() >= NIGHT_OWL_HOUR {
        push_unlock(database, "night_owl", now, &mut events)?;
    }

    events.extend(update_user_level(database)?);
    Ok(events)
}

/// Runs once per app start. No-op when today was already recorded; otherwise
/// the streak extends when the last active date was exactly yesterday and
/// resets to 1 after any gap. Also resets the per-day completion counter.
pub fn check_daily_streak(
    database: &mut Database,
    now: DateTime<Local>,
) -> Result<Vec<EngineEvent>> {
    let today = now.date_naive();
    let mut stats = database.require_user_stats()?;

    if stats.last_active_date == today {
        return Ok(Vec::new());
    }

    let consecutive = (today - stats.last_active_date).num_days() == 1;
    let new_streak = if consecutive { stats.current_streak + 1 } else { 1 };

    stats.current_streak = new_streak;
    stats.longest_streak = stats.longest_streak.max(new_streak);
    stats.last_active_date = today;
    stats.today_completed_tasks = 0;
    stats.today_active_date = today;
    database.update_user_stats(&stats)?;
    debug!(streak = new_streak, "daily streak recorded");

    let mut events = Vec::new();
    match new_streak {
        3 => push_unlock(database, "streak_3_days", now, &mut events)?,
        7 => push_unlock(database, "streak_7_days", now, &mut events)?,
        30 => push_unlock(database, "streak_30_days", now, &mut events)?,
        _ => {}
    }

    events.extend(update_user_level(database)?);
    Ok(events)
}

/// Records that a module was opened. First-use achievements fire per module,
/// the module id joins the deduplicated usage set, and `all_modules` unlocks
/// once the set covers every required module.
pub fn check_module_usage(
    database: &mut Database,
    module_id: &str,
    now: DateTime<Local>,
) -> Result<Vec<EngineEvent>> {
    let mut events = Vec::new();

    match module_id {
        "meditation" => push_unlock(database, "meditation_first", now, &mut events)?,
        "music" => {
            push_unlock(database, "music_first", now, &mut events)?;
            database.increment_music_usage()?;
        }
        "pomodoro" => push_unlock(database, "pomodoro_module_first", now, &mut events)?,
        "journey" => push_unlock(database, "journey_module_first", now, &mut events)?,
        _ => {}
    }

    let mut stats = database.require_user_stats()?;
    stats.record_module(module_id);
    database.update_user_stats(&stats)?;

    let recorded = stats.module_set();
    if catalog::REQUIRED_MODULES
        .iter()
        .all(|required| recorded.contains(*required))
    {
        push_unlock(database, "all_modules", now, &mut events)?;
    }

    events.extend(update_user_level(database)?);
    Ok(events)
}

/// Accumulates meditation minutes and unlocks the one-hour achievement once
/// the lifetime total reaches 60.
pub fn check_meditation_time(
    database: &mut Database,
    minutes: i64,
    now: DateTime<Local>,
) -> Result<Vec<EngineEvent>> {
    database.add_meditation_minutes(minutes)?;

    let stats = database.require_user_stats()?;
    let mut events = Vec::new();

    if stats.meditation_minutes >= MEDITATION_HOUR_MINUTES {
        push_unlock(database, "meditation_1_hour", now, &mut events)?;
    }

    events.extend(update_user_level(database)?);
    Ok(events)
}

/// Counts a finished pomodoro focus session. Unlocks fire at the exact
/// lifetime totals, not at-or-above.
pub fn check_pomodoro_completion(
    database: &mut Database,
    now: DateTime<Local>,
) -> Result<Vec<EngineEvent>> {
    database.increment_pomodoro_sessions()?;

    let stats = database.require_user_stats()?;
    let mut events = Vec::new();

    match stats.pomodoro_sessions {
        1 => push_unlock(database, "pomodoro_first", now, &mut events)?,
        10 => push_unlock(database, "pomodoro_10_sessions", now, &mut events)?,
        50 => push_unlock(database, "pomodoro_master", now, &mut events)?,
        100 => push_unlock(database, "pomodoro_legend", now, &mut events)?,
        _ => {}
    }

    events.extend(update_user_level(database)?);
    Ok(events)
}

fn push_unlock(
    database: &mut Database,
    id: &str,
    now: DateTime<Local>,
    events: &mut Vec<EngineEvent>,
) -> Result<()> {
    // Unknown ids and already-unlocked achievements are silent no-ops.
    if let Some(achievement) = database.unlock_achievement(id, now.timestamp())? {
        info!(id = %achievement.id, points = achievement.points, "achievement unlocked");
        events.push(EngineEvent::Unlocked {
            id: achievement.id,
            title: achievement.title,
            points: achievement.points,
        });
    }

    Ok(())
}

/// Recomputes the level band from total points; persists and reports a
/// one-time event when the band changed.
fn update_user_level(database: &mut Database) -> Result<Option<EngineEvent>> {
    let mut stats = database.require_user_stats()?;
    let new_level = calculate_level(stats.total_points);

    if new_level == stats.current_level {
        return Ok(None);
    }

    stats.current_level = new_level;
    database.update_user_stats(&stats)?;

    Ok(Some(EngineEvent::LevelUp {
        level: new_level,
        name: level_name(new_level),
    }))
}

pub fn calculate_level(total_points: i64) -> i64 {
    if total_points < 200 {
        1
    } else if total_points < 500 {
        2
    } else if total_points < 1000 {
        3
    } else if total_points < 2000 {
        4
    } else {
        5
    }
}

pub fn level_name(level: i64) -> &'static str {
    match level {
        2 => "Silver",
        3 => "Gold",
        4 => "Diamond",
        5 => "Legend",
        _ => "Bronze",
    }
}

/// Upper bound of the current band, saturating at 2000 once level 5 is reached.
pub fn points_for_next_level(total_points: i64) -> i64 {
    if total_points < 200 {
        200
    } else if total_points < 500 {
        500
    } else if total_points < 1000 {
        1000
    } else {
        2000
    }
}

/// Progress through the current band as a percentage, clamped to [0,100].
/// Flat 100 at the top level.
pub fn level_progress_percent(total_points: i64) -> i64 {
    let level = calculate_level(total_points);
    if level == 5 {
        return 100;
    }

    let lower = match level {
        2 => 200,
        3 => 500,
        4 => 1000,
        _ => 0,
    };
    let upper = points_for_next_level(total_points);

    ((total_points - lower) * 100 / (upper - lower)).clamp(0, 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{AchievementState, Database};
    use chrono::{DateTime, Local, NaiveDate, TimeZone};
    use tempfile::TempDir;

    fn open_test_db() -> (TempDir, Database) {
        let dir = TempDir::new().expect("temp dir");
        let database = Database::open(&dir.path().join("doit.db")).expect("open db");
        (dir, database)
    }

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("date")
    }

    fn local_time(day: &str, hour: u32, minute: u32) -> DateTime<Local> {
        Local
            .from_local_datetime(&date(day).and_hms_opt(hour, minute, 0).expect("time"))
            .single()
            .expect("local time")
    }

    fn initialized(day: &str) -> (TempDir, Database) {
        let (dir, mut database) = open_test_db();
        initialize(&mut database, local_time(day, 12, 0)).expect("initialize");
        (dir, database)
    }

    fn unlocked(database: &Database, id: &str) -> bool {
        database
            .achievement_by_id(id)
            .expect("query")
            .map(|achievement| achievement.state.is_unlocked())
            .unwrap_or(false)
    }

    #[test]
    fn level_bands() {
        assert_eq!(calculate_level(0), 1);
        assert_eq!(calculate_level(199), 1);
        assert_eq!(calculate_level(200), 2);
        assert_eq!(calculate_level(499), 2);
        assert_eq!(calculate_level(500), 3);
        assert_eq!(calculate_level(1999), 4);
        assert_eq!(calculate_level(2000), 5);
    }

    #[test]
    fn next_level_bound_saturates() {
        assert_eq!(points_for_next_level(0), 200);
        assert_eq!(points_for_next_level(350), 500);
        assert_eq!(points_for_next_level(1500), 2000);
        assert_eq!(points_for_next_level(9000), 2000);
    }

    #[test]
    fn level_progress_is_clamped() {
        assert_eq!(level_progress_percent(0), 0);
        assert_eq!(level_progress_percent(100), 50);
        assert_eq!(level_progress_percent(199), 99);
        assert_eq!(level_progress_percent(200), 0);
        assert_eq!(level_progress_percent(350), 50);
        assert_eq!(level_progress_percent(2000), 100);
        assert_eq!(level_progress_percent(5000), 100);
    }

    #[test]
    fn initialize_is_idempotent() {
        let (_dir, mut database) = initialized("2026-03-01");
        initialize(&mut database, local_time("2026-03-01", 13, 0)).expect("again");

        assert_eq!(database.achievements_count().expect("count"), 17);
        assert_eq!(database.require_user_stats().expect("stats").total_points, 0);
    }

    #[test]
    fn first_completion_unlocks_first_task() {
        let (_dir, mut database) = initialized("2026-03-01");
        let events =
            check_task_completion(&mut database, local_time("2026-03-01", 12, 0)).expect("check");

        assert!(events.iter().any(|event| matches!(
            event,
            EngineEvent::Unlocked { id, .. } if id == "first_task"
        )));
        assert_eq!(database.require_user_stats().expect("stats").total_points, 10);
    }

    #[test]
    fn fifth_daily_completion_unlocks_exactly_at_five() {
        let (_dir, mut database) = initialized("2026-03-01");
        let noon = local_time("2026-03-01", 12, 0);

        for _ in 0..6 {
            check_task_completion(&mut database, noon).expect("check");
        }

        assert!(unlocked(&database, "daily_5_tasks"));
        // 10 for first_task + 50 for daily_5_tasks, credited once each.
        assert_eq!(database.require_user_stats().expect("stats").total_points, 60);
    }

    #[test]
    fn fiftieth_lifetime_completion_unlocks_task_master() {
        let (_dir, mut database) = initialized("2026-03-01");
        let noon = local_time("2026-03-01", 12, 0);

        for _ in 0..50 {
            check_task_completion(&mut database, noon).expect("check");
        }

        assert!(unlocked(&database, "total_50_tasks"));
        let stats = database.require_user_stats().expect("stats");
        assert_eq!(stats.completed_tasks, 50);
        // 10 + 50 + 200, and crossing 200 raises the level band.
        assert_eq!(stats.total_points, 260);
        assert_eq!(stats.current_level, 2);
    }

    #[test]
    fn late_completion_unlocks_night_owl() {
        let (_dir, mut database) = initialized("2026-03-01");

        check_task_completion(&mut database, local_time("2026-03-01", 12, 0)).expect("noon");
        assert!(!unlocked(&database, "night_owl"));

        check_task_completion(&mut database, local_time("2026-03-01", 23, 30)).expect("night");
        assert!(unlocked(&database, "night_owl"));
    }

    #[test]
    fn streak_extends_on_consecutive_day() {
        let (_dir, mut database) = initialized("2026-03-01");

        let mut stats = database.require_user_stats().expect("stats");
        stats.current_streak = 2;
        stats.longest_streak = 2;
        stats.last_active_date = date("2026-03-01");
        stats.today_completed_tasks = 4;
        database.update_user_stats(&stats).expect("update");

        let events =
            check_daily_streak(&mut database, local_time("2026-03-02", 9, 0)).expect("check");

        let stats = database.require_user_stats().expect("stats");
        assert_eq!(stats.current_streak, 3);
        assert_eq!(stats.longest_streak, 3);
        assert_eq!(stats.today_completed_tasks, 0);
        assert_eq!(stats.last_active_date, date("2026-03-02"));
        assert!(events.iter().any(|event| matches!(
            event,
            EngineEvent::Unlocked { id, .. } if id == "streak_3_days"
        )));
    }

    #[test]
    fn streak_check_is_noop_on_same_day() {
        let (_dir, mut database) = initialized("2026-03-01");

        let mut stats = database.require_user_stats().expect("stats");
        stats.today_completed_tasks = 2;
        database.update_user_stats(&stats).expect("update");

        let events =
            check_daily_streak(&mut database, local_time("2026-03-01", 18, 0)).expect("check");
        assert!(events.is_empty());
        assert_eq!(
            database.require_user_stats().expect("stats").today_completed_tasks,
            2
        );
    }

    #[test]
    fn streak_resets_after_gap() {
        let (_dir, mut database) = initialized("2026-03-01");

        let mut stats = database.require_user_stats().expect("stats");
        stats.current_streak = 5;
        stats.longest_streak = 5;
        stats.last_active_date = date("2026-03-01");
        database.update_user_stats(&stats).expect("update");

        check_daily_streak(&mut database, local_time("2026-03-04", 9, 0)).expect("check");

        let stats = database.require_user_stats().expect("stats");
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.longest_streak, 5);
    }

    #[test]
    fn all_modules_unlocks_once_after_covering_required_set() {
        let (_dir, mut database) = initialized("2026-03-01");
        let noon = local_time("2026-03-01", 12, 0);

        // Duplicates and arbitrary order must not matter.
        let usage = [
            "music", "calendar", "music", "tasks_goal", "self_talk", "achievements",
            "meditation", "pomodoro", "journey",
        ];
        for module in usage {
            check_module_usage(&mut database, module, noon).expect("usage");
        }

        assert!(unlocked(&database, "all_modules"));
        let stats = database.require_user_stats().expect("stats");
        assert_eq!(stats.module_set().len(), 8);
        // music_first 20 + meditation_first 20 + all_modules 100, each once.
        assert_eq!(stats.total_points, 140);

        check_module_usage(&mut database, "music", noon).expect("repeat");
        assert_eq!(database.require_user_stats().expect("stats").total_points, 140);
    }

    #[test]
    fn music_usage_increments_counter() {
        let (_dir, mut database) = initialized("2026-03-01");
        let noon = local_time("2026-03-01", 12, 0);

        check_module_usage(&mut database, "music", noon).expect("first");
        check_module_usage(&mut database, "music", noon).expect("second");

        assert_eq!(database.require_user_stats().expect("stats").music_usage_count, 2);
    }

    #[test]
    fn meditation_hour_unlocks_on_cumulative_total() {
        let (_dir, mut database) = initialized("2026-03-01");
        let noon = local_time("2026-03-01", 12, 0);

        check_meditation_time(&mut database, 30, noon).expect("first half");
        assert!(!unlocked(&database, "meditation_1_hour"));

        check_meditation_time(&mut database, 30, noon).expect("second half");
        assert!(unlocked(&database, "meditation_1_hour"));
        assert_eq!(
            database.require_user_stats().expect("stats").meditation_minutes,
            60
        );
    }

    #[test]
    fn pomodoro_thresholds_fire_at_exact_totals() {
        let (_dir, mut database) = initialized("2026-03-01");
        let noon = local_time("2026-03-01", 12, 0);

        for session in 1..=10 {
            check_pomodoro_completion(&mut database, noon).expect("session");
            if session == 1 {
                assert!(unlocked(&database, "pomodoro_first"));
                assert!(!unlocked(&database, "pomodoro_10_sessions"));
            }
        }

        assert!(unlocked(&database, "pomodoro_10_sessions"));
        assert_eq!(
            database.require_user_stats().expect("stats").pomodoro_sessions,
            10
        );
    }

    #[test]
    fn big_unlock_raises_level_with_event() {
        let (_dir, mut database) = initialized("2026-03-01");

        let mut stats = database.require_user_stats().expect("stats");
        stats.current_streak = 29;
        stats.last_active_date = date("2026-03-01");
        database.update_user_stats(&stats).expect("update");

        let events =
            check_daily_streak(&mut database, local_time("2026-03-02", 9, 0)).expect("check");

        assert!(events.contains(&EngineEvent::LevelUp { level: 3, name: "Gold" }));
        let stats = database.require_user_stats().expect("stats");
        assert_eq!(stats.total_points, 500);
        assert_eq!(stats.current_level, 3);
    }

    #[test]
    fn unlocked_state_carries_timestamp() {
        let (_dir, mut database) = initialized("2026-03-01");
        let night = local_time("2026-03-01", 23, 5);

        check_task_completion(&mut database, night).expect("check");

        let achievement = database
            .achievement_by_id("night_owl")
            .expect("query")
            .expect("present");
        assert_eq!(
            achievement.state,
            AchievementState::Unlocked { at: night.timestamp() }
        );
    }
}
