pub mod queries;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub is_completed: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskFilter {
    All,
    Open,
    Done,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleSetting {
    pub module_name: String,
    pub is_enabled: bool,
    pub display_order: i64,
}

/// Unlock state as a tagged variant: a locked achievement can never carry an
/// unlock timestamp, and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AchievementState {
    Locked,
    Unlocked { at: i64 },
}

impl AchievementState {
    pub fn is_unlocked(&self) -> bool {
        matches!(self, Self::Unlocked { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub points: i64,
    pub category: String,
    #[serde(flatten)]
    pub state: AchievementState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AchievementFilter {
    All,
    Unlocked,
    Locked,
}

/// Singleton aggregate row (id fixed to 1).
#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    pub total_points: i64,
    pub current_level: i64,
    pub completed_tasks: i64,
    pub current_streak: i64,
    pub longest_streak: i64,
    pub last_active_date: NaiveDate,
    pub meditation_minutes: i64,
    pub music_usage_count: i64,
    pub pomodoro_sessions: i64,
    pub modules_unlocked: String,
    pub today_completed_tasks: i64,
    pub today_active_date: NaiveDate,
}

impl UserStats {
    /// Parses the comma-joined `modules_unlocked` column into a set.
    pub fn module_set(&self) -> BTreeSet<String> {
        self.modules_unlocked
            .split(',')
            .filter(|part| !part.is_empty())
            .map(ToOwned::to_owned)
            .collect()
    }

    /// Records a module id into the deduplicated set, keeping the column in a
    /// deterministic sorted order.
    pub fn record_module(&mut self, module_id: &str) {
        let mut modules = self.module_set();
        modules.insert(module_id.to_string());
        self.modules_unlocked = modules.into_iter().collect::<Vec<_>>().join(",");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayStatus {
    NoTasks,
    Perfect,
    Partial,
    Incomplete,
}

impl fmt::Display for DayStatus {
    /// Same vocabulary as the serialized form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoTasks => "NO_TASKS",
            Self::Perfect => "PERFECT",
            Self::Partial => "PARTIAL",
            Self::Incomplete => "INCOMPLETE",
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub app_used: bool,
    pub first_task_time: Option<i64>,
    pub last_task_time: Option<i64>,
    pub meditation_minutes: i64,
    pub music_used: bool,
    pub pomodoro_sessions: i64,
    pub recorded_at: i64,
}

impl DailyRecord {
    pub fn new(date: NaiveDate, recorded_at: i64) -> Self {
        Self {
            date,
            total_tasks: 0,
            completed_tasks: 0,
            app_used: true,
            first_task_time: None,
            last_task_time: None,
            meditation_minutes: 0,
            music_used: false,
            pomodoro_sessions: 0,
            recorded_at,
        }
    }

    /// Completion percentage in [0,100], integer truncation, 0 without tasks.
    pub fn completion_rate(&self) -> i64 {
        if self.total_tasks > 0 {
            self.completed_tasks * 100 / self.total_tasks
        } else {
            0
        }
    }

    pub fn day_status(&self) -> DayStatus {
        if self.total_tasks == 0 {
            DayStatus::NoTasks
        } else if self.completed_tasks == self.total_tasks {
            DayStatus::Perfect
        } else if self.completed_tasks > 0 {
            DayStatus::Partial
        } else {
            DayStatus::Incomplete
        }
    }
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create DB directory: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite DB: {}", path.display()))?;

        let database = Self { conn };
        database.init_schema()?;

        Ok(database)
    }

    pub fn init_schema(&self) -> Result<()> {
        queries::schema_statements()
            .iter()
            .try_for_each(|statement| {
                self.conn
                    .execute(statement, [])
                    .context("Failed to initialize schema")
                    .map(|_| ())
            })
    }

    // === tasks ===

    pub fn insert_task(&self, title: &str, description: &str, created_at: i64) -> Result<Task> {
        self.conn
            .execute(
                "INSERT INTO tasks (title, description, is_completed, created_at) VALUES (?1, ?2, 0, ?3)",
                params![title, description, created_at],
            )
            .context("Failed to insert task")?;

        Ok(Task {
            id: self.conn.last_insert_rowid(),
            title: title.to_string(),
            description: description.to_string(),
            is_completed: false,
            created_at,
        })
    }

    pub fn task_by_id(&self, id: i64) -> Result<Option<Task>> {
        self.conn
            .query_row(
                "SELECT id, title, description, is_completed, created_at FROM tasks WHERE id = ?1",
                params![id],
                task_from_row,
            )
            .optional()
            .context("Failed to query task")
    }

    pub fn list_tasks(&self, filter: TaskFilter) -> Result<Vec<Task>> {
        let sql = match filter {
            TaskFilter::All => {
                "SELECT id, title, description, is_completed, created_at FROM tasks ORDER BY created_at DESC"
            }
            TaskFilter::Open => {
                "SELECT id, title, description, is_completed, created_at FROM tasks WHERE is_completed = 0 ORDER BY created_at DESC"
            }
            TaskFilter::Done => {
                "SELECT id, title, description, is_completed, created_at FROM tasks WHERE is_completed = 1 ORDER BY created_at DESC"
            }
        };

        let mut statement = self.conn.prepare(sql)?;
        let rows = statement
            .query_map([], task_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list tasks")?;

        Ok(rows)
    }

    pub fn set_task_completed(&self, id: i64, is_completed: bool) -> Result<bool> {
        let changed = self
            .conn
            .execute(
                "UPDATE tasks SET is_completed = ?2 WHERE id = ?1",
                params![id, is_completed],
            )
            .context("Failed to update task")?;

        Ok(changed > 0)
    }

    pub fn delete_task(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id])
            .context("Failed to delete task")?;

        Ok(deleted > 0)
    }

    pub fn delete_all_tasks(&self) -> Result<usize> {
        self.conn
            .execute("DELETE FROM tasks", [])
            .context("Failed to clear tasks")
    }

    /// Counts tasks whose creation instant falls on `date` in the local timezone.
    pub fn tasks_count_for_date(&self, date: NaiveDate) -> Result<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM tasks WHERE date(created_at, 'unixepoch', 'localtime') = ?1",
                params![date],
                |row| row.get(0),
            )
            .context("Failed to count tasks for date")
    }

    pub fn completed_tasks_count_for_date(&self, date: NaiveDate) -> Result<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM tasks WHERE date(created_at, 'unixepoch', 'localtime') = ?1 AND is_completed = 1",
                params![date],
                |row| row.get(0),
            )
            .context("Failed to count completed tasks for date")
    }

    // === module settings ===

    pub fn seed_modules(&self, modules: &[&str]) -> Result<()> {
        modules
            .iter()
            .enumerate()
            .try_for_each(|(order, name)| {
                self.conn
                    .execute(
                        "INSERT OR IGNORE INTO module_settings (module_name, is_enabled, display_order) VALUES (?1, 0, ?2)",
                        params![name, order as i64],
                    )
                    .context("Failed to seed module settings")
                    .map(|_| ())
            })
    }

    pub fn module_settings(&self) -> Result<Vec<ModuleSetting>> {
        let mut statement = self.conn.prepare(
            "SELECT module_name, is_enabled, display_order FROM module_settings ORDER BY display_order ASC",
        )?;

        let rows = statement
            .query_map([], |row| {
                Ok(ModuleSetting {
                    module_name: row.get(0)?,
                    is_enabled: row.get(1)?,
                    display_order: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list module settings")?;

        Ok(rows)
    }

    pub fn set_module_enabled(&self, module_name: &str, is_enabled: bool) -> Result<bool> {
        let changed = self
            .conn
            .execute(
                "UPDATE module_settings SET is_enabled = ?2 WHERE module_name = ?1",
                params![module_name, is_enabled],
            )
            .context("Failed to toggle module")?;

        Ok(changed > 0)
    }

    // === achievements ===

    pub fn achievements_count(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM achievements", [], |row| row.get(0))
            .context("Failed to count achievements")
    }

    pub fn insert_achievement(
        &self,
        id: &str,
        title: &str,
        description: &str,
        icon: &str,
        points: i64,
        category: &str,
    ) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO achievements (id, title, description, icon, points, category, is_unlocked, unlocked_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, NULL)",
                params![id, title, description, icon, points, category],
            )
            .context("Failed to insert achievement")?;

        Ok(())
    }

    pub fn achievement_by_id(&self, id: &str) -> Result<Option<Achievement>> {
        self.conn
            .query_row(
                "SELECT id, title, description, icon, points, category, is_unlocked, unlocked_at
                 FROM achievements WHERE id = ?1",
                params![id],
                achievement_from_row,
            )
            .optional()
            .context("Failed to query achievement")
    }

    pub fn achievements(&self, filter: AchievementFilter) -> Result<Vec<Achievement>> {
        let sql = match filter {
            AchievementFilter::All => {
                "SELECT id, title, description, icon, points, category, is_unlocked, unlocked_at
                 FROM achievements ORDER BY category, points"
            }
            AchievementFilter::Unlocked => {
                "SELECT id, title, description, icon, points, category, is_unlocked, unlocked_at
                 FROM achievements WHERE is_unlocked = 1 ORDER BY unlocked_at"
            }
            AchievementFilter::Locked => {
                "SELECT id, title, description, icon, points, category, is_unlocked, unlocked_at
                 FROM achievements WHERE is_unlocked = 0 ORDER BY category, points"
            }
        };

        let mut statement = self.conn.prepare(sql)?;
        let rows = statement
            .query_map([], achievement_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list achievements")?;

        Ok(rows)
    }

    /// One-way Locked -> Unlocked transition. The flag flip and the point
    /// credit commit as a single transaction, and the conditional UPDATE
    /// guarantees the points for one achievement are awarded at most once.
    /// Returns the unlocked achievement, or None when the id is unknown or the
    /// achievement was already unlocked.
    pub fn unlock_achievement(&mut self, id: &str, now_ts: i64) -> Result<Option<Achievement>> {
        let transaction = self
            .conn
            .transaction()
            .context("Failed to start unlock transaction")?;

        let changed = transaction
            .execute(
                "UPDATE achievements SET is_unlocked = 1, unlocked_at = ?2
                 WHERE id = ?1 AND is_unlocked = 0",
                params![id, now_ts],
            )
            .context("Failed to unlock achievement")?;

        if changed == 0 {
            return Ok(None);
        }

        let points: i64 = transaction
            .query_row(
                "SELECT points FROM achievements WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .context("Failed to read achievement points")?;

        transaction
            .execute(
                "UPDATE user_stats SET total_points = total_points + ?1 WHERE id = 1",
                params![points],
            )
            .context("Failed to credit achievement points")?;

        transaction
            .commit()
            .context("Failed to commit unlock transaction")?;

        self.achievement_by_id(id)
    }

    // === user stats ===

    pub fn seed_user_stats(&self, today: NaiveDate) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO user_stats
                   (id, total_points, current_level, completed_tasks, current_streak, longest_streak,
                    last_active_date, meditation_minutes, music_usage_count, pomodoro_sessions,
                    modules_unlocked, today_completed_tasks, today_active_date)
                 VALUES (1, 0, 1, 0, 0, 0, ?1, 0, 0, 0, '', 0, ?1)",
                params![today],
            )
            .context("Failed to seed user stats")?;

        Ok(())
    }

    pub fn user_stats(&self) -> Result<Option<UserStats>> {
        self.conn
            .query_row(
                "SELECT total_points, current_level, completed_tasks, current_streak, longest_streak,
                        last_active_date, meditation_minutes, music_usage_count, pomodoro_sessions,
                        modules_unlocked, today_completed_tasks, today_active_date
                 FROM user_stats WHERE id = 1",
                [],
                |row| {
                    Ok(UserStats {
                        total_points: row.get(0)?,
                        current_level: row.get(1)?,
                        completed_tasks: row.get(2)?,
                        current_streak: row.get(3)?,
                        longest_streak: row.get(4)?,
                        last_active_date: row.get(5)?,
                        meditation_minutes: row.get(6)?,
                        music_usage_count: row.get(7)?,
                        pomodoro_sessions: row.get(8)?,
                        modules_unlocked: row.get(9)?,
                        today_completed_tasks: row.get(10)?,
                        today_active_date: row.get(11)?,
                    })
                },
            )
            .optional()
            .context("Failed to query user stats")
    }

    pub fn require_user_stats(&self) -> Result<UserStats> {
        self.user_stats()?
            .context("User stats not initialized. Run `doit init` first.")
    }

    pub fn update_user_stats(&self, stats: &UserStats) -> Result<()> {
        self.conn
            .execute(
                "UPDATE user_stats SET
                   total_points = ?1, current_level = ?2, completed_tasks = ?3,
                   current_streak = ?4, longest_streak = ?5, last_active_date = ?6,
                   meditation_minutes = ?7, music_usage_count = ?8, pomodoro_sessions = ?9,
                   modules_unlocked = ?10, today_completed_tasks = ?11, today_active_date = ?12
                 WHERE id = 1",
                params![
                    stats.total_points,
                    stats.current_level,
                    stats.completed_tasks,
                    stats.current_streak,
                    stats.longest_streak,
                    stats.last_active_date,
                    stats.meditation_minutes,
                    stats.music_usage_count,
                    stats.pomodoro_sessions,
                    stats.modules_unlocked,
                    stats.today_completed_tasks,
                    stats.today_active_date,
                ],
            )
            .context("Failed to update user stats")?;

        Ok(())
    }

    pub fn increment_completed_tasks(&self) -> Result<()> {
        self.bump_stat("UPDATE user_stats SET completed_tasks = completed_tasks + 1 WHERE id = 1")
    }

    pub fn increment_today_completed_tasks(&self) -> Result<()> {
        self.bump_stat(
            "UPDATE user_stats SET today_completed_tasks = today_completed_tasks + 1 WHERE id = 1",
        )
    }

    pub fn add_meditation_minutes(&self, minutes: i64) -> Result<()> {
        self.conn
            .execute(
                "UPDATE user_stats SET meditation_minutes = meditation_minutes + ?1 WHERE id = 1",
                params![minutes],
            )
            .context("Failed to add meditation minutes")?;

        Ok(())
    }

    pub fn increment_music_usage(&self) -> Result<()> {
        self.bump_stat("UPDATE user_stats SET music_usage_count = music_usage_count + 1 WHERE id = 1")
    }

    pub fn increment_pomodoro_sessions(&self) -> Result<()> {
        self.bump_stat(
            "UPDATE user_stats SET pomodoro_sessions = pomodoro_sessions + 1 WHERE id = 1",
        )
    }

    fn bump_stat(&self, sql: &str) -> Result<()> {
        self.conn
            .execute(sql, [])
            .context("Failed to update user stats counter")?;

        Ok(())
    }

    // === daily records ===

    pub fn daily_record(&self, date: NaiveDate) -> Result<Option<DailyRecord>> {
        self.conn
            .query_row(
                "SELECT date, total_tasks, completed_tasks, app_used, first_task_time, last_task_time,
                        meditation_minutes, music_used, pomodoro_sessions, recorded_at
                 FROM daily_records WHERE date = ?1",
                params![date],
                daily_record_from_row,
            )
            .optional()
            .context("Failed to query daily record")
    }

    pub fn upsert_daily_record(&self, record: &DailyRecord) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO daily_records
                   (date, total_tasks, completed_tasks, app_used, first_task_time, last_task_time,
                    meditation_minutes, music_used, pomodoro_sessions, recorded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(date) DO UPDATE SET
                   total_tasks = excluded.total_tasks,
                   completed_tasks = excluded.completed_tasks,
                   app_used = excluded.app_used,
                   first_task_time = excluded.first_task_time,
                   last_task_time = excluded.last_task_time,
                   meditation_minutes = excluded.meditation_minutes,
                   music_used = excluded.music_used,
                   pomodoro_sessions = excluded.pomodoro_sessions,
                   recorded_at = excluded.recorded_at",
                params![
                    record.date,
                    record.total_tasks,
                    record.completed_tasks,
                    record.app_used,
                    record.first_task_time,
                    record.last_task_time,
                    record.meditation_minutes,
                    record.music_used,
                    record.pomodoro_sessions,
                    record.recorded_at,
                ],
            )
            .context("Failed to upsert daily record")?;

        Ok(())
    }

    pub fn records_for_month(&self, year: i32, month: u32) -> Result<Vec<DailyRecord>> {
        let month_pattern = format!("{year:04}-{month:02}%");
        let mut statement = self.conn.prepare(
            "SELECT date, total_tasks, completed_tasks, app_used, first_task_time, last_task_time,
                    meditation_minutes, music_used, pomodoro_sessions, recorded_at
             FROM daily_records WHERE date LIKE ?1 ORDER BY date",
        )?;

        let rows = statement
            .query_map(params![month_pattern], daily_record_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to query monthly records")?;

        Ok(rows)
    }

    /// Records with at least one completed task, newest first. Feeds the
    /// streak walk.
    pub fn active_days_desc(&self) -> Result<Vec<DailyRecord>> {
        let mut statement = self.conn.prepare(
            "SELECT date, total_tasks, completed_tasks, app_used, first_task_time, last_task_time,
                    meditation_minutes, music_used, pomodoro_sessions, recorded_at
             FROM daily_records WHERE completed_tasks > 0 ORDER BY date DESC",
        )?;

        let rows = statement
            .query_map([], daily_record_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to query active days")?;

        Ok(rows)
    }
}

fn task_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        is_completed: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn achievement_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Achievement> {
    let is_unlocked: bool = row.get(6)?;
    let unlocked_at: Option<i64> = row.get(7)?;
    let state = match (is_unlocked, unlocked_at) {
        (true, Some(at)) => AchievementState::Unlocked { at },
        _ => AchievementState::Locked,
    };

    Ok(Achievement {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        icon: row.get(3)?,
        points: row.get(4)?,
        category: row.get(5)?,
        state,
    })
}

fn daily_record_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DailyRecord> {
    Ok(DailyRecord {
        date: row.get(0)?,
        total_tasks: row.get(1)?,
        completed_tasks: row.get(2)?,
        app_used: row.get(3)?,
        first_task_time: row.get(4)?,
        last_task_time: row.get(5)?,
        meditation_minutes: row.get(6)?,
        music_used: row.get(7)?,
        pomodoro_sessions: row.get(8)?,
        recorded_at: row.get(9)?,
    })
}
