pub const CREATE_TASKS: &str = r#"
CREATE TABLE IF NOT EXISTS tasks (
  id           INTEGER PRIMARY KEY AUTOINCREMENT,
  title        TEXT NOT NULL,
  description  TEXT NOT NULL DEFAULT '',
  is_completed INTEGER NOT NULL DEFAULT 0,
  created_at   INTEGER NOT NULL
);
"#;

pub const CREATE_MODULE_SETTINGS: &str = r#"
CREATE TABLE IF NOT EXISTS module_settings (
  module_name   TEXT PRIMARY KEY,
  is_enabled    INTEGER NOT NULL DEFAULT 0,
  display_order INTEGER NOT NULL DEFAULT 0
);
"#;

pub const CREATE_ACHIEVEMENTS: &str = r#"
CREATE TABLE IF NOT EXISTS achievements (
  id          TEXT PRIMARY KEY,
  title       TEXT NOT NULL,
  description TEXT NOT NULL,
  icon        TEXT NOT NULL,
  points      INTEGER NOT NULL DEFAULT 0,
  category    TEXT NOT NULL,
  is_unlocked INTEGER NOT NULL DEFAULT 0,
  unlocked_at INTEGER
);
"#;

pub const CREATE_USER_STATS: &str = r#"
CREATE TABLE IF NOT EXISTS user_stats (
  id                    INTEGER PRIMARY KEY CHECK (id = 1),
  total_points          INTEGER NOT NULL DEFAULT 0,
  current_level         INTEGER NOT NULL DEFAULT 1,
  completed_tasks       INTEGER NOT NULL DEFAULT 0,
  current_streak        INTEGER NOT NULL DEFAULT 0,
  longest_streak        INTEGER NOT NULL DEFAULT 0,
  last_active_date      TEXT NOT NULL,
  meditation_minutes    INTEGER NOT NULL DEFAULT 0,
  music_usage_count     INTEGER NOT NULL DEFAULT 0,
  pomodoro_sessions     INTEGER NOT NULL DEFAULT 0,
  modules_unlocked      TEXT NOT NULL DEFAULT '',
  today_completed_tasks INTEGER NOT NULL DEFAULT 0,
  today_active_date     TEXT NOT NULL
);
"#;

pub const CREATE_DAILY_RECORDS: &str = r#"
CREATE TABLE IF NOT EXISTS daily_records (
  date               TEXT PRIMARY KEY,
  total_tasks        INTEGER NOT NULL DEFAULT 0,
  completed_tasks    INTEGER NOT NULL DEFAULT 0,
  app_used           INTEGER NOT NULL DEFAULT 0,
  first_task_time    INTEGER,
  last_task_time     INTEGER,
  meditation_minutes INTEGER NOT NULL DEFAULT 0,
  music_used         INTEGER NOT NULL DEFAULT 0,
  pomodoro_sessions  INTEGER NOT NULL DEFAULT 0,
  recorded_at        INTEGER NOT NULL DEFAULT 0
);
"#;

pub const INDEX_TASKS_CREATED_AT: &str =
    "CREATE INDEX IF NOT EXISTS idx_tasks_created_at ON tasks(created_at);";

pub const INDEX_ACHIEVEMENTS_CATEGORY: &str =
    "CREATE INDEX IF NOT EXISTS idx_achievements_category ON achievements(category);";

pub fn schema_statements() -> Vec<&'static str> {
    vec![
        CREATE_TASKS,
        CREATE_MODULE_SETTINGS,
        CREATE_ACHIEVEMENTS,
        CREATE_USER_STATS,
        CREATE_DAILY_RECORDS,
        INDEX_TASKS_CREATED_AT,
        INDEX_ACHIEVEMENTS_CATEGORY,
    ]
}
