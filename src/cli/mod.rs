use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "doit", about = "Do It: to-do tracker with achievements, streaks and levels")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create the config and database, seed the achievement catalog and modules
    Init,
    /// Manage tasks
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// List or toggle the optional modules
    Module {
        #[command(subcommand)]
        command: ModuleCommands,
    },
    /// Record that a module was opened
    Open { module: String },
    /// Record a finished meditation session
    Meditate { minutes: i64 },
    /// Record that the focus music was played
    Music,
    /// Record a finished pomodoro focus session
    Pomodoro,
    /// Show the aggregate user statistics and level progress
    Stats,
    /// Show the current activity streak
    Streak,
    /// Show the daily record for a date (default: today)
    Day {
        #[arg(long)]
        date: Option<String>,
    },
    /// Show the monthly rollup
    Month { year: i32, month: u32 },
    /// List achievements
    Achievements {
        #[arg(long, value_enum, default_value_t = AchievementListFilter::All)]
        filter: AchievementListFilter,
    },
    /// Show config and database locations
    Status,
    /// Get or set configuration values
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Run the read-only HTTP API for dashboard observers
    Serve,
}

#[derive(Debug, Subcommand)]
pub enum TaskCommands {
    /// Add a new task
    Add {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Mark a task as completed
    Done { id: i64 },
    /// Re-open a completed task
    Reopen { id: i64 },
    /// List tasks
    List {
        #[arg(long, value_enum, default_value_t = TaskListFilter::All)]
        filter: TaskListFilter,
    },
    /// Delete a task
    Remove { id: i64 },
    /// Delete all tasks
    Clear,
}

#[derive(Debug, Subcommand)]
pub enum ModuleCommands {
    List,
    Enable { name: String },
    Disable { name: String },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    Set { key: String, value: String },
    Get { key: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TaskListFilter {
    All,
    Open,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AchievementListFilter {
    All,
    Unlocked,
    Locked,
}
