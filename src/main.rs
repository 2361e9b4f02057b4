mod achievements;
mod api;
mod calendar;
mod cli;
mod config;
mod db;
mod tasks;

use crate::achievements::EngineEvent;
use crate::cli::{
    AchievementListFilter, Cli, Commands, ConfigCommands, ModuleCommands, TaskCommands,
    TaskListFilter,
};
use crate::config::Config;
use crate::db::{AchievementFilter, Database, Task, TaskFilter};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => handle_init(),
        Commands::Task { command } => handle_task_command(command),
        Commands::Module { command } => handle_module_command(command),
        Commands::Open { module } => handle_open(&module),
        Commands::Meditate { minutes } => handle_meditate(minutes),
        Commands::Music => handle_music(),
        Commands::Pomodoro => handle_pomodoro(),
        Commands::Stats => handle_stats(),
        Commands::Streak => handle_streak(),
        Commands::Day { date } => handle_day(date),
        Commands::Month { year, month } => handle_month(year, month),
        Commands::Achievements { filter } => handle_achievements(filter),
        Commands::Status => handle_status(),
        Commands::Config { command } => handle_config_command(command),
        Commands::Serve => handle_serve().await,
    }
}

fn handle_init() -> Result<()> {
    let config = load_or_default_config()?;
    let _ = open_tracker(&config)?;

    println!("Do It initialized");
    println!("- config: {}", Config::config_path().display());
    println!("- database: {}", config.db_path.display());

    Ok(())
}

fn handle_task_command(command: TaskCommands) -> Result<()> {
    let config = load_config()?;
    let mut database = open_tracker(&config)?;
    let now = Local::now();

    match command {
        TaskCommands::Add { title, description } => {
            let task = tasks::add(&database, &title, &description, now)?;
            println!("Task #{} added: {}", task.id, task.title);
        }
        TaskCommands::Done { id } => {
            let (task, events) = tasks::complete(&mut database, id, now)?;
            println!("Task #{} completed: {}", task.id, task.title);
            print_events(&events);
        }
        TaskCommands::Reopen { id } => {
            let task = tasks::reopen(&database, id, now)?;
            println!("Task #{} reopened: {}", task.id, task.title);
        }
        TaskCommands::List { filter } => {
            let filter = match filter {
                TaskListFilter::All => TaskFilter::All,
                TaskListFilter::Open => TaskFilter::Open,
                TaskListFilter::Done => TaskFilter::Done,
            };
            let tasks = tasks::list(&database, filter)?;
            if tasks.is_empty() {
                println!("No tasks");
            } else {
                tasks.iter().for_each(print_task_line);
            }
        }
        TaskCommands::Remove { id } => {
            tasks::remove(&database, id, now)?;
            println!("Task #{id} removed");
        }
        TaskCommands::Clear => {
            let removed = tasks::clear(&database, now)?;
            println!("Removed {removed} task(s)");
        }
    }

    Ok(())
}

fn handle_module_command(command: ModuleCommands) -> Result<()> {
    let config = load_config()?;
    let database = open_tracker(&config)?;

    match command {
        ModuleCommands::List => {
            for setting in database.module_settings()? {
                let marker = if setting.is_enabled { "on " } else { "off" };
                println!("[{marker}] {}", setting.module_name);
            }
        }
        ModuleCommands::Enable { name } => {
            if database.set_module_enabled(&name, true)? {
                println!("Module enabled: {name}");
            } else {
                println!("Unknown module: {name}");
            }
        }
        ModuleCommands::Disable { name } => {
            if database.set_module_enabled(&name, false)? {
                println!("Module disabled: {name}");
            } else {
                println!("Unknown module: {name}");
            }
        }
    }

    Ok(())
}

fn handle_open(module: &str) -> Result<()> {
    let config = load_config()?;
    let mut database = open_tracker(&config)?;

    let events = achievements::check_module_usage(&mut database, module, Local::now())?;
    println!("Module usage recorded: {module}");
    print_events(&events);

    Ok(())
}

fn handle_meditate(minutes: i64) -> Result<()> {
    anyhow::ensure!(minutes > 0, "Meditation minutes must be positive");

    let config = load_config()?;
    let mut database = open_tracker(&config)?;
    let now = Local::now();

    calendar::record_meditation_usage(&database, minutes, now)?;
    let events = achievements::check_meditation_time(&mut database, minutes, now)?;
    println!("Meditation recorded: {minutes} minute(s)");
    print_events(&events);

    Ok(())
}

fn handle_music() -> Result<()> {
    let config = load_config()?;
    let mut database = open_tracker(&config)?;
    let now = Local::now();

    calendar::record_music_usage(&database, now)?;
    let events = achievements::check_module_usage(&mut database, "music", now)?;
    println!("Music session recorded");
    print_events(&events);

    Ok(())
}

fn handle_pomodoro() -> Result<()> {
    let config = load_config()?;
    let mut database = open_tracker(&config)?;
    let now = Local::now();

    calendar::record_pomodoro_session(&database, now)?;
    let events = achievements::check_pomodoro_completion(&mut database, now)?;
    println!("Pomodoro session recorded");
    print_events(&events);

    Ok(())
}

fn handle_stats() -> Result<()> {
    let config = load_config()?;
    let database = open_tracker(&config)?;
    let stats = database.require_user_stats()?;

    println!("Do It stats");
    println!(
        "- level: {} ({})",
        stats.current_level,
        achievements::level_name(stats.current_level)
    );
    println!(
        "- points: {} / {} ({}%)",
        stats.total_points,
        achievements::points_for_next_level(stats.total_points),
        achievements::level_progress_percent(stats.total_points)
    );
    println!("- completed tasks (lifetime): {}", stats.completed_tasks);
    println!("- completed tasks (today): {}", stats.today_completed_tasks);
    println!(
        "- streak: {} (longest {})",
        stats.current_streak, stats.longest_streak
    );
    println!("- meditation minutes: {}", stats.meditation_minutes);
    println!("- music sessions: {}", stats.music_usage_count);
    println!("- pomodoro sessions: {}", stats.pomodoro_sessions);
    println!(
        "- modules used: {}",
        if stats.modules_unlocked.is_empty() {
            "none".to_string()
        } else {
            stats.modules_unlocked.clone()
        }
    );

    Ok(())
}

fn handle_streak() -> Result<()> {
    let config = load_config()?;
    let database = open_tracker(&config)?;

    let today = Local::now().date_naive();
    let streak = calendar::current_streak(&database, today)?;
    println!("Current streak: {streak} day(s)");

    Ok(())
}

fn handle_day(date: Option<String>) -> Result<()> {
    let config = load_config()?;
    let database = open_tracker(&config)?;
    let target_date = parse_optional_date(date)?;

    match database.daily_record(target_date)? {
        Some(record) => {
            println!("Daily record {target_date}");
            println!(
                "- tasks: {}/{} ({}%, {})",
                record.completed_tasks,
                record.total_tasks,
                record.completion_rate(),
                record.day_status()
            );
            println!("- meditation minutes: {}", record.meditation_minutes);
            println!("- music used: {}", record.music_used);
            println!("- pomodoro sessions: {}", record.pomodoro_sessions);
        }
        None => println!("No record for {target_date}"),
    }

    Ok(())
}

fn handle_month(year: i32, month: u32) -> Result<()> {
    anyhow::ensure!((1..=12).contains(&month), "Invalid month: {month}");

    let config = load_config()?;
    let database = open_tracker(&config)?;
    let stats = calendar::monthly_stats(&database, year, month)?;

    println!("Monthly stats {year:04}-{month:02}");
    println!("- recorded days: {}", stats.total_days);
    println!("- active days: {}", stats.active_days);
    println!("- perfect days: {}", stats.perfect_days);
    println!(
        "- tasks: {}/{} ({}%)",
        stats.completed_tasks, stats.total_tasks, stats.completion_rate
    );

    Ok(())
}

fn handle_achievements(filter: AchievementListFilter) -> Result<()> {
    let config = load_config()?;
    let database = open_tracker(&config)?;

    let filter = match filter {
        AchievementListFilter::All => AchievementFilter::All,
        AchievementListFilter::Unlocked => AchievementFilter::Unlocked,
        AchievementListFilter::Locked => AchievementFilter::Locked,
    };

    for achievement in database.achievements(filter)? {
        let marker = if achievement.state.is_unlocked() {
            achievement.icon.as_str()
        } else {
            "🔒"
        };
        println!(
            "{marker} {} (+{} pts, {}) - {}",
            achievement.title, achievement.points, achievement.category, achievement.description
        );
    }

    Ok(())
}

fn handle_status() -> Result<()> {
    let config = load_or_default_config()?;
    let database = Database::open(&config.db_path)?;

    println!("Do It status");
    println!("- config: {}", Config::config_path().display());
    println!("- database: {}", config.db_path.display());
    println!("- api_port: {}", config.api_port);
    println!(
        "- initialized: {}",
        database.user_stats()?.is_some()
    );
    println!(
        "- achievements unlocked: {}/{}",
        database.achievements(AchievementFilter::Unlocked)?.len(),
        database.achievements_count()?
    );

    Ok(())
}

fn handle_config_command(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Set { key, value } => {
            let mut config = load_or_default_config()?;
            config.set_value(&key, &value)?;
            config.ensure_bootstrap_files()?;
            config.save()?;
            println!("Config saved: {key} = {value}");
            Ok(())
        }
        ConfigCommands::Get { key } => {
            let config = load_config()?;
            let value = config
                .get_value(&key)
                .with_context(|| format!("Unsupported config key: {key}"))?;
            println!("{value}");
            Ok(())
        }
    }
}

async fn handle_serve() -> Result<()> {
    let config = load_config()?;
    let _ = open_tracker(&config)?;

    let shared_config = Arc::new(config);

    tokio::select! {
        api_result = api::run_server(Arc::clone(&shared_config)) => {
            api_result?;
        }
        _ = signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    Ok(())
}

/// Opens the database and runs the idempotent startup pass: seed the module
/// settings and achievement catalog, create the stats row, record the daily
/// streak. Any streak unlocks are printed right away.
fn open_tracker(config: &Config) -> Result<Database> {
    let mut database = Database::open(&config.db_path)?;
    database.seed_modules(&achievements::catalog::DEFAULT_MODULES)?;
    let events = achievements::initialize(&mut database, Local::now())?;
    print_events(&events);

    Ok(database)
}

fn print_events(events: &[EngineEvent]) {
    events.iter().for_each(|event| println!("{event}"));
}

fn print_task_line(task: &Task) {
    let marker = if task.is_completed { "x" } else { " " };
    println!("[{marker}] #{} {}", task.id, task.title);
}

fn parse_optional_date(input: Option<String>) -> Result<NaiveDate> {
    input
        .as_deref()
        .map(|date| {
            NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .with_context(|| format!("Invalid date format: {date}. Example: 2026-03-01"))
        })
        .transpose()?
        .map_or_else(|| Ok(Local::now().date_naive()), Ok)
}

fn load_or_default_config() -> Result<Config> {
    Config::load().or_else(|_| {
        let config = Config::default();
        config.ensure_bootstrap_files()?;
        config.save()?;
        Ok(config)
    })
}

fn load_config() -> Result<Config> {
    Config::load().with_context(|| "Config file not found. Run `doit init` first.".to_string())
}
