//! Fixed achievement catalog and module identifiers. Seeded once into the
//! store; points and thresholds are referenced by the engine checks.

pub struct CatalogEntry {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub points: i64,
    pub category: &'static str,
}

/// Modules that must all appear in the recorded usage set before
/// `all_modules` unlocks.
pub const REQUIRED_MODULES: [&str; 8] = [
    "tasks_goal",
    "calendar",
    "self_talk",
    "achievements",
    "meditation",
    "music",
    "pomodoro",
    "journey",
];

/// Default module settings seed, in display order.
pub const DEFAULT_MODULES: [&str; 8] = [
    "tasks_goal",
    "calendar",
    "self_talk",
    "achievements",
    "meditation",
    "music",
    "pomodoro",
    "journey",
];

pub const CATALOG: [CatalogEntry; 17] = [
    CatalogEntry {
        id: "first_task",
        title: "First Step",
        description: "Complete your very first task",
        icon: "📝",
        points: 10,
        category: "task",
    },
    CatalogEntry {
        id: "daily_5_tasks",
        title: "Productivity Pro",
        description: "Complete 5 tasks in a single day",
        icon: "⚡",
        points: 50,
        category: "task",
    },
    CatalogEntry {
        id: "total_50_tasks",
        title: "Task Master",
        description: "Complete 50 tasks in total",
        icon: "🏅",
        points: 200,
        category: "task",
    },
    CatalogEntry {
        id: "streak_3_days",
        title: "Keeping At It",
        description: "Use the app 3 days in a row",
        icon: "🔥",
        points: 30,
        category: "streak",
    },
    CatalogEntry {
        id: "streak_7_days",
        title: "Habit Formed",
        description: "Stay active 7 days in a row",
        icon: "📅",
        points: 100,
        category: "streak",
    },
    CatalogEntry {
        id: "streak_30_days",
        title: "Unstoppable",
        description: "Check in 30 days in a row",
        icon: "🌟",
        points: 500,
        category: "streak",
    },
    CatalogEntry {
        id: "meditation_first",
        title: "Inner Calm",
        description: "Finish your first meditation session",
        icon: "🧘",
        points: 20,
        category: "module",
    },
    CatalogEntry {
        id: "music_first",
        title: "Music Lover",
        description: "Play the focus music for the first time",
        icon: "🎵",
        points: 20,
        category: "module",
    },
    CatalogEntry {
        id: "all_modules",
        title: "All-Rounder",
        description: "Try every module at least once",
        icon: "🗺️",
        points: 100,
        category: "module",
    },
    CatalogEntry {
        id: "meditation_1_hour",
        title: "Meditation Master",
        description: "Meditate for a cumulative hour",
        icon: "⏳",
        points: 150,
        category: "special",
    },
    CatalogEntry {
        id: "night_owl",
        title: "Night Owl",
        description: "Complete a task after 23:00",
        icon: "🦉",
        points: 25,
        category: "special",
    },
    CatalogEntry {
        id: "daily_all_modules",
        title: "Renaissance Day",
        description: "Use every module within one day",
        icon: "🎨",
        points: 80,
        category: "special",
    },
    CatalogEntry {
        id: "pomodoro_first",
        title: "Tomato Rookie",
        description: "Finish your first pomodoro focus session",
        icon: "🍅",
        points: 20,
        category: "pomodoro",
    },
    CatalogEntry {
        id: "pomodoro_10_sessions",
        title: "Focus Apprentice",
        description: "Finish 10 pomodoro focus sessions",
        icon: "⏲️",
        points: 100,
        category: "pomodoro",
    },
    CatalogEntry {
        id: "pomodoro_master",
        title: "Pomodoro Master",
        description: "Finish 50 pomodoro focus sessions",
        icon: "🏆",
        points: 300,
        category: "pomodoro",
    },
    CatalogEntry {
        id: "pomodoro_legend",
        title: "Pomodoro Legend",
        description: "Finish 100 pomodoro focus sessions",
        icon: "👑",
        points: 500,
        category: "pomodoro",
    },
    CatalogEntry {
        id: "daily_5_pomodoros",
        title: "Focus King",
        description: "Finish 5 pomodoros in a single day",
        icon: "🎯",
        points: 80,
        category: "pomodoro",
    },
];
