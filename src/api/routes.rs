use crate::achievements;
use crate::calendar::{self, MonthlyStats};
use crate::config::Config;
use crate::db::{Achievement, AchievementFilter, DailyRecord, Database, DayStatus, Task, TaskFilter, UserStats};
use anyhow::Result;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Json;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<Config>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/status", get(status))
        .route("/api/v1/stats", get(stats))
        .route("/api/v1/achievements", get(achievements_list))
        .route("/api/v1/daily/:date", get(daily))
        .route("/api/v1/month/:year/:month", get(month))
        .route("/api/v1/streak", get(streak))
        .route("/api/v1/tasks", get(tasks))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct FilterQuery {
    filter: Option<String>,
}

#[derive(Debug, Serialize)]
struct StatusPayload {
    db_path: String,
    api_port: u16,
    initialized: bool,
}

#[derive(Debug, Serialize)]
struct StatsPayload {
    #[serde(flatten)]
    stats: UserStats,
    level_name: &'static str,
    points_for_next_level: i64,
    level_progress_percent: i64,
}

#[derive(Debug, Serialize)]
struct AchievementsPayload {
    count: usize,
    achievements: Vec<Achievement>,
}

#[derive(Debug, Serialize)]
struct DayView {
    #[serde(flatten)]
    record: DailyRecord,
    completion_rate: i64,
    day_status: DayStatus,
}

impl From<DailyRecord> for DayView {
    fn from(record: DailyRecord) -> Self {
        let completion_rate = record.completion_rate();
        let day_status = record.day_status();
        Self {
            record,
            completion_rate,
            day_status,
        }
    }
}

#[derive(Debug, Serialize)]
struct MonthPayload {
    stats: MonthlyStats,
    records: Vec<DayView>,
}

#[derive(Debug, Serialize)]
struct StreakPayload {
    date: String,
    streak: i64,
}

#[derive(Debug, Serialize)]
struct TasksPayload {
    count: usize,
    tasks: Vec<Task>,
}

async fn status(State(state): State<ApiState>) -> ApiResult<Json<StatusPayload>> {
    let database = Database::open(&state.config.db_path)?;

    Ok(Json(StatusPayload {
        db_path: state.config.db_path.display().to_string(),
        api_port: state.config.api_port,
        initialized: database.user_stats()?.is_some(),
    }))
}

async fn stats(State(state): State<ApiState>) -> ApiResult<Json<StatsPayload>> {
    let database = Database::open(&state.config.db_path)?;
    let stats = database
        .user_stats()?
        .ok_or_else(|| ApiError::NotFound("User stats not initialized".to_string()))?;

    let payload = StatsPayload {
        level_name: achievements::level_name(stats.current_level),
        points_for_next_level: achievements::points_for_next_level(stats.total_points),
        level_progress_percent: achievements::level_progress_percent(stats.total_points),
        stats,
    };

    Ok(Json(payload))
}

async fn achievements_list(
    State(state): State<ApiState>,
    Query(query): Query<FilterQuery>,
) -> ApiResult<Json<AchievementsPayload>> {
    let filter = match query.filter.as_deref() {
        None | Some("all") => AchievementFilter::All,
        Some("unlocked") => AchievementFilter::Unlocked,
        Some("locked") => AchievementFilter::Locked,
        Some(other) => {
            return Err(ApiError::BadRequest(format!(
                "Unknown filter: {other}. Expected all, unlocked or locked"
            )));
        }
    };

    let database = Database::open(&state.config.db_path)?;
    let achievements = database.achievements(filter)?;

    Ok(Json(AchievementsPayload {
        count: achievements.len(),
        achievements,
    }))
}

async fn daily(
    State(state): State<ApiState>,
    Path(date): Path<String>,
) -> ApiResult<Json<DayView>> {
    let target_date = parse_date(&date)?;
    let database = Database::open(&state.config.db_path)?;

    let record = database
        .daily_record(target_date)?
        .ok_or_else(|| ApiError::NotFound(format!("No daily record for date: {target_date}")))?;

    Ok(Json(DayView::from(record)))
}

async fn month(
    State(state): State<ApiState>,
    Path((year, month)): Path<(i32, u32)>,
) -> ApiResult<Json<MonthPayload>> {
    if !(1..=12).contains(&month) {
        return Err(ApiError::BadRequest(format!("Invalid month: {month}")));
    }

    let database = Database::open(&state.config.db_path)?;
    let stats = calendar::monthly_stats(&database, year, month)?;
    let records = database
        .records_for_month(year, month)?
        .into_iter()
        .map(DayView::from)
        .collect();

    Ok(Json(MonthPayload { stats, records }))
}

async fn streak(State(state): State<ApiState>) -> ApiResult<Json<StreakPayload>> {
    let database = Database::open(&state.config.db_path)?;
    let today = Local::now().date_naive();
    let streak = calendar::current_streak(&database, today)?;

    Ok(Json(StreakPayload {
        date: today.format("%Y-%m-%d").to_string(),
        streak,
    }))
}

async fn tasks(
    State(state): State<ApiState>,
    Query(query): Query<FilterQuery>,
) -> ApiResult<Json<TasksPayload>> {
    let filter = match query.filter.as_deref() {
        None | Some("all") => TaskFilter::All,
        Some("open") => TaskFilter::Open,
        Some("done") => TaskFilter::Done,
        Some(other) => {
            return Err(ApiError::BadRequest(format!(
                "Unknown filter: {other}. Expected all, open or done"
            )));
        }
    };

    let database = Database::open(&state.config.db_path)?;
    let tasks = database.list_tasks(filter)?;

    Ok(Json(TasksPayload {
        count: tasks.len(),
        tasks,
    }))
}

fn parse_date(input: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("Invalid date format: {input}. Example: 2026-03-01")))
}

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Internal(error) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": error.to_string() })),
            )
                .into_response(),
        }
    }
}
