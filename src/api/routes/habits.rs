//! Habit Routes
//!
//! - POST /api/habits - Create a habit
//! - PUT /api/habits/:habit_id - Rename, recolour or change kind
//! - DELETE /api/habits/:habit_id - Delete a habit and its logs
//! - POST /api/habits/:habit_id/logs - Record a day (replaces that day's entry)
//! - GET /api/habits/:habit_id/heatmap?year= - SVG calendar heatmap

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
};
use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::dto::{CreateHabitRequest, HeatmapQuery, LogHabitRequest, UpdateHabitRequest};
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::{ApiJson, AuthUser};
use crate::api::state::AppState;
use crate::domain::{Habit, HabitLog, DATE_FORMAT};
use crate::service::{HabitChanges, NewHabit};

fn parse_habit_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest("Invalid habit ID format".to_string()))
}

fn parse_date(raw: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| {
        ApiError::BadRequest("Invalid date format, please use YYYY-MM-DD".to_string())
    })
}

/// POST /api/habits
pub async fn create_habit(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ApiJson(req): ApiJson<CreateHabitRequest>,
) -> ApiResult<(StatusCode, ApiJson<Habit>)> {
    let habit = state
        .service
        .create_habit(
            auth.user_id,
            NewHabit {
                name: req.name,
                color_hue: req.color_hue,
                is_boolean: req.is_boolean,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, ApiJson(habit)))
}

/// PUT /api/habits/:habit_id
pub async fn update_habit(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(habit_id): Path<String>,
    ApiJson(req): ApiJson<UpdateHabitRequest>,
) -> ApiResult<ApiJson<Habit>> {
    let habit_id = parse_habit_id(&habit_id)?;
    let habit = state
        .service
        .update_habit(
            auth.user_id,
            habit_id,
            HabitChanges {
                name: req.name,
                color_hue: req.color_hue,
                is_boolean: req.is_boolean,
            },
        )
        .await?;
    Ok(ApiJson(habit))
}

/// DELETE /api/habits/:habit_id
pub async fn delete_habit(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(habit_id): Path<String>,
) -> ApiResult<StatusCode> {
    let habit_id = parse_habit_id(&habit_id)?;
    state.service.delete_habit(auth.user_id, habit_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/habits/:habit_id/logs
pub async fn log_habit(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(habit_id): Path<String>,
    ApiJson(req): ApiJson<LogHabitRequest>,
) -> ApiResult<ApiJson<HabitLog>> {
    let habit_id = parse_habit_id(&habit_id)?;
    let date = parse_date(&req.date)?;
    let log = state
        .service
        .log_habit(auth.user_id, habit_id, date, req.resolved_value())
        .await?;
    Ok(ApiJson(log))
}

/// GET /api/habits/:habit_id/heatmap
pub async fn heatmap(
    State(state): State<Arc<AppState>>,
    Path(habit_id): Path<String>,
    query: Result<Query<HeatmapQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let habit_id = parse_habit_id(&habit_id)?;
    let Query(query) = query?;
    let svg = state.service.habit_heatmap(habit_id, query.year).await?;
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_helpers() {
        assert!(parse_habit_id("not-a-uuid").is_err());
        assert!(parse_habit_id(&Uuid::new_v4().to_string()).is_ok());

        assert_eq!(
            parse_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        match parse_date("29/02/2024") {
            Err(ApiError::BadRequest(msg)) => assert!(msg.contains("YYYY-MM-DD")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
