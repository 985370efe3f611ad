//! Administrative work schedule endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::schedule::{
    AssignScheduleRequest, CreateScheduleRequest, ScheduleResponse, UpdateScheduleRequest,
    UserScheduleResponse, UserSchedulesQuery,
};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AdminUser;

/// POST /api/v1/admin/schedules
pub async fn create_schedule(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(request): Json<CreateScheduleRequest>,
) -> Result<(StatusCode, Json<ScheduleResponse>), ApiError> {
    request.validate()?;

    let schedule = state.schedules.create(request.into()).await?;
    Ok((StatusCode::CREATED, Json(schedule.into())))
}

/// GET /api/v1/admin/schedules
pub async fn list_schedules(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<ScheduleResponse>>, ApiError> {
    let schedules = state.schedules.list().await?;
    Ok(Json(schedules.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/admin/schedules/:id
pub async fn get_schedule(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<ScheduleResponse>, ApiError> {
    Ok(Json(state.schedules.get(id).await?.into()))
}

/// PUT /api/v1/admin/schedules/:id
pub async fn update_schedule(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateScheduleRequest>,
) -> Result<Json<ScheduleResponse>, ApiError> {
    request.validate()?;

    let schedule = state.schedules.update(id, request).await?;
    Ok(Json(schedule.into()))
}

/// Deletes the schedule and every assignment using it.
///
/// DELETE /api/v1/admin/schedules/:id
pub async fn delete_schedule(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.schedules.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/admin/schedules/assign
pub async fn assign_schedule(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(request): Json<AssignScheduleRequest>,
) -> Result<(StatusCode, Json<UserScheduleResponse>), ApiError> {
    let assignment = state.schedules.assign(request.into()).await?;
    let schedule = state.schedules.get(assignment.schedule_id).await.ok();
    Ok((
        StatusCode::CREATED,
        Json(UserScheduleResponse::new(assignment, schedule)),
    ))
}

/// GET /api/v1/admin/schedules/user?user_id=
pub async fn list_user_schedules(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<UserSchedulesQuery>,
) -> Result<Json<Vec<UserScheduleResponse>>, ApiError> {
    let assignments = state.schedules.list_for_user(query.user_id).await?;
    Ok(Json(
        assignments
            .into_iter()
            .map(|(assignment, schedule)| UserScheduleResponse::new(assignment, schedule))
            .collect(),
    ))
}
