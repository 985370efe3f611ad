//! Employee attendance endpoint handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use domain::models::attendance::{
    AttendanceResponse, AttendanceStatusView, CheckInRequest, CheckOutRequest,
};
use domain::models::location::{
    LocationResponse, NearbyLocationsQuery, ValidateLocationRequest, ValidateLocationResponse,
};
use domain::models::schedule::UserScheduleResponse;
use domain::models::GeoPoint;
use domain::DomainError;
use serde::Serialize;
use shared::pagination::{PageParams, Paginated};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::middleware::metrics;

/// Counts client-side refusals before handing the error back to the caller.
fn track_rejection(action: &'static str, err: DomainError) -> ApiError {
    if err.is_client_error() {
        metrics::record_rejection(action, err.code());
    }
    err.into()
}

/// Check in at a location.
///
/// POST /api/v1/attendance/check-in
pub async fn check_in(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CheckInRequest>,
) -> Result<(StatusCode, Json<AttendanceResponse>), ApiError> {
    request.validate()?;

    let record = state
        .attendance
        .check_in(auth.user_id, request)
        .await
        .map_err(|e| track_rejection("check_in", e))?;

    metrics::record_check_in(record.status);
    let entry = state.attendance.describe(record).await?;
    Ok((StatusCode::CREATED, Json(entry.into())))
}

/// Check out of today's check-in location.
///
/// POST /api/v1/attendance/check-out
pub async fn check_out(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CheckOutRequest>,
) -> Result<Json<AttendanceResponse>, ApiError> {
    request.validate()?;

    let record = state
        .attendance
        .check_out(auth.user_id, request)
        .await
        .map_err(|e| track_rejection("check_out", e))?;

    metrics::record_check_out();
    let entry = state.attendance.describe(record).await?;
    Ok(Json(entry.into()))
}

/// GET /api/v1/attendance/today
pub async fn get_today(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<AttendanceResponse>, ApiError> {
    let record = state.attendance.get_today(auth.user_id).await?;
    let entry = state.attendance.describe(record).await?;
    Ok(Json(entry.into()))
}

/// Today's attendance summary; reports "not checked in" instead of 404.
///
/// GET /api/v1/attendance/status
pub async fn get_status(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<AttendanceStatusView>, ApiError> {
    Ok(Json(state.attendance.get_status(auth.user_id).await?))
}

/// The caller's attendance history, newest first.
///
/// GET /api/v1/attendance/history?page=&limit=
pub async fn get_history(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PageParams>,
) -> Result<Json<Paginated<AttendanceResponse>>, ApiError> {
    let limits = &state.config.attendance;
    let page = params.resolve(limits.history_default_limit, limits.max_page_limit);

    let history = state.attendance.get_history(auth.user_id, page).await?;
    let history = state.attendance.describe_page(history).await?;
    Ok(Json(history.map(AttendanceResponse::from)))
}

/// Response for the nearby-locations lookup.
#[derive(Debug, Serialize)]
pub struct NearbyLocationsResponse {
    pub locations: Vec<LocationResponse>,
    pub total: usize,
}

/// Active locations around the caller, nearest first.
///
/// GET /api/v1/attendance/locations?latitude=&longitude=&radius_km=
pub async fn nearby_locations(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<NearbyLocationsQuery>,
) -> Result<Json<NearbyLocationsResponse>, ApiError> {
    query.validate()?;

    let locations: Vec<LocationResponse> = state
        .locations
        .nearby(GeoPoint::new(query.latitude, query.longitude), query.radius_km)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    let total = locations.len();
    Ok(Json(NearbyLocationsResponse { locations, total }))
}

/// Dry-run geofence check before checking in.
///
/// POST /api/v1/attendance/validate-location
pub async fn validate_location(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(request): Json<ValidateLocationRequest>,
) -> Result<Json<ValidateLocationResponse>, ApiError> {
    request.validate()?;

    let check = state
        .locations
        .validate(
            request.location_id,
            GeoPoint::new(request.latitude, request.longitude),
        )
        .await?;
    Ok(Json(check.into()))
}

/// The caller's schedule assignments, latest first.
///
/// GET /api/v1/attendance/schedules
pub async fn my_schedules(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<UserScheduleResponse>>, ApiError> {
    let assignments = state.schedules.list_for_user(auth.user_id).await?;
    Ok(Json(
        assignments
            .into_iter()
            .map(|(assignment, schedule)| UserScheduleResponse::new(assignment, schedule))
            .collect(),
    ))
}
