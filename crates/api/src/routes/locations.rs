//! Administrative location (geofence) endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::location::{
    CreateLocationRequest, ListLocationsQuery, LocationResponse, UpdateLocationRequest,
};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AdminUser;

/// Register a new, active location.
///
/// POST /api/v1/admin/locations
pub async fn create_location(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(request): Json<CreateLocationRequest>,
) -> Result<(StatusCode, Json<LocationResponse>), ApiError> {
    request.validate()?;

    let location = state
        .locations
        .create(request.into_new_geofence(admin.user_id))
        .await?;
    Ok((StatusCode::CREATED, Json(location.into())))
}

/// GET /api/v1/admin/locations?is_active=
pub async fn list_locations(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<ListLocationsQuery>,
) -> Result<Json<Vec<LocationResponse>>, ApiError> {
    let locations = state.locations.list(query.is_active).await?;
    Ok(Json(locations.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/admin/locations/:id
pub async fn get_location(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<LocationResponse>, ApiError> {
    Ok(Json(state.locations.get(id).await?.into()))
}

/// Partial update; omitted fields keep their values.
///
/// PUT /api/v1/admin/locations/:id
pub async fn update_location(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateLocationRequest>,
) -> Result<Json<LocationResponse>, ApiError> {
    request.validate()?;

    let location = state.locations.update(id, request.into()).await?;
    Ok(Json(location.into()))
}

/// Fails with 409 while attendance records or assignments still reference the location.
///
/// DELETE /api/v1/admin/locations/:id
pub async fn delete_location(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.locations.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
