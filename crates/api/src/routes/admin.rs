//! Administrative attendance listing.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use domain::models::attendance::{AttendanceFilter, AttendanceResponse};
use domain::models::AttendanceStatus;
use serde::Deserialize;
use shared::pagination::{PageParams, Paginated};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AdminUser;

/// Query string of the admin listing: the filter plus paging.
///
/// Kept flat because `serde(flatten)` cannot parse numbers out of a query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListAttendancesQuery {
    pub user_id: Option<i64>,
    pub location_id: Option<i64>,
    pub status: Option<AttendanceStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListAttendancesQuery {
    pub fn into_parts(self) -> (AttendanceFilter, PageParams) {
        (
            AttendanceFilter {
                user_id: self.user_id,
                location_id: self.location_id,
                status: self.status,
                date_from: self.date_from,
                date_to: self.date_to,
            },
            PageParams {
                page: self.page,
                limit: self.limit,
            },
        )
    }
}

/// All users' attendance, filtered and paginated.
///
/// GET /api/v1/admin/attendances
pub async fn list_attendances(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Query(query): Query<ListAttendancesQuery>,
) -> Result<Json<Paginated<AttendanceResponse>>, ApiError> {
    let (filter, params) = query.into_parts();
    let limits = &state.config.attendance;
    let page = params.resolve(limits.admin_default_limit, limits.max_page_limit);

    tracing::debug!(admin_id = admin.user_id, ?filter, "Listing attendances");

    let records = state.attendance.list_all(&filter, page).await?;
    let records = state.attendance.describe_page(records).await?;
    Ok(Json(records.map(AttendanceResponse::from)))
}
