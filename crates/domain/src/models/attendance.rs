//! Attendance ledger domain model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use super::location::{GeoPoint, Geofence, LocationResponse};

// ============================================================================
// Status & State
// ============================================================================

/// Classification of a check-in, fixed when the record is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Late,
    HalfDay,
}

impl AttendanceStatus {
    /// Returns the string representation for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Late => "late",
            AttendanceStatus::HalfDay => "half_day",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "present" => Ok(AttendanceStatus::Present),
            "late" => Ok(AttendanceStatus::Late),
            "half_day" => Ok(AttendanceStatus::HalfDay),
            _ => Err(format!(
                "Invalid attendance status: {}. Must be one of: present, late, half_day",
                s
            )),
        }
    }
}

/// Per-user, per-day position in the attendance lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceState {
    NoRecord,
    CheckedIn,
    CheckedOut,
}

impl AttendanceState {
    /// Derives the state from today's record, if any.
    pub fn of(record: Option<&AttendanceRecord>) -> Self {
        match record {
            None => AttendanceState::NoRecord,
            Some(r) if r.check_out.is_some() => AttendanceState::CheckedOut,
            Some(_) => AttendanceState::CheckedIn,
        }
    }

    /// Check if transition to target state is valid.
    pub fn can_transition_to(&self, target: AttendanceState) -> bool {
        matches!(
            (self, target),
            (AttendanceState::NoRecord, AttendanceState::CheckedIn)
                | (AttendanceState::CheckedIn, AttendanceState::CheckedOut)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AttendanceState::CheckedOut)
    }
}

// ============================================================================
// Core Model
// ============================================================================

/// Check-out half of a record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckOutEvent {
    pub time: DateTime<Utc>,
    pub point: GeoPoint,
}

/// One ledger row: a user's attendance on one calendar date.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceRecord {
    pub id: i64,
    pub user_id: i64,
    pub location_id: i64,
    /// Calendar date of the check-in in the service's day boundary.
    pub attendance_date: NaiveDate,
    pub check_in_time: DateTime<Utc>,
    pub check_in_point: GeoPoint,
    /// Meters from the geofence center at check-in, two decimals.
    pub distance_from_location: f64,
    pub check_out: Option<CheckOutEvent>,
    pub status: AttendanceStatus,
    pub notes: String,
    pub photo_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AttendanceRecord {
    pub fn state(&self) -> AttendanceState {
        AttendanceState::of(Some(self))
    }

    /// Elapsed time between check-in and check-out.
    pub fn work_duration(&self) -> Option<chrono::Duration> {
        self.check_out.map(|out| out.time - self.check_in_time)
    }
}

/// Fields written by a successful check-in.
#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub user_id: i64,
    pub location_id: i64,
    pub attendance_date: NaiveDate,
    pub check_in_time: DateTime<Utc>,
    pub check_in_point: GeoPoint,
    pub distance_from_location: f64,
    pub status: AttendanceStatus,
    pub notes: String,
    pub photo_url: String,
}

/// Fields written by a successful check-out.
#[derive(Debug, Clone)]
pub struct CheckOutUpdate {
    pub record_id: i64,
    pub event: CheckOutEvent,
    pub notes: String,
}

/// Separator used when a check-out note is appended to existing notes.
pub const NOTES_SEPARATOR: &str = " | ";

/// Appends `addition` to `existing`, never replacing what is there.
pub fn append_note(existing: &str, addition: Option<&str>) -> String {
    match addition.map(str::trim).filter(|n| !n.is_empty()) {
        None => existing.to_string(),
        Some(note) if existing.is_empty() => note.to_string(),
        Some(note) => format!("{}{}{}", existing, NOTES_SEPARATOR, note),
    }
}

/// Formats a duration as whole hours and minutes, e.g. `8h30m0s`.
pub fn format_work_duration(duration: chrono::Duration) -> String {
    let total_minutes = duration.num_minutes().max(0);
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    if hours > 0 {
        format!("{}h{}m0s", hours, minutes)
    } else if minutes > 0 {
        format!("{}m0s", minutes)
    } else {
        "0s".to_string()
    }
}

// ============================================================================
// Filters
// ============================================================================

/// Conjunctive filter for the administrative attendance listing.
///
/// Dates are inclusive and compare against `attendance_date`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttendanceFilter {
    pub user_id: Option<i64>,
    pub location_id: Option<i64>,
    pub status: Option<AttendanceStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl AttendanceFilter {
    /// Returns true if the record satisfies every provided filter.
    pub fn matches(&self, record: &AttendanceRecord) -> bool {
        self.user_id.map_or(true, |id| record.user_id == id)
            && self.location_id.map_or(true, |id| record.location_id == id)
            && self.status.map_or(true, |s| record.status == s)
            && self.date_from.map_or(true, |d| record.attendance_date >= d)
            && self.date_to.map_or(true, |d| record.attendance_date <= d)
    }
}

// ============================================================================
// Request DTOs
// ============================================================================

/// Request payload for checking in.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CheckInRequest {
    pub location_id: i64,

    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,

    #[validate(length(max = 500, message = "Photo URL must be at most 500 characters"))]
    pub photo_url: Option<String>,

    #[validate(length(max = 1000, message = "Notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}

impl CheckInRequest {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Request payload for checking out.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CheckOutRequest {
    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,

    #[validate(length(max = 1000, message = "Notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}

impl CheckOutRequest {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

// ============================================================================
// Response DTOs
// ============================================================================

/// Response payload for attendance records.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceResponse {
    pub id: i64,
    pub user_id: i64,
    pub location_id: i64,
    pub attendance_date: NaiveDate,
    pub check_in_time: DateTime<Utc>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub check_in_latitude: f64,
    pub check_in_longitude: f64,
    pub check_out_latitude: Option<f64>,
    pub check_out_longitude: Option<f64>,
    pub distance_from_location: f64,
    pub status: AttendanceStatus,
    pub notes: String,
    pub photo_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AttendanceRecord> for AttendanceResponse {
    fn from(r: AttendanceRecord) -> Self {
        let work_duration = r.work_duration().map(format_work_duration);
        Self {
            id: r.id,
            user_id: r.user_id,
            location_id: r.location_id,
            attendance_date: r.attendance_date,
            check_in_time: r.check_in_time,
            check_out_time: r.check_out.map(|o| o.time),
            check_in_latitude: r.check_in_point.latitude,
            check_in_longitude: r.check_in_point.longitude,
            check_out_latitude: r.check_out.map(|o| o.point.latitude),
            check_out_longitude: r.check_out.map(|o| o.point.longitude),
            distance_from_location: r.distance_from_location,
            status: r.status,
            notes: r.notes,
            photo_url: r.photo_url,
            work_duration,
            location: None,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// A ledger row together with the geofence it was recorded at.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceEntry {
    pub record: AttendanceRecord,
    pub location: Option<Geofence>,
}

impl From<AttendanceEntry> for AttendanceResponse {
    fn from(entry: AttendanceEntry) -> Self {
        Self {
            location: entry.location.map(Into::into),
            ..entry.record.into()
        }
    }
}

/// Today's attendance summary for a user. Never an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceStatusView {
    pub has_checked_in: bool,
    pub has_checked_out: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_out_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AttendanceStatus>,
}

impl AttendanceStatusView {
    pub fn not_checked_in() -> Self {
        Self {
            has_checked_in: false,
            has_checked_out: false,
            message: Some("You haven't checked in today".to_string()),
            check_in_time: None,
            check_out_time: None,
            location: None,
            status: None,
        }
    }

    pub fn from_record(record: &AttendanceRecord, location_name: Option<String>) -> Self {
        Self {
            has_checked_in: true,
            has_checked_out: record.check_out.is_some(),
            message: None,
            check_in_time: Some(record.check_in_time),
            check_out_time: record.check_out.map(|o| o.time),
            location: location_name,
            status: Some(record.status),
        }
    }
}
