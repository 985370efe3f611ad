//! Attendance entity (database row mapping).

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

use domain::models::attendance::{AttendanceRecord, AttendanceStatus, CheckOutEvent};
use domain::models::location::GeoPoint;

/// Database row mapping for the attendances table.
#[derive(Debug, Clone, FromRow)]
pub struct AttendanceEntity {
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
    pub status: String,
    pub notes: String,
    pub photo_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AttendanceEntity {
    /// Convert to domain model.
    ///
    /// The check-out event is only present when its time and both
    /// coordinates are set.
    pub fn into_domain(self) -> AttendanceRecord {
        let status = self
            .status
            .parse::<AttendanceStatus>()
            .unwrap_or(AttendanceStatus::Present);

        let check_out = match (
            self.check_out_time,
            self.check_out_latitude,
            self.check_out_longitude,
        ) {
            (Some(time), Some(latitude), Some(longitude)) => Some(CheckOutEvent {
                time,
                point: GeoPoint::new(latitude, longitude),
            }),
            _ => None,
        };

        AttendanceRecord {
            id: self.id,
            user_id: self.user_id,
            location_id: self.location_id,
            attendance_date: self.attendance_date,
            check_in_time: self.check_in_time,
            check_in_point: GeoPoint::new(self.check_in_latitude, self.check_in_longitude),
            distance_from_location: self.distance_from_location,
            check_out,
            status,
            notes: self.notes,
            photo_url: self.photo_url,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
