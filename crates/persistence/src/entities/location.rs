//! Attendance location entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::location::{GeoPoint, Geofence};

/// Database row mapping for the attendance_locations table.
#[derive(Debug, Clone, FromRow)]
pub struct LocationEntity {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub radius: f64,
    pub is_active: bool,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<LocationEntity> for Geofence {
    fn from(entity: LocationEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            description: entity.description,
            center: GeoPoint::new(entity.latitude, entity.longitude),
            radius_meters: entity.radius,
            active: entity.is_active,
            created_by: entity.created_by,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
