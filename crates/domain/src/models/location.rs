//! Attendance location (geofence) domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::geo;

/// A WGS84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A registered work location: a circular zone around a center point.
#[derive(Debug, Clone, PartialEq)]
pub struct Geofence {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub center: GeoPoint,
    pub radius_meters: f64,
    pub active: bool,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of testing a coordinate against a geofence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeofenceCheck {
    pub distance: f64,
    pub inside: bool,
}

impl Geofence {
    /// Measures `point` against this geofence. The radius boundary is inclusive.
    pub fn check(&self, point: GeoPoint) -> GeofenceCheck {
        GeofenceCheck {
            distance: geo::distance(point, self.center),
            inside: geo::within_radius(point, self.center, self.radius_meters),
        }
    }
}

/// Fields required to register a new geofence.
#[derive(Debug, Clone)]
pub struct NewGeofence {
    pub name: String,
    pub description: Option<String>,
    pub center: GeoPoint,
    pub radius_meters: f64,
    pub created_by: Option<i64>,
}

/// Partial update of a geofence. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct GeofencePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_meters: Option<f64>,
    pub active: Option<bool>,
}

impl GeofencePatch {
    /// Applies the patch to an existing geofence in place.
    pub fn apply(&self, geofence: &mut Geofence) {
        if let Some(name) = &self.name {
            geofence.name = name.clone();
        }
        if let Some(description) = &self.description {
            geofence.description = Some(description.clone());
        }
        if let Some(latitude) = self.latitude {
            geofence.center.latitude = latitude;
        }
        if let Some(longitude) = self.longitude {
            geofence.center.longitude = longitude;
        }
        if let Some(radius) = self.radius_meters {
            geofence.radius_meters = radius;
        }
        if let Some(active) = self.active {
            geofence.active = active;
        }
    }
}

/// Request payload for creating a location.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLocationRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,

    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,

    #[validate(range(min = 1, max = 50000, message = "Radius must be between 1 and 50000 meters"))]
    pub radius: i32,
}

impl CreateLocationRequest {
    pub fn into_new_geofence(self, created_by: i64) -> NewGeofence {
        NewGeofence {
            name: self.name,
            description: self.description,
            center: GeoPoint::new(self.latitude, self.longitude),
            radius_meters: f64::from(self.radius),
            created_by: Some(created_by),
        }
    }
}

/// Request payload for updating a location (partial update).
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateLocationRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,

    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: Option<f64>,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: Option<f64>,

    #[validate(range(min = 1, max = 50000, message = "Radius must be between 1 and 50000 meters"))]
    pub radius: Option<i32>,

    pub is_active: Option<bool>,
}

impl From<UpdateLocationRequest> for GeofencePatch {
    fn from(req: UpdateLocationRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            latitude: req.latitude,
            longitude: req.longitude,
            radius_meters: req.radius.map(f64::from),
            active: req.is_active,
        }
    }
}

/// Query parameters for listing locations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListLocationsQuery {
    pub is_active: Option<bool>,
}

/// Query parameters for the nearby-locations lookup.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NearbyLocationsQuery {
    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,

    #[validate(custom(function = "shared::validation::validate_radius_km"))]
    pub radius_km: f64,
}

/// Request payload for a dry-run geofence check.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ValidateLocationRequest {
    pub location_id: i64,

    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,
}

/// Response payload for a dry-run geofence check.
#[derive(Debug, Clone, Serialize)]
pub struct ValidateLocationResponse {
    pub is_valid: bool,
    pub distance: f64,
}

impl From<GeofenceCheck> for ValidateLocationResponse {
    fn from(check: GeofenceCheck) -> Self {
        Self {
            is_valid: check.inside,
            distance: geo::round_distance(check.distance),
        }
    }
}

/// Response payload for location operations.
#[derive(Debug, Clone, Serialize)]
pub struct LocationResponse {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub radius: f64,
    pub is_active: bool,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Geofence> for LocationResponse {
    fn from(g: Geofence) -> Self {
        Self {
            id: g.id,
            name: g.name,
            description: g.description,
            latitude: g.center.latitude,
            longitude: g.center.longitude,
            radius: g.radius_meters,
            is_active: g.active,
            created_by: g.created_by,
            created_at: g.created_at,
            updated_at: g.updated_at,
        }
    }
}
