//! Common validation utilities.

use validator::ValidationError;

/// Largest search radius accepted by the nearby-locations lookup, in kilometres.
pub const MAX_NEARBY_RADIUS_KM: f64 = 50.0;

/// Smallest search radius accepted by the nearby-locations lookup, in kilometres.
pub const MIN_NEARBY_RADIUS_KM: f64 = 0.1;

/// Validates that a latitude value is within valid range (-90 to 90).
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        let mut err = ValidationError::new("latitude_range");
        err.message = Some("Latitude must be between -90 and 90".into());
        Err(err)
    }
}

/// Validates that a longitude value is within valid range (-180 to 180).
pub fn validate_longitude(lon: f64) -> Result<(), ValidationError> {
    if (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        let mut err = ValidationError::new("longitude_range");
        err.message = Some("Longitude must be between -180 and 180".into());
        Err(err)
    }
}

/// Validates a nearby-search radius in kilometres (0.1 to 50).
pub fn validate_radius_km(radius_km: f64) -> Result<(), ValidationError> {
    if (MIN_NEARBY_RADIUS_KM..=MAX_NEARBY_RADIUS_KM).contains(&radius_km) {
        Ok(())
    } else {
        let mut err = ValidationError::new("radius_km_range");
        err.message = Some("Radius must be between 0.1 and 50 km".into());
        Err(err)
    }
}

/// Validates a list of ISO weekdays (1 = Monday .. 7 = Sunday).
///
/// The list must be non-empty and free of duplicates.
pub fn validate_work_days(days: &[u8]) -> Result<(), ValidationError> {
    if days.is_empty() {
        let mut err = ValidationError::new("work_days_empty");
        err.message = Some("At least one work day is required".into());
        return Err(err);
    }

    if days.iter().any(|d| !(1..=7).contains(d)) {
        let mut err = ValidationError::new("work_days_range");
        err.message = Some("Work days must be between 1 (Monday) and 7 (Sunday)".into());
        return Err(err);
    }

    let mut seen = [false; 8];
    for &day in days {
        if seen[day as usize] {
            let mut err = ValidationError::new("work_days_duplicate");
            err.message = Some("Work days must not contain duplicates".into());
            return Err(err);
        }
        seen[day as usize] = true;
    }

    Ok(())
}
