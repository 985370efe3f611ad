//! Great-circle distance and radius containment.

use crate::models::location::GeoPoint;

/// Mean Earth radius in meters used by the haversine formula.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine distance between two points, in meters.
pub fn distance(p1: GeoPoint, p2: GeoPoint) -> f64 {
    let lat1 = p1.latitude.to_radians();
    let lat2 = p2.latitude.to_radians();
    let d_lat = (p2.latitude - p1.latitude).to_radians();
    let d_lon = (p2.longitude - p1.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Returns true when `point` lies within `radius_meters` of `center`.
///
/// The boundary is inclusive.
pub fn within_radius(point: GeoPoint, center: GeoPoint, radius_meters: f64) -> bool {
    distance(point, center) <= radius_meters
}

/// Rounds a distance to centimetre precision, as persisted on attendance rows.
pub fn round_distance(meters: f64) -> f64 {
    (meters * 100.0).round() / 100.0
}

#[cfg(test)]
pub(crate) fn offset_north(point: GeoPoint, meters: f64) -> GeoPoint {
    GeoPoint {
        latitude: point.latitude + (meters / EARTH_RADIUS_METERS).to_degrees(),
        longitude: point.longitude,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(latitude: f64, longitude: f64) -> GeoPoint {
        GeoPoint {
            latitude,
            longitude,
        }
    }

    #[test]
    fn test_zero_distance() {
        let a = p(-6.2, 106.8167);
        assert_eq!(distance(a, a), 0.0);
    }

    #[test]
    fn test_symmetry() {
        let pairs = [
            (p(-6.2, 106.8167), p(-6.21, 106.83)),
            (p(51.5074, -0.1278), p(48.8566, 2.3522)),
            (p(89.0, 0.0), p(-89.0, 179.0)),
            (p(0.0, 179.9), p(0.0, -179.9)),
        ];
        for (a, b) in pairs {
            assert_eq!(distance(a, b), distance(b, a));
        }
    }

    #[test]
    fn test_one_degree_of_longitude_at_equator() {
        let d = distance(p(0.0, 0.0), p(0.0, 1.0));
        assert!((d - 111_195.0).abs() <= 1.0, "got {}", d);
    }

    #[test]
    fn test_antipodal_points() {
        let d = distance(p(0.0, 0.0), p(0.0, 180.0));
        let half_circumference = std::f64::consts::PI * EARTH_RADIUS_METERS;
        assert!((d - half_circumference).abs() < 1e-6);
    }

    #[test]
    fn test_known_city_pair() {
        // London to Paris, ~343.5 km with R = 6371 km
        let d = distance(p(51.5074, -0.1278), p(48.8566, 2.3522));
        assert!((d - 343_556.0).abs() < 2_000.0, "got {}", d);
    }

    #[test]
    fn test_within_radius_boundary_is_inclusive() {
        let center = p(-6.2, 106.8167);
        let point = offset_north(center, 50.0);
        let exact = distance(point, center);

        assert!(within_radius(point, center, exact));
        assert!(!within_radius(point, center, exact - 1.0));
    }

    #[test]
    fn test_one_meter_beyond_radius() {
        let center = p(-6.2, 106.8167);
        let point = offset_north(center, 51.0);
        assert!(!within_radius(point, center, 50.0));
        assert!(within_radius(offset_north(center, 49.0), center, 50.0));
    }

    #[test]
    fn test_offset_north_matches_haversine() {
        let center = p(-6.2, 106.8167);
        let d = distance(offset_north(center, 30.0), center);
        assert!((d - 30.0).abs() < 1e-6, "got {}", d);
    }

    #[test]
    fn test_zero_radius_only_matches_center() {
        let center = p(10.0, 10.0);
        assert!(within_radius(center, center, 0.0));
        assert!(!within_radius(offset_north(center, 0.5), center, 0.0));
    }

    #[test]
    fn test_round_distance() {
        assert_eq!(round_distance(30.004), 30.0);
        assert_eq!(round_distance(30.005_1), 30.01);
        assert_eq!(round_distance(0.0), 0.0);
    }
}
