//! Common test utilities for integration tests.
//!
//! The router runs against the in-memory store with a frozen clock, so no
//! database is needed. Tokens are minted here with the shared test secret.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::sync::Arc;

use attendance_api::{
    app::{create_app, Stores},
    config::{
        AttendanceConfig, Config, DatabaseConfig, JwtAuthConfig, LoggingConfig, SecurityConfig,
        ServerConfig,
    },
};
use axum::{
    body::Body,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use chrono::{DateTime, TimeZone, Utc};
use domain::models::location::{GeoPoint, NewGeofence};
use domain::services::geo::EARTH_RADIUS_METERS;
use domain::services::{FixedClock, InMemoryStore};
use domain::store::LocationStore;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use shared::jwt::{Claims, Role};
use tower::ServiceExt;

pub const JWT_SECRET: &str = "integration_test_secret_0123456789";
pub const EMPLOYEE_ID: i64 = 42;
pub const ADMIN_ID: i64 = 1;

/// Center of the test office geofence.
pub const OFFICE: GeoPoint = GeoPoint {
    latitude: -6.2,
    longitude: 106.8167,
};

/// Test configuration; the database section is unused by the in-memory store.
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_secs: 30,
        },
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout_secs: 10,
            idle_timeout_secs: 600,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            cors_origins: vec![],
        },
        jwt: JwtAuthConfig {
            secret: JWT_SECRET.to_string(),
            leeway_secs: 0,
        },
        attendance: AttendanceConfig {
            utc_offset_minutes: 0,
            history_default_limit: 10,
            admin_default_limit: 20,
            max_page_limit: 100,
        },
    }
}

/// A router plus handles on its store and clock.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<FixedClock>,
}

impl TestApp {
    /// Monday 2025-01-06 08:30 UTC.
    pub fn new() -> Self {
        Self::at(Utc.with_ymd_and_hms(2025, 1, 6, 8, 30, 0).unwrap())
    }

    pub fn at(now: DateTime<Utc>) -> Self {
        Self::with_config(test_config(), now)
    }

    pub fn with_config(config: Config, now: DateTime<Utc>) -> Self {
        let clock = Arc::new(FixedClock::new(now));
        let store = Arc::new(InMemoryStore::with_clock(clock.clone()));
        let router = create_app(config, Stores::in_memory(store.clone(), clock.clone()))
            .expect("test config must be valid");
        Self {
            router,
            store,
            clock,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Registers an active geofence around `OFFICE` and returns its id.
    pub async fn create_office(&self, radius_meters: f64) -> i64 {
        LocationStore::create(
            self.store.as_ref(),
            NewGeofence {
                name: "Head Office".to_string(),
                description: None,
                center: OFFICE,
                radius_meters,
                created_by: Some(ADMIN_ID),
            },
        )
        .await
        .unwrap()
        .id
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// A point `meters` due north of `point`.
pub fn north_of(point: GeoPoint, meters: f64) -> GeoPoint {
    GeoPoint {
        latitude: point.latitude + (meters / EARTH_RADIUS_METERS).to_degrees(),
        longitude: point.longitude,
    }
}

/// Signs a token valid for an hour of wall-clock time.
pub fn token_for(user_id: i64, role: Role) -> String {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (now + chrono::Duration::hours(1)).timestamp(),
        iat: now.timestamp(),
        role,
        email: None,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn employee_token() -> String {
    token_for(EMPLOYEE_ID, Role::Employee)
}

pub fn admin_token() -> String {
    token_for(ADMIN_ID, Role::Admin)
}

/// Build a JSON request with authentication.
pub fn json_request_with_auth(
    method: Method,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Build a GET request with authentication.
pub fn get_request_with_auth(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// Build a DELETE request with authentication.
pub fn delete_request_with_auth(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// Helper to parse JSON response body.
pub async fn parse_response_body(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
}

/// Check-in payload at `point` for `location_id`.
pub fn check_in_body(location_id: i64, point: GeoPoint) -> serde_json::Value {
    serde_json::json!({
        "location_id": location_id,
        "latitude": point.latitude,
        "longitude": point.longitude,
    })
}
