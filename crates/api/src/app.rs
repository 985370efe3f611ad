use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use domain::services::{AttendanceService, InMemoryStore, LocationService, ScheduleService};
use domain::store::{AttendanceStore, Clock, LocationStore, ScheduleStore, SystemClock};
use persistence::repositories::{AttendanceRepository, LocationRepository, ScheduleRepository};
use shared::jwt::JwtVerifier;

use crate::config::{Config, ConfigValidationError};
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{admin, attendance, health, locations, schedules};

/// Storage ports and clock the services are built from.
#[derive(Clone)]
pub struct Stores {
    pub attendance: Arc<dyn AttendanceStore>,
    pub locations: Arc<dyn LocationStore>,
    pub schedules: Arc<dyn ScheduleStore>,
    pub clock: Arc<dyn Clock>,
}

impl Stores {
    /// PostgreSQL-backed ports sharing one pool.
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            attendance: Arc::new(AttendanceRepository::new(pool.clone())),
            locations: Arc::new(LocationRepository::new(pool.clone())),
            schedules: Arc::new(ScheduleRepository::new(pool)),
            clock: Arc::new(SystemClock),
        }
    }

    /// All ports backed by one in-memory store.
    pub fn in_memory(store: Arc<InMemoryStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            attendance: store.clone(),
            locations: store.clone(),
            schedules: store,
            clock,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub attendance: AttendanceService,
    pub locations: LocationService,
    pub schedules: ScheduleService,
    /// Ledger handle for health pings.
    pub ledger: Arc<dyn AttendanceStore>,
    pub jwt: Arc<JwtVerifier>,
}

impl AppState {
    pub fn new(config: Config, stores: Stores) -> Result<Self, ConfigValidationError> {
        let offset = config.attendance.utc_offset().ok_or_else(|| {
            ConfigValidationError::InvalidValue(format!(
                "attendance.utc_offset_minutes out of range: {}",
                config.attendance.utc_offset_minutes
            ))
        })?;
        let jwt = JwtVerifier::new(&config.jwt.secret, config.jwt.leeway_secs)
            .map_err(|e| ConfigValidationError::InvalidValue(e.to_string()))?;

        let attendance = AttendanceService::new(
            stores.attendance.clone(),
            stores.locations.clone(),
            stores.schedules.clone(),
        )
        .with_clock(stores.clock)
        .with_utc_offset(offset);

        Ok(Self {
            config: Arc::new(config),
            attendance,
            locations: LocationService::new(stores.locations.clone()),
            schedules: ScheduleService::new(stores.schedules, stores.locations),
            ledger: stores.attendance,
            jwt: Arc::new(jwt),
        })
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        // Development: allow any origin
        layer.allow_origin(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

pub fn create_app(config: Config, stores: Stores) -> Result<Router, ConfigValidationError> {
    let state = AppState::new(config, stores)?;
    let config = state.config.clone();

    // Employee routes; every handler extracts AuthUser
    let attendance_routes = Router::new()
        .route("/api/v1/attendance/check-in", post(attendance::check_in))
        .route("/api/v1/attendance/check-out", post(attendance::check_out))
        .route("/api/v1/attendance/today", get(attendance::get_today))
        .route("/api/v1/attendance/status", get(attendance::get_status))
        .route("/api/v1/attendance/history", get(attendance::get_history))
        .route(
            "/api/v1/attendance/locations",
            get(attendance::nearby_locations),
        )
        .route(
            "/api/v1/attendance/validate-location",
            post(attendance::validate_location),
        )
        .route("/api/v1/attendance/schedules", get(attendance::my_schedules));

    // Admin routes; every handler extracts AdminUser
    let admin_routes = Router::new()
        .route("/api/v1/admin/attendances", get(admin::list_attendances))
        .route(
            "/api/v1/admin/locations",
            get(locations::list_locations).post(locations::create_location),
        )
        .route(
            "/api/v1/admin/locations/:id",
            get(locations::get_location)
                .put(locations::update_location)
                .delete(locations::delete_location),
        )
        .route(
            "/api/v1/admin/schedules",
            get(schedules::list_schedules).post(schedules::create_schedule),
        )
        .route(
            "/api/v1/admin/schedules/assign",
            post(schedules::assign_schedule),
        )
        .route(
            "/api/v1/admin/schedules/user",
            get(schedules::list_user_schedules),
        )
        .route(
            "/api/v1/admin/schedules/:id",
            get(schedules::get_schedule)
                .put(schedules::update_schedule)
                .delete(schedules::delete_schedule),
        );

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Ok(Router::new()
        .merge(public_routes)
        .merge(attendance_routes)
        .merge(admin_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors_layer(&config.security.cors_origins))
        .with_state(state))
}
