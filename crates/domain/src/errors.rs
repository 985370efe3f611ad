//! Domain error types.

use thiserror::Error;

/// Failure reported by a storage port.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Referenced row violation: {0}")]
    ForeignKeyViolation(String),

    #[error("Storage failure: {0}")]
    Backend(String),
}

/// Business errors raised by the attendance, location and schedule services.
///
/// Everything except [`DomainError::Storage`] is a client error.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Already checked in today")]
    AlreadyCheckedIn,

    #[error("Already checked out today")]
    AlreadyCheckedOut,

    #[error("No check-in found for today")]
    NoCheckInToday,

    #[error("No attendance record found for today")]
    NoRecordToday,

    #[error("Location not found")]
    LocationNotFound,

    #[error("Location is not active")]
    LocationInactive,

    #[error("Outside the allowed radius ({distance:.2} m from location, radius {radius:.0} m)")]
    OutsideGeofence { distance: f64, radius: f64 },

    #[error("Schedule not found")]
    ScheduleNotFound,

    /// Lookup miss for an entity without a dedicated variant. Surfaced as
    /// 404 like the specific ones; the engine's own lookups use those.
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl DomainError {
    /// Returns true for errors caused by the caller rather than infrastructure.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, DomainError::Storage(_))
    }

    /// Stable snake_case identifier, used as a metric label.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::AlreadyCheckedIn => "already_checked_in",
            DomainError::AlreadyCheckedOut => "already_checked_out",
            DomainError::NoCheckInToday => "no_check_in_today",
            DomainError::NoRecordToday => "no_record_today",
            DomainError::LocationNotFound => "location_not_found",
            DomainError::LocationInactive => "location_inactive",
            DomainError::OutsideGeofence { .. } => "outside_geofence",
            DomainError::ScheduleNotFound => "schedule_not_found",
            DomainError::NotFound(_) => "not_found",
            DomainError::Validation(_) => "validation",
            DomainError::Conflict(_) => "conflict",
            DomainError::Storage(_) => "storage",
        }
    }
}
