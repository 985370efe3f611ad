//! Storage ports consumed by the domain services.
//!
//! The persistence crate implements these against PostgreSQL;
//! [`crate::services::memory`] implements them in memory for tests.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::errors::StoreError;
use crate::models::attendance::{AttendanceFilter, AttendanceRecord, CheckOutUpdate, NewAttendance};
use crate::models::location::{Geofence, GeofencePatch, NewGeofence};
use crate::models::schedule::{
    ActiveAssignment, NewAssignment, ScheduleAssignment, WorkSchedule, WorkWindow,
};

pub type StoreResult<T> = Result<T, StoreError>;

/// The attendance ledger.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Round trip used by health checks.
    async fn ping(&self) -> StoreResult<()>;

    async fn find_by_user_and_date(
        &self,
        user_id: i64,
        date: NaiveDate,
    ) -> StoreResult<Option<AttendanceRecord>>;

    /// Inserts a record. Must fail with [`StoreError::UniqueViolation`] if
    /// the user already has a record for `attendance_date`.
    async fn insert(&self, new: NewAttendance) -> StoreResult<AttendanceRecord>;

    /// Sets the check-out fields if they are still unset.
    ///
    /// Returns `None` when the record does not exist or was already checked out.
    async fn record_check_out(&self, update: CheckOutUpdate)
        -> StoreResult<Option<AttendanceRecord>>;

    /// A user's records, newest check-in first, with the total count.
    async fn list_by_user(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> StoreResult<(Vec<AttendanceRecord>, i64)>;

    /// All records matching `filter`, newest check-in first, with the total count.
    async fn list(
        &self,
        filter: &AttendanceFilter,
        limit: i64,
        offset: i64,
    ) -> StoreResult<(Vec<AttendanceRecord>, i64)>;
}

/// The location directory.
#[async_trait]
pub trait LocationStore: Send + Sync {
    async fn find(&self, id: i64) -> StoreResult<Option<Geofence>>;

    async fn list(&self, active: Option<bool>) -> StoreResult<Vec<Geofence>>;

    async fn create(&self, new: NewGeofence) -> StoreResult<Geofence>;

    async fn update(&self, id: i64, patch: GeofencePatch) -> StoreResult<Option<Geofence>>;

    /// Returns false if no geofence had that id. Fails with
    /// [`StoreError::ForeignKeyViolation`] while attendance rows reference it.
    async fn delete(&self, id: i64) -> StoreResult<bool>;
}

/// The schedule directory.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn find(&self, id: i64) -> StoreResult<Option<WorkSchedule>>;

    async fn list(&self) -> StoreResult<Vec<WorkSchedule>>;

    async fn create(&self, window: WorkWindow) -> StoreResult<WorkSchedule>;

    async fn update(&self, id: i64, window: WorkWindow) -> StoreResult<Option<WorkSchedule>>;

    async fn delete(&self, id: i64) -> StoreResult<bool>;

    /// Fails with [`StoreError::UniqueViolation`] on a duplicate
    /// `(user_id, effective_from)`.
    async fn assign(&self, new: NewAssignment) -> StoreResult<ScheduleAssignment>;

    async fn list_assignments_for_user(&self, user_id: i64)
        -> StoreResult<Vec<ScheduleAssignment>>;

    /// The assignment governing `date` for the user, if any. Only assignments
    /// whose schedule works on that weekday compete; see
    /// [`crate::models::schedule::resolve_assignment`].
    async fn active_assignment(
        &self,
        user_id: i64,
        date: NaiveDate,
    ) -> StoreResult<Option<ActiveAssignment>>;
}

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
