//! In-memory implementations of the storage ports.
//!
//! Used by unit and HTTP tests, and handy for running the service without a
//! database. Constraint behaviour mirrors the PostgreSQL schema: one
//! attendance row per user and date, one assignment per user and start date,
//! and restricted deletes for referenced locations.

use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::Mutex;

use crate::errors::StoreError;
use crate::models::attendance::{
    AttendanceFilter, AttendanceRecord, CheckOutUpdate, NewAttendance,
};
use crate::models::location::{Geofence, GeofencePatch, NewGeofence};
use crate::models::schedule::{
    resolve_assignment, ActiveAssignment, NewAssignment, ScheduleAssignment, WorkSchedule,
    WorkWindow,
};
use crate::store::{AttendanceStore, Clock, LocationStore, ScheduleStore, StoreResult, SystemClock};

/// A clock frozen at a settable instant.
#[derive(Debug)]
pub struct FixedClock {
    now: StdMutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: StdMutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Debug, Default)]
struct State {
    attendances: Vec<AttendanceRecord>,
    geofences: Vec<Geofence>,
    schedules: Vec<WorkSchedule>,
    assignments: Vec<ScheduleAssignment>,
    next_id: i64,
    unavailable: bool,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable {
            Err(StoreError::Backend("store unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

/// A single in-memory store implementing every port.
pub struct InMemoryStore {
    state: Mutex<State>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Uses `clock` for `created_at`/`updated_at` stamps.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(State::default()),
            clock,
        }
    }

    /// Makes every subsequent call fail with [`StoreError::Backend`].
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().await.unavailable = unavailable;
    }

    pub async fn attendance_count(&self) -> usize {
        self.state.lock().await.attendances.len()
    }
}

fn newest_first(records: &mut [AttendanceRecord]) {
    records.sort_by(|a, b| {
        b.check_in_time
            .cmp(&a.check_in_time)
            .then_with(|| b.id.cmp(&a.id))
    });
}

fn page(records: Vec<AttendanceRecord>, limit: i64, offset: i64) -> (Vec<AttendanceRecord>, i64) {
    let total = records.len() as i64;
    let data = records
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect();
    (data, total)
}

#[async_trait]
impl AttendanceStore for InMemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        self.state.lock().await.check_available()
    }

    async fn find_by_user_and_date(
        &self,
        user_id: i64,
        date: NaiveDate,
    ) -> StoreResult<Option<AttendanceRecord>> {
        let state = self.state.lock().await;
        state.check_available()?;
        Ok(state
            .attendances
            .iter()
            .find(|r| r.user_id == user_id && r.attendance_date == date)
            .cloned())
    }

    async fn insert(&self, new: NewAttendance) -> StoreResult<AttendanceRecord> {
        let mut state = self.state.lock().await;
        state.check_available()?;

        if state
            .attendances
            .iter()
            .any(|r| r.user_id == new.user_id && r.attendance_date == new.attendance_date)
        {
            return Err(StoreError::UniqueViolation(
                "attendances_user_id_attendance_date_key".to_string(),
            ));
        }
        if !state.geofences.iter().any(|g| g.id == new.location_id) {
            return Err(StoreError::ForeignKeyViolation(
                "attendances_location_id_fkey".to_string(),
            ));
        }

        let now = self.clock.now();
        let record = AttendanceRecord {
            id: state.next_id(),
            user_id: new.user_id,
            location_id: new.location_id,
            attendance_date: new.attendance_date,
            check_in_time: new.check_in_time,
            check_in_point: new.check_in_point,
            distance_from_location: new.distance_from_location,
            check_out: None,
            status: new.status,
            notes: new.notes,
            photo_url: new.photo_url,
            created_at: now,
            updated_at: now,
        };
        state.attendances.push(record.clone());
        Ok(record)
    }

    async fn record_check_out(
        &self,
        update: CheckOutUpdate,
    ) -> StoreResult<Option<AttendanceRecord>> {
        let mut state = self.state.lock().await;
        state.check_available()?;

        let now = self.clock.now();
        let record = state
            .attendances
            .iter_mut()
            .find(|r| r.id == update.record_id && r.check_out.is_none());

        Ok(record.map(|r| {
            r.check_out = Some(update.event);
            r.notes = update.notes;
            r.updated_at = now;
            r.clone()
        }))
    }

    async fn list_by_user(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> StoreResult<(Vec<AttendanceRecord>, i64)> {
        let filter = AttendanceFilter {
            user_id: Some(user_id),
            ..Default::default()
        };
        AttendanceStore::list(self, &filter, limit, offset).await
    }

    async fn list(
        &self,
        filter: &AttendanceFilter,
        limit: i64,
        offset: i64,
    ) -> StoreResult<(Vec<AttendanceRecord>, i64)> {
        let state = self.state.lock().await;
        state.check_available()?;

        let mut matching: Vec<_> = state
            .attendances
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        newest_first(&mut matching);
        Ok(page(matching, limit, offset))
    }
}

#[async_trait]
impl LocationStore for InMemoryStore {
    async fn find(&self, id: i64) -> StoreResult<Option<Geofence>> {
        let state = self.state.lock().await;
        state.check_available()?;
        Ok(state.geofences.iter().find(|g| g.id == id).cloned())
    }

    async fn list(&self, active: Option<bool>) -> StoreResult<Vec<Geofence>> {
        let state = self.state.lock().await;
        state.check_available()?;
        Ok(state
            .geofences
            .iter()
            .filter(|g| active.map_or(true, |a| g.active == a))
            .cloned()
            .collect())
    }

    async fn create(&self, new: NewGeofence) -> StoreResult<Geofence> {
        let mut state = self.state.lock().await;
        state.check_available()?;

        let now = self.clock.now();
        let geofence = Geofence {
            id: state.next_id(),
            name: new.name,
            description: new.description,
            center: new.center,
            radius_meters: new.radius_meters,
            active: true,
            created_by: new.created_by,
            created_at: now,
            updated_at: now,
        };
        state.geofences.push(geofence.clone());
        Ok(geofence)
    }

    async fn update(&self, id: i64, patch: GeofencePatch) -> StoreResult<Option<Geofence>> {
        let mut state = self.state.lock().await;
        state.check_available()?;

        let now = self.clock.now();
        Ok(state.geofences.iter_mut().find(|g| g.id == id).map(|g| {
            patch.apply(g);
            g.updated_at = now;
            g.clone()
        }))
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        state.check_available()?;

        if state.attendances.iter().any(|r| r.location_id == id) {
            return Err(StoreError::ForeignKeyViolation(
                "attendances_location_id_fkey".to_string(),
            ));
        }
        if state.assignments.iter().any(|a| a.location_id == id) {
            return Err(StoreError::ForeignKeyViolation(
                "user_schedules_location_id_fkey".to_string(),
            ));
        }

        let before = state.geofences.len();
        state.geofences.retain(|g| g.id != id);
        Ok(state.geofences.len() != before)
    }
}

#[async_trait]
impl ScheduleStore for InMemoryStore {
    async fn find(&self, id: i64) -> StoreResult<Option<WorkSchedule>> {
        let state = self.state.lock().await;
        state.check_available()?;
        Ok(state.schedules.iter().find(|s| s.id == id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<WorkSchedule>> {
        let state = self.state.lock().await;
        state.check_available()?;
        Ok(state.schedules.clone())
    }

    async fn create(&self, window: WorkWindow) -> StoreResult<WorkSchedule> {
        let mut state = self.state.lock().await;
        state.check_available()?;

        let now = self.clock.now();
        let schedule = WorkSchedule {
            id: state.next_id(),
            name: window.name,
            check_in_start: window.check_in_start,
            check_in_end: window.check_in_end,
            check_out_start: window.check_out_start,
            work_days: window.work_days,
            half_day_after: window.half_day_after,
            created_at: now,
            updated_at: now,
        };
        state.schedules.push(schedule.clone());
        Ok(schedule)
    }

    async fn update(&self, id: i64, window: WorkWindow) -> StoreResult<Option<WorkSchedule>> {
        let mut state = self.state.lock().await;
        state.check_available()?;

        let now = self.clock.now();
        Ok(state.schedules.iter_mut().find(|s| s.id == id).map(|s| {
            s.name = window.name;
            s.check_in_start = window.check_in_start;
            s.check_in_end = window.check_in_end;
            s.check_out_start = window.check_out_start;
            s.work_days = window.work_days;
            s.half_day_after = window.half_day_after;
            s.updated_at = now;
            s.clone()
        }))
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        state.check_available()?;

        let before = state.schedules.len();
        state.schedules.retain(|s| s.id != id);
        let deleted = state.schedules.len() != before;
        if deleted {
            state.assignments.retain(|a| a.schedule_id != id);
        }
        Ok(deleted)
    }

    async fn assign(&self, new: NewAssignment) -> StoreResult<ScheduleAssignment> {
        let mut state = self.state.lock().await;
        state.check_available()?;

        if state
            .assignments
            .iter()
            .any(|a| a.user_id == new.user_id && a.effective_from == new.effective_from)
        {
            return Err(StoreError::UniqueViolation(
                "user_schedules_user_id_effective_from_key".to_string(),
            ));
        }
        if !state.schedules.iter().any(|s| s.id == new.schedule_id) {
            return Err(StoreError::ForeignKeyViolation(
                "user_schedules_schedule_id_fkey".to_string(),
            ));
        }
        if !state.geofences.iter().any(|g| g.id == new.location_id) {
            return Err(StoreError::ForeignKeyViolation(
                "user_schedules_location_id_fkey".to_string(),
            ));
        }

        let assignment = ScheduleAssignment {
            id: state.next_id(),
            user_id: new.user_id,
            schedule_id: new.schedule_id,
            location_id: new.location_id,
            effective_from: new.effective_from,
            effective_to: new.effective_to,
            created_at: self.clock.now(),
        };
        state.assignments.push(assignment.clone());
        Ok(assignment)
    }

    async fn list_assignments_for_user(
        &self,
        user_id: i64,
    ) -> StoreResult<Vec<ScheduleAssignment>> {
        let state = self.state.lock().await;
        state.check_available()?;

        let mut assignments: Vec<_> = state
            .assignments
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        assignments.sort_by(|a, b| b.effective_from.cmp(&a.effective_from));
        Ok(assignments)
    }

    async fn active_assignment(
        &self,
        user_id: i64,
        date: NaiveDate,
    ) -> StoreResult<Option<ActiveAssignment>> {
        let state = self.state.lock().await;
        state.check_available()?;

        let candidates = state
            .assignments
            .iter()
            .filter(|a| a.user_id == user_id)
            .filter_map(|a| {
                state
                    .schedules
                    .iter()
                    .find(|s| s.id == a.schedule_id)
                    .map(|schedule| ActiveAssignment {
                        assignment: a.clone(),
                        schedule: schedule.clone(),
                    })
            });
        Ok(resolve_assignment(candidates, date))
    }
}
