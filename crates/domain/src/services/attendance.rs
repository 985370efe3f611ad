//! The attendance engine.
//!
//! Owns every transition of the per-user, per-day attendance state machine:
//! `NoRecord -> CheckedIn -> CheckedOut`. Each operation either commits one
//! ledger write or leaves the ledger untouched.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use shared::pagination::{Page, Paginated};
use tracing::{debug, info, warn};

use crate::errors::{DomainError, StoreError};
use crate::models::attendance::{
    append_note, AttendanceEntry, AttendanceFilter, AttendanceRecord, AttendanceState,
    AttendanceStatusView, CheckInRequest, CheckOutEvent, CheckOutRequest, CheckOutUpdate,
    NewAttendance,
};
use crate::models::location::{GeoPoint, Geofence, GeofenceCheck};
use crate::services::{geo, status_policy};
use crate::store::{AttendanceStore, Clock, LocationStore, ScheduleStore, SystemClock};

/// Check-in/check-out orchestration and attendance queries.
#[derive(Clone)]
pub struct AttendanceService {
    attendance: Arc<dyn AttendanceStore>,
    locations: Arc<dyn LocationStore>,
    schedules: Arc<dyn ScheduleStore>,
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
}

impl AttendanceService {
    /// Creates an engine using the system clock and UTC day boundaries.
    pub fn new(
        attendance: Arc<dyn AttendanceStore>,
        locations: Arc<dyn LocationStore>,
        schedules: Arc<dyn ScheduleStore>,
    ) -> Self {
        Self {
            attendance,
            locations,
            schedules,
            clock: Arc::new(SystemClock),
            offset: Utc.fix(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets the UTC offset defining calendar days and wall-clock hours.
    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// The calendar date "today" refers to.
    pub fn today(&self) -> NaiveDate {
        self.local_date(self.now())
    }

    async fn active_geofence(&self, location_id: i64) -> Result<Geofence, DomainError> {
        let geofence = self
            .locations
            .find(location_id)
            .await?
            .ok_or(DomainError::LocationNotFound)?;

        if !geofence.active {
            return Err(DomainError::LocationInactive);
        }
        Ok(geofence)
    }

    fn require_inside(
        &self,
        user_id: i64,
        geofence: &Geofence,
        point: GeoPoint,
    ) -> Result<GeofenceCheck, DomainError> {
        let check = geofence.check(point);
        if !check.inside {
            warn!(
                user_id = user_id,
                location_id = geofence.id,
                distance = check.distance,
                radius = geofence.radius_meters,
                "Rejected attendance outside geofence"
            );
            return Err(DomainError::OutsideGeofence {
                distance: check.distance,
                radius: geofence.radius_meters,
            });
        }
        Ok(check)
    }

    /// Records today's check-in for `user_id`.
    pub async fn check_in(
        &self,
        user_id: i64,
        request: CheckInRequest,
    ) -> Result<AttendanceRecord, DomainError> {
        let now = self.now();
        let local = now.with_timezone(&self.offset);
        let date = local.date_naive();

        let existing = self.attendance.find_by_user_and_date(user_id, date).await?;
        if !AttendanceState::of(existing.as_ref()).can_transition_to(AttendanceState::CheckedIn) {
            debug!(user_id = user_id, %date, "Duplicate check-in rejected");
            return Err(DomainError::AlreadyCheckedIn);
        }

        let geofence = self.active_geofence(request.location_id).await?;
        let check = self.require_inside(user_id, &geofence, request.point())?;

        let assignment = self.schedules.active_assignment(user_id, date).await?;
        let status = status_policy::classify(
            local.naive_local(),
            assignment.as_ref().map(|a| &a.schedule),
        );

        let new = NewAttendance {
            user_id,
            location_id: geofence.id,
            attendance_date: date,
            check_in_time: now,
            check_in_point: request.point(),
            distance_from_location: geo::round_distance(check.distance),
            status,
            notes: append_note("", request.notes.as_deref()),
            photo_url: request.photo_url.unwrap_or_default(),
        };

        let record = self.attendance.insert(new).await.map_err(|e| match e {
            StoreError::UniqueViolation(_) => DomainError::AlreadyCheckedIn,
            other => DomainError::Storage(other),
        })?;

        info!(
            user_id = user_id,
            location_id = record.location_id,
            distance = record.distance_from_location,
            status = %record.status,
            scheduled = assignment.is_some(),
            "User checked in"
        );
        Ok(record)
    }

    /// Records today's check-out for `user_id` against the check-in's geofence.
    pub async fn check_out(
        &self,
        user_id: i64,
        request: CheckOutRequest,
    ) -> Result<AttendanceRecord, DomainError> {
        let now = self.now();
        let date = self.local_date(now);

        let record = self
            .attendance
            .find_by_user_and_date(user_id, date)
            .await?
            .ok_or(DomainError::NoCheckInToday)?;

        if !record.state().can_transition_to(AttendanceState::CheckedOut) {
            debug!(user_id = user_id, record_id = record.id, "Duplicate check-out rejected");
            return Err(DomainError::AlreadyCheckedOut);
        }

        let point = request.point();
        let geofence = self.active_geofence(record.location_id).await?;
        let check = self.require_inside(user_id, &geofence, point)?;

        let update = CheckOutUpdate {
            record_id: record.id,
            event: CheckOutEvent { time: now, point },
            notes: append_note(&record.notes, request.notes.as_deref()),
        };

        let updated = self
            .attendance
            .record_check_out(update)
            .await?
            .ok_or(DomainError::AlreadyCheckedOut)?;

        info!(
            user_id = user_id,
            record_id = updated.id,
            location_id = updated.location_id,
            distance = geo::round_distance(check.distance),
            "User checked out"
        );
        Ok(updated)
    }

    pub async fn has_checked_in_today(&self, user_id: i64) -> Result<bool, DomainError> {
        Ok(self
            .attendance
            .find_by_user_and_date(user_id, self.today())
            .await?
            .is_some())
    }

    /// Today's record, or [`DomainError::NoRecordToday`].
    pub async fn get_today(&self, user_id: i64) -> Result<AttendanceRecord, DomainError> {
        self.attendance
            .find_by_user_and_date(user_id, self.today())
            .await?
            .ok_or(DomainError::NoRecordToday)
    }

    /// Summary of today's attendance. A missing record is reported, not raised.
    pub async fn get_status(&self, user_id: i64) -> Result<AttendanceStatusView, DomainError> {
        let Some(record) = self
            .attendance
            .find_by_user_and_date(user_id, self.today())
            .await?
        else {
            return Ok(AttendanceStatusView::not_checked_in());
        };

        let location_name = self
            .locations
            .find(record.location_id)
            .await?
            .map(|g| g.name);

        Ok(AttendanceStatusView::from_record(&record, location_name))
    }

    /// The user's records, newest first.
    pub async fn get_history(
        &self,
        user_id: i64,
        page: Page,
    ) -> Result<Paginated<AttendanceRecord>, DomainError> {
        let (records, total) = self
            .attendance
            .list_by_user(user_id, page.limit_i64(), page.offset())
            .await?;
        Ok(Paginated::new(records, total, page))
    }

    /// Pairs a record with the geofence it was recorded at.
    pub async fn describe(&self, record: AttendanceRecord) -> Result<AttendanceEntry, DomainError> {
        let location = self.locations.find(record.location_id).await?;
        Ok(AttendanceEntry { record, location })
    }

    /// Pairs every record of a page with its geofence, one lookup per location.
    pub async fn describe_page(
        &self,
        page: Paginated<AttendanceRecord>,
    ) -> Result<Paginated<AttendanceEntry>, DomainError> {
        let mut locations: HashMap<i64, Option<Geofence>> = HashMap::new();
        for record in &page.data {
            if !locations.contains_key(&record.location_id) {
                let found = self.locations.find(record.location_id).await?;
                locations.insert(record.location_id, found);
            }
        }

        Ok(page.map(|record| {
            let location = locations.get(&record.location_id).cloned().flatten();
            AttendanceEntry { record, location }
        }))
    }

    /// Administrative listing across users.
    pub async fn list_all(
        &self,
        filter: &AttendanceFilter,
        page: Page,
    ) -> Result<Paginated<AttendanceRecord>, DomainError> {
        if let (Some(from), Some(to)) = (filter.date_from, filter.date_to) {
            if from > to {
                return Err(DomainError::Validation(
                    "date_from must not be after date_to".to_string(),
                ));
            }
        }

        let (records, total) = self
            .attendance
            .list(filter, page.limit_i64(), page.offset())
            .await?;
        Ok(Paginated::new(records, total, page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::attendance::AttendanceStatus;
    use crate::models::location::NewGeofence;
    use crate::models::schedule::{NewAssignment, WorkWindow};
    use crate::services::geo::offset_north;
    use crate::services::memory::{FixedClock, InMemoryStore};
    use async_trait::async_trait;
    use chrono::{Duration, NaiveTime, TimeZone};

    const USER: i64 = 42;

    struct Harness {
        store: Arc<InMemoryStore>,
        clock: Arc<FixedClock>,
        service: AttendanceService,
        fence: Geofence,
    }

    /// Monday 2025-01-06 at `h:m` UTC.
    fn monday(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 6, h, m, 0).unwrap()
    }

    async fn harness() -> Harness {
        let clock = Arc::new(FixedClock::new(monday(8, 30)));
        let store = Arc::new(InMemoryStore::with_clock(clock.clone()));
        let fence = LocationStore::create(
            store.as_ref(),
            NewGeofence {
                name: "Head Office".to_string(),
                description: None,
                center: GeoPoint::new(-6.2, 106.8167),
                radius_meters: 50.0,
                created_by: Some(1),
            },
        )
        .await
        .unwrap();

        let service = AttendanceService::new(store.clone(), store.clone(), store.clone())
            .with_clock(clock.clone());

        Harness {
            store,
            clock,
            service,
            fence,
        }
    }

    fn check_in_at(location_id: i64, point: GeoPoint) -> CheckInRequest {
        CheckInRequest {
            location_id,
            latitude: point.latitude,
            longitude: point.longitude,
            photo_url: None,
            notes: None,
        }
    }

    fn check_out_at(point: GeoPoint) -> CheckOutRequest {
        CheckOutRequest {
            latitude: point.latitude,
            longitude: point.longitude,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_check_in_inside_geofence() {
        let h = harness().await;
        let point = offset_north(h.fence.center, 30.0);

        let record = h.service.check_in(USER, check_in_at(h.fence.id, point)).await.unwrap();

        assert_eq!(record.user_id, USER);
        assert_eq!(record.location_id, h.fence.id);
        assert!((record.distance_from_location - 30.0).abs() < 0.01);
        assert_eq!(record.status, AttendanceStatus::Present);
        assert_eq!(record.state(), AttendanceState::CheckedIn);
        assert_eq!(record.attendance_date, NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
    }

    #[tokio::test]
    async fn test_check_in_outside_geofence_persists_nothing() {
        let h = harness().await;
        let point = offset_north(h.fence.center, 80.0);

        let err = h
            .service
            .check_in(USER, check_in_at(h.fence.id, point))
            .await
            .unwrap_err();

        match err {
            DomainError::OutsideGeofence { distance, radius } => {
                assert!((distance - 80.0).abs() < 0.01);
                assert_eq!(radius, 50.0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(h.store.attendance_count().await, 0);
        assert!(!h.service.has_checked_in_today(USER).await.unwrap());
    }

    #[tokio::test]
    async fn test_second_check_in_same_day_fails() {
        let h = harness().await;
        let point = offset_north(h.fence.center, 10.0);
        h.service.check_in(USER, check_in_at(h.fence.id, point)).await.unwrap();

        h.clock.advance(Duration::hours(2));
        let err = h
            .service
            .check_in(USER, check_in_at(h.fence.id, point))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::AlreadyCheckedIn));
        assert_eq!(h.store.attendance_count().await, 1);
    }

    #[tokio::test]
    async fn test_check_in_again_next_day() {
        let h = harness().await;
        let point = offset_north(h.fence.center, 10.0);
        h.service.check_in(USER, check_in_at(h.fence.id, point)).await.unwrap();

        h.clock.advance(Duration::days(1));
        h.service.check_in(USER, check_in_at(h.fence.id, point)).await.unwrap();
        assert_eq!(h.store.attendance_count().await, 2);
    }

    #[tokio::test]
    async fn test_check_in_unknown_location() {
        let h = harness().await;
        let err = h
            .service
            .check_in(USER, check_in_at(999, h.fence.center))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::LocationNotFound));
    }

    #[tokio::test]
    async fn test_check_in_inactive_location() {
        let h = harness().await;
        LocationStore::update(
            h.store.as_ref(),
            h.fence.id,
            crate::models::location::GeofencePatch {
                active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let err = h
            .service
            .check_in(USER, check_in_at(h.fence.id, h.fence.center))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::LocationInactive));
        assert_eq!(h.store.attendance_count().await, 0);
    }

    #[tokio::test]
    async fn test_fallback_status_classification() {
        for (hour, minute, expected) in [
            (8, 30, AttendanceStatus::Present),
            (10, 0, AttendanceStatus::Late),
            (13, 0, AttendanceStatus::HalfDay),
        ] {
            let h = harness().await;
            h.clock.set(monday(hour, minute));
            let record = h
                .service
                .check_in(USER, check_in_at(h.fence.id, h.fence.center))
                .await
                .unwrap();
            assert_eq!(record.status, expected, "check-in at {hour:02}:{minute:02}");
        }
    }

    #[tokio::test]
    async fn test_status_uses_configured_offset() {
        let h = harness().await;
        // 01:00 UTC is 08:00 in UTC+7
        h.clock.set(monday(1, 0));
        let service = h
            .service
            .clone()
            .with_utc_offset(FixedOffset::east_opt(7 * 3600).unwrap());

        let record = service
            .check_in(USER, check_in_at(h.fence.id, h.fence.center))
            .await
            .unwrap();
        assert_eq!(record.status, AttendanceStatus::Present);

        // 23:00 UTC on the same Monday is already Tuesday 06:00 in UTC+7
        h.clock.set(monday(23, 0));
        service
            .check_in(USER, check_in_at(h.fence.id, h.fence.center))
            .await
            .unwrap();
        assert_eq!(h.store.attendance_count().await, 2);
    }

    #[tokio::test]
    async fn test_schedule_aware_classification() {
        let h = harness().await;
        let t = |hh, mm| NaiveTime::from_hms_opt(hh, mm, 0).unwrap();
        let schedule = ScheduleStore::create(
            h.store.as_ref(),
            WorkWindow {
                name: "Late shift".to_string(),
                check_in_start: t(10, 0),
                check_in_end: t(10, 30),
                check_out_start: t(19, 0),
                work_days: vec![1, 2, 3, 4, 5],
                half_day_after: None,
            },
        )
        .await
        .unwrap();
        h.store
            .assign(NewAssignment {
                user_id: USER,
                schedule_id: schedule.id,
                location_id: h.fence.id,
                effective_from: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                effective_to: None,
            })
            .await
            .unwrap();

        // 10:15 would be late by the fixed table
        h.clock.set(monday(10, 15));
        let record = h
            .service
            .check_in(USER, check_in_at(h.fence.id, h.fence.center))
            .await
            .unwrap();
        assert_eq!(record.status, AttendanceStatus::Present);

        // Another user without an assignment falls back
        let other = h
            .service
            .check_in(USER + 1, check_in_at(h.fence.id, h.fence.center))
            .await
            .unwrap();
        assert_eq!(other.status, AttendanceStatus::Late);
    }

    #[tokio::test]
    async fn test_newer_assignment_off_its_weekdays_does_not_shadow_older() {
        let h = harness().await;
        let t = |hh, mm| NaiveTime::from_hms_opt(hh, mm, 0).unwrap();
        let window = |name: &str, work_days: Vec<u8>| WorkWindow {
            name: name.to_string(),
            check_in_start: t(10, 0),
            check_in_end: t(10, 30),
            check_out_start: t(19, 0),
            work_days,
            half_day_after: None,
        };

        let weekdays = window("Weekdays", vec![1, 2, 3, 4, 5]);
        let weekdays = ScheduleStore::create(h.store.as_ref(), weekdays).await.unwrap();
        let saturdays = window("Saturdays", vec![6]);
        let saturdays = ScheduleStore::create(h.store.as_ref(), saturdays).await.unwrap();
        for (schedule_id, from) in [(weekdays.id, (2025, 1, 1)), (saturdays.id, (2025, 1, 4))] {
            h.store
                .assign(NewAssignment {
                    user_id: USER,
                    schedule_id,
                    location_id: h.fence.id,
                    effective_from: NaiveDate::from_ymd_opt(from.0, from.1, from.2).unwrap(),
                    effective_to: None,
                })
                .await
                .unwrap();
        }

        // Monday 10:15 is on time for the weekday shift
        h.clock.set(monday(10, 15));
        let record = h
            .service
            .check_in(USER, check_in_at(h.fence.id, h.fence.center))
            .await
            .unwrap();
        assert_eq!(record.status, AttendanceStatus::Present);
    }

    #[tokio::test]
    async fn test_check_out_before_check_in() {
        let h = harness().await;
        let err = h
            .service
            .check_out(USER, check_out_at(h.fence.center))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NoCheckInToday));
    }

    #[tokio::test]
    async fn test_check_out_flow() {
        let h = harness().await;
        let mut request = check_in_at(h.fence.id, offset_north(h.fence.center, 5.0));
        request.notes = Some("On site".to_string());
        h.service.check_in(USER, request).await.unwrap();

        h.clock.set(monday(17, 0));
        let mut out = check_out_at(offset_north(h.fence.center, 20.0));
        out.notes = Some("Leaving".to_string());
        let record = h.service.check_out(USER, out).await.unwrap();

        assert_eq!(record.state(), AttendanceState::CheckedOut);
        assert_eq!(record.notes, "On site | Leaving");
        assert_eq!(record.status, AttendanceStatus::Present);
        assert_eq!(record.work_duration(), Some(Duration::minutes(8 * 60 + 30)));
    }

    #[tokio::test]
    async fn test_check_out_twice_keeps_first() {
        let h = harness().await;
        h.service
            .check_in(USER, check_in_at(h.fence.id, h.fence.center))
            .await
            .unwrap();

        h.clock.set(monday(17, 0));
        let first = h
            .service
            .check_out(USER, check_out_at(h.fence.center))
            .await
            .unwrap();

        h.clock.set(monday(18, 0));
        let err = h
            .service
            .check_out(USER, check_out_at(offset_north(h.fence.center, 10.0)))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::AlreadyCheckedOut));

        let today = h.service.get_today(USER).await.unwrap();
        assert_eq!(today.check_out, first.check_out);
    }

    #[tokio::test]
    async fn test_check_out_outside_geofence_is_retryable() {
        let h = harness().await;
        h.service
            .check_in(USER, check_in_at(h.fence.id, h.fence.center))
            .await
            .unwrap();

        h.clock.set(monday(17, 0));
        let err = h
            .service
            .check_out(USER, check_out_at(offset_north(h.fence.center, 500.0)))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::OutsideGeofence { .. }));
        assert_eq!(
            h.service.get_today(USER).await.unwrap().state(),
            AttendanceState::CheckedIn
        );

        h.service
            .check_out(USER, check_out_at(h.fence.center))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_check_out_validates_against_check_in_location() {
        let h = harness().await;
        let elsewhere = LocationStore::create(
            h.store.as_ref(),
            NewGeofence {
                name: "Warehouse".to_string(),
                description: None,
                center: GeoPoint::new(-6.3, 106.9),
                radius_meters: 100.0,
                created_by: None,
            },
        )
        .await
        .unwrap();

        h.service
            .check_in(USER, check_in_at(h.fence.id, h.fence.center))
            .await
            .unwrap();

        let err = h
            .service
            .check_out(USER, check_out_at(elsewhere.center))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::OutsideGeofence { .. }));
    }

    #[tokio::test]
    async fn test_get_today_and_status() {
        let h = harness().await;
        assert!(matches!(
            h.service.get_today(USER).await,
            Err(DomainError::NoRecordToday)
        ));
        assert_eq!(
            h.service.get_status(USER).await.unwrap(),
            AttendanceStatusView::not_checked_in()
        );

        h.service
            .check_in(USER, check_in_at(h.fence.id, h.fence.center))
            .await
            .unwrap();

        let status = h.service.get_status(USER).await.unwrap();
        assert!(status.has_checked_in);
        assert!(!status.has_checked_out);
        assert_eq!(status.location.as_deref(), Some("Head Office"));
        assert_eq!(status.status, Some(AttendanceStatus::Present));
        assert!(h.service.has_checked_in_today(USER).await.unwrap());
    }

    #[tokio::test]
    async fn test_history_pagination() {
        let h = harness().await;
        for _ in 0..25 {
            h.service
                .check_in(USER, check_in_at(h.fence.id, h.fence.center))
                .await
                .unwrap();
            h.clock.advance(Duration::days(1));
        }

        let first = h.service.get_history(USER, Page::new(1, 10)).await.unwrap();
        assert_eq!(first.total, 25);
        assert_eq!(first.total_page, 3);
        assert_eq!(first.data.len(), 10);
        assert!(first.data[0].check_in_time > first.data[9].check_in_time);

        let last = h.service.get_history(USER, Page::new(3, 10)).await.unwrap();
        assert_eq!(last.data.len(), 5);
        assert_eq!(last.page, 3);
    }

    #[tokio::test]
    async fn test_describe_page_attaches_locations() {
        let h = harness().await;
        let annex = LocationStore::create(
            h.store.as_ref(),
            NewGeofence {
                name: "Annex".to_string(),
                description: None,
                center: offset_north(h.fence.center, 1_000.0),
                radius_meters: 50.0,
                created_by: Some(1),
            },
        )
        .await
        .unwrap();

        h.service
            .check_in(USER, check_in_at(h.fence.id, h.fence.center))
            .await
            .unwrap();
        h.clock.advance(Duration::days(1));
        h.service
            .check_in(USER, check_in_at(annex.id, annex.center))
            .await
            .unwrap();
        h.clock.advance(Duration::days(1));
        h.service
            .check_in(USER, check_in_at(h.fence.id, h.fence.center))
            .await
            .unwrap();

        let history = h.service.get_history(USER, Page::new(1, 10)).await.unwrap();
        let described = h.service.describe_page(history).await.unwrap();

        assert_eq!(described.total, 3);
        let names: Vec<_> = described
            .data
            .iter()
            .map(|e| e.location.as_ref().map(|g| g.name.as_str()))
            .collect();
        assert_eq!(names, vec![Some("Head Office"), Some("Annex"), Some("Head Office")]);

        let entry = h.service.describe(described.data[1].record.clone()).await.unwrap();
        assert_eq!(entry.location.map(|g| g.id), Some(annex.id));
    }

    #[tokio::test]
    async fn test_list_all_filters() {
        let h = harness().await;
        h.service
            .check_in(USER, check_in_at(h.fence.id, h.fence.center))
            .await
            .unwrap();
        h.clock.set(monday(10, 30));
        h.service
            .check_in(USER + 1, check_in_at(h.fence.id, h.fence.center))
            .await
            .unwrap();

        let all = h
            .service
            .list_all(&AttendanceFilter::default(), Page::new(1, 20))
            .await
            .unwrap();
        assert_eq!(all.total, 2);

        let late = h
            .service
            .list_all(
                &AttendanceFilter {
                    status: Some(AttendanceStatus::Late),
                    ..Default::default()
                },
                Page::new(1, 20),
            )
            .await
            .unwrap();
        assert_eq!(late.total, 1);
        assert_eq!(late.data[0].user_id, USER + 1);

        let inverted = AttendanceFilter {
            date_from: NaiveDate::from_ymd_opt(2025, 2, 1),
            date_to: NaiveDate::from_ymd_opt(2025, 1, 1),
            ..Default::default()
        };
        assert!(matches!(
            h.service.list_all(&inverted, Page::new(1, 20)).await,
            Err(DomainError::Validation(_))
        ));
    }

    /// A ledger whose existence check always misses, as when two requests race.
    struct RacingLedger(Arc<InMemoryStore>);

    #[async_trait]
    impl AttendanceStore for RacingLedger {
        async fn ping(&self) -> crate::store::StoreResult<()> {
            self.0.ping().await
        }

        async fn find_by_user_and_date(
            &self,
            _user_id: i64,
            _date: NaiveDate,
        ) -> crate::store::StoreResult<Option<AttendanceRecord>> {
            Ok(None)
        }

        async fn insert(&self, new: NewAttendance) -> crate::store::StoreResult<AttendanceRecord> {
            self.0.insert(new).await
        }

        async fn record_check_out(
            &self,
            update: CheckOutUpdate,
        ) -> crate::store::StoreResult<Option<AttendanceRecord>> {
            self.0.record_check_out(update).await
        }

        async fn list_by_user(
            &self,
            user_id: i64,
            limit: i64,
            offset: i64,
        ) -> crate::store::StoreResult<(Vec<AttendanceRecord>, i64)> {
            self.0.list_by_user(user_id, limit, offset).await
        }

        async fn list(
            &self,
            filter: &AttendanceFilter,
            limit: i64,
            offset: i64,
        ) -> crate::store::StoreResult<(Vec<AttendanceRecord>, i64)> {
            AttendanceStore::list(self.0.as_ref(), filter, limit, offset).await
        }
    }

    #[tokio::test]
    async fn test_unique_violation_maps_to_already_checked_in() {
        let h = harness().await;
        let racing = AttendanceService::new(
            Arc::new(RacingLedger(h.store.clone())),
            h.store.clone(),
            h.store.clone(),
        )
        .with_clock(h.clock.clone());

        racing
            .check_in(USER, check_in_at(h.fence.id, h.fence.center))
            .await
            .unwrap();
        let err = racing
            .check_in(USER, check_in_at(h.fence.id, h.fence.center))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::AlreadyCheckedIn));
        assert_eq!(h.store.attendance_count().await, 1);
    }

    #[tokio::test]
    async fn test_storage_failure_is_opaque() {
        let h = harness().await;
        h.store.set_unavailable(true).await;
        let err = h
            .service
            .check_in(USER, check_in_at(h.fence.id, h.fence.center))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Storage(StoreError::Backend(_))));
        assert!(!err.is_client_error());
    }
}
