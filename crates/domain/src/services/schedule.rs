//! Schedule directory service: work windows and per-user assignments.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use crate::errors::{DomainError, StoreError};
use crate::models::schedule::{
    ActiveAssignment, NewAssignment, ScheduleAssignment, UpdateScheduleRequest, WorkSchedule,
    WorkWindow,
};
use crate::store::{LocationStore, ScheduleStore};

/// Administrative access to work schedules and assignments.
#[derive(Clone)]
pub struct ScheduleService {
    schedules: Arc<dyn ScheduleStore>,
    locations: Arc<dyn LocationStore>,
}

impl ScheduleService {
    pub fn new(schedules: Arc<dyn ScheduleStore>, locations: Arc<dyn LocationStore>) -> Self {
        Self {
            schedules,
            locations,
        }
    }

    pub async fn create(&self, window: WorkWindow) -> Result<WorkSchedule, DomainError> {
        window.validate()?;
        let schedule = self.schedules.create(window).await?;
        info!(schedule_id = schedule.id, name = %schedule.name, "Schedule created");
        Ok(schedule)
    }

    pub async fn get(&self, id: i64) -> Result<WorkSchedule, DomainError> {
        self.schedules
            .find(id)
            .await?
            .ok_or(DomainError::ScheduleNotFound)
    }

    pub async fn list(&self) -> Result<Vec<WorkSchedule>, DomainError> {
        Ok(self.schedules.list().await?)
    }

    /// Merges the update over the stored schedule and re-checks its invariants.
    pub async fn update(
        &self,
        id: i64,
        request: UpdateScheduleRequest,
    ) -> Result<WorkSchedule, DomainError> {
        let current = self.get(id).await?;
        let merged = request.merge_into(WorkWindow::from(&current));
        merged.validate()?;

        let schedule = self
            .schedules
            .update(id, merged)
            .await?
            .ok_or(DomainError::ScheduleNotFound)?;
        info!(schedule_id = id, "Schedule updated");
        Ok(schedule)
    }

    /// Deletes a schedule together with its assignments.
    pub async fn delete(&self, id: i64) -> Result<(), DomainError> {
        if !self.schedules.delete(id).await? {
            return Err(DomainError::ScheduleNotFound);
        }
        info!(schedule_id = id, "Schedule deleted");
        Ok(())
    }

    /// Binds a schedule and location to a user from `effective_from`.
    pub async fn assign(&self, new: NewAssignment) -> Result<ScheduleAssignment, DomainError> {
        if let Some(to) = new.effective_to {
            if to <= new.effective_from {
                return Err(DomainError::Validation(
                    "effective_to must be after effective_from".to_string(),
                ));
            }
        }

        self.get(new.schedule_id).await?;
        self.locations
            .find(new.location_id)
            .await?
            .ok_or(DomainError::LocationNotFound)?;

        let user_id = new.user_id;
        let assignment = self.schedules.assign(new).await.map_err(|e| match e {
            StoreError::UniqueViolation(_) => DomainError::Conflict(
                "User already has a schedule starting on that date".to_string(),
            ),
            other => DomainError::Storage(other),
        })?;

        info!(
            user_id = user_id,
            schedule_id = assignment.schedule_id,
            location_id = assignment.location_id,
            effective_from = %assignment.effective_from,
            "Schedule assigned"
        );
        Ok(assignment)
    }

    /// All of a user's assignments with their schedules, latest start first.
    pub async fn list_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<(ScheduleAssignment, Option<WorkSchedule>)>, DomainError> {
        let assignments = self.schedules.list_assignments_for_user(user_id).await?;
        let schedules: HashMap<i64, WorkSchedule> = self
            .schedules
            .list()
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        Ok(assignments
            .into_iter()
            .map(|a| {
                let schedule = schedules.get(&a.schedule_id).cloned();
                (a, schedule)
            })
            .collect())
    }

    /// The assignment governing `date`, if any.
    pub async fn active_assignment(
        &self,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<Option<ActiveAssignment>, DomainError> {
        Ok(self.schedules.active_assignment(user_id, date).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::location::{GeoPoint, NewGeofence};
    use crate::services::memory::InMemoryStore;
    use chrono::NaiveTime;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn office_window() -> WorkWindow {
        WorkWindow {
            name: "Office".to_string(),
            check_in_start: t(8, 0),
            check_in_end: t(9, 0),
            check_out_start: t(17, 0),
            work_days: vec![1, 2, 3, 4, 5],
            half_day_after: None,
        }
    }

    async fn setup() -> (ScheduleService, WorkSchedule, i64) {
        let store = Arc::new(InMemoryStore::new());
        let fence = LocationStore::create(
            store.as_ref(),
            NewGeofence {
                name: "Office".to_string(),
                description: None,
                center: GeoPoint::new(-6.2, 106.8167),
                radius_meters: 50.0,
                created_by: None,
            },
        )
        .await
        .unwrap();
        let service = ScheduleService::new(store.clone(), store);
        let schedule = service.create(office_window()).await.unwrap();
        (service, schedule, fence.id)
    }

    fn assignment(schedule_id: i64, location_id: i64, from: NaiveDate) -> NewAssignment {
        NewAssignment {
            user_id: 7,
            schedule_id,
            location_id,
            effective_from: from,
            effective_to: None,
        }
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_window() {
        let (service, _, _) = setup().await;
        let mut window = office_window();
        window.work_days = vec![1, 8];
        assert!(matches!(
            service.create(window).await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_update_rechecks_merged_window() {
        let (service, schedule, _) = setup().await;

        let updated = service
            .update(
                schedule.id,
                UpdateScheduleRequest {
                    check_in_end: Some(t(9, 30)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.check_in_end, t(9, 30));
        assert_eq!(updated.name, "Office");

        let err = service
            .update(
                schedule.id,
                UpdateScheduleRequest {
                    check_out_start: Some(t(9, 0)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn test_missing_schedule() {
        let (service, _, _) = setup().await;
        assert!(matches!(service.get(404).await, Err(DomainError::ScheduleNotFound)));
        assert!(matches!(service.delete(404).await, Err(DomainError::ScheduleNotFound)));
        assert!(matches!(
            service.update(404, UpdateScheduleRequest::default()).await,
            Err(DomainError::ScheduleNotFound)
        ));
    }

    #[tokio::test]
    async fn test_assign_checks_references() {
        let (service, schedule, location_id) = setup().await;

        assert!(matches!(
            service.assign(assignment(404, location_id, d(2025, 1, 1))).await,
            Err(DomainError::ScheduleNotFound)
        ));
        assert!(matches!(
            service.assign(assignment(schedule.id, 404, d(2025, 1, 1))).await,
            Err(DomainError::LocationNotFound)
        ));
    }

    #[tokio::test]
    async fn test_assign_rejects_empty_interval() {
        let (service, schedule, location_id) = setup().await;
        let mut new = assignment(schedule.id, location_id, d(2025, 1, 1));
        new.effective_to = Some(d(2025, 1, 1));
        assert!(matches!(
            service.assign(new).await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_start_date_conflicts() {
        let (service, schedule, location_id) = setup().await;
        service
            .assign(assignment(schedule.id, location_id, d(2025, 1, 1)))
            .await
            .unwrap();
        assert!(matches!(
            service
                .assign(assignment(schedule.id, location_id, d(2025, 1, 1)))
                .await,
            Err(DomainError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_list_and_resolve_assignments() {
        let (service, schedule, location_id) = setup().await;
        let later = service
            .create(WorkWindow {
                name: "Late shift".to_string(),
                check_in_start: t(10, 0),
                check_in_end: t(10, 30),
                check_out_start: t(19, 0),
                work_days: vec![1, 2, 3, 4, 5],
                half_day_after: None,
            })
            .await
            .unwrap();

        service
            .assign(assignment(schedule.id, location_id, d(2025, 1, 1)))
            .await
            .unwrap();
        service
            .assign(assignment(later.id, location_id, d(2025, 3, 1)))
            .await
            .unwrap();

        let listed = service.list_for_user(7).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].0.schedule_id, later.id);
        assert_eq!(listed[0].1.as_ref().unwrap().name, "Late shift");

        let february = service.active_assignment(7, d(2025, 2, 3)).await.unwrap().unwrap();
        assert_eq!(february.schedule.id, schedule.id);
        let march = service.active_assignment(7, d(2025, 3, 3)).await.unwrap().unwrap();
        assert_eq!(march.schedule.id, later.id);
        assert!(service.active_assignment(8, d(2025, 3, 3)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_removes_assignments() {
        let (service, schedule, location_id) = setup().await;
        service
            .assign(assignment(schedule.id, location_id, d(2025, 1, 1)))
            .await
            .unwrap();

        service.delete(schedule.id).await.unwrap();
        assert!(service.list_for_user(7).await.unwrap().is_empty());
    }
}
