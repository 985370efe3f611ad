//! Work schedule repository for database operations.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

use domain::models::schedule::{
    resolve_assignment, ActiveAssignment, NewAssignment, ScheduleAssignment, WorkSchedule,
    WorkWindow,
};
use domain::store::{ScheduleStore, StoreResult};

use crate::entities::{UserScheduleEntity, WorkScheduleEntity};
use crate::error::store_error;
use crate::metrics::QueryTimer;

/// Repository for the work_schedules and user_schedules tables.
#[derive(Clone)]
pub struct ScheduleRepository {
    pool: PgPool,
}

fn work_days(window: &WorkWindow) -> Vec<i16> {
    window.work_days.iter().map(|&d| i16::from(d)).collect()
}

impl ScheduleRepository {
    /// Creates a new ScheduleRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new work schedule.
    pub async fn create(&self, window: &WorkWindow) -> Result<WorkScheduleEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_work_schedule");
        let result = sqlx::query_as::<_, WorkScheduleEntity>(
            r#"
            INSERT INTO work_schedules (name, check_in_start, check_in_end, check_out_start,
                                        work_days, half_day_after)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&window.name)
        .bind(window.check_in_start)
        .bind(window.check_in_end)
        .bind(window.check_out_start)
        .bind(work_days(window))
        .bind(window.half_day_after)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find work schedule by ID.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<WorkScheduleEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_work_schedule_by_id");
        let result = sqlx::query_as::<_, WorkScheduleEntity>(
            r#"
            SELECT * FROM work_schedules WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find the work schedules with the given ids.
    pub async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<WorkScheduleEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_work_schedules_by_ids");
        let result = sqlx::query_as::<_, WorkScheduleEntity>(
            r#"
            SELECT * FROM work_schedules WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List all work schedules.
    pub async fn find_all(&self) -> Result<Vec<WorkScheduleEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_work_schedules");
        let result = sqlx::query_as::<_, WorkScheduleEntity>(
            r#"
            SELECT * FROM work_schedules ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Replace a schedule's window with an already merged and validated one.
    pub async fn update(
        &self,
        id: i64,
        window: &WorkWindow,
    ) -> Result<Option<WorkScheduleEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_work_schedule");
        let result = sqlx::query_as::<_, WorkScheduleEntity>(
            r#"
            UPDATE work_schedules SET
                name = $2,
                check_in_start = $3,
                check_in_end = $4,
                check_out_start = $5,
                work_days = $6,
                half_day_after = $7,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&window.name)
        .bind(window.check_in_start)
        .bind(window.check_in_end)
        .bind(window.check_out_start)
        .bind(work_days(window))
        .bind(window.half_day_after)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Delete a work schedule; its assignments cascade.
    pub async fn delete(&self, id: i64) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_work_schedule");
        let result = sqlx::query(
            r#"
            DELETE FROM work_schedules WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    /// Create a user schedule assignment.
    pub async fn create_assignment(
        &self,
        new: &NewAssignment,
    ) -> Result<UserScheduleEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_user_schedule");
        let result = sqlx::query_as::<_, UserScheduleEntity>(
            r#"
            INSERT INTO user_schedules (user_id, schedule_id, location_id, effective_from,
                                        effective_to)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(new.user_id)
        .bind(new.schedule_id)
        .bind(new.location_id)
        .bind(new.effective_from)
        .bind(new.effective_to)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// A user's assignments, latest start first.
    pub async fn find_assignments_by_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<UserScheduleEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_schedules_by_user");
        let result = sqlx::query_as::<_, UserScheduleEntity>(
            r#"
            SELECT * FROM user_schedules
            WHERE user_id = $1
            ORDER BY effective_from DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// A user's assignments whose interval covers `date`.
    pub async fn find_assignments_covering(
        &self,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<UserScheduleEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_schedules_covering_date");
        let result = sqlx::query_as::<_, UserScheduleEntity>(
            r#"
            SELECT * FROM user_schedules
            WHERE user_id = $1
              AND effective_from <= $2
              AND (effective_to IS NULL OR effective_to > $2)
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}

#[async_trait]
impl ScheduleStore for ScheduleRepository {
    async fn find(&self, id: i64) -> StoreResult<Option<WorkSchedule>> {
        self.find_by_id(id)
            .await
            .map(|row| row.map(Into::into))
            .map_err(store_error)
    }

    async fn list(&self) -> StoreResult<Vec<WorkSchedule>> {
        self.find_all()
            .await
            .map(|rows| rows.into_iter().map(Into::into).collect())
            .map_err(store_error)
    }

    async fn create(&self, window: WorkWindow) -> StoreResult<WorkSchedule> {
        ScheduleRepository::create(self, &window)
            .await
            .map(Into::into)
            .map_err(store_error)
    }

    async fn update(&self, id: i64, window: WorkWindow) -> StoreResult<Option<WorkSchedule>> {
        ScheduleRepository::update(self, id, &window)
            .await
            .map(|row| row.map(Into::into))
            .map_err(store_error)
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        ScheduleRepository::delete(self, id)
            .await
            .map(|rows| rows > 0)
            .map_err(store_error)
    }

    async fn assign(&self, new: NewAssignment) -> StoreResult<ScheduleAssignment> {
        self.create_assignment(&new)
            .await
            .map(Into::into)
            .map_err(store_error)
    }

    async fn list_assignments_for_user(
        &self,
        user_id: i64,
    ) -> StoreResult<Vec<ScheduleAssignment>> {
        self.find_assignments_by_user(user_id)
            .await
            .map(|rows| rows.into_iter().map(Into::into).collect())
            .map_err(store_error)
    }

    async fn active_assignment(
        &self,
        user_id: i64,
        date: NaiveDate,
    ) -> StoreResult<Option<ActiveAssignment>> {
        let assignments: Vec<ScheduleAssignment> = self
            .find_assignments_covering(user_id, date)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(Into::into)
            .collect();
        if assignments.is_empty() {
            return Ok(None);
        }

        let mut schedule_ids: Vec<i64> = assignments.iter().map(|a| a.schedule_id).collect();
        schedule_ids.sort_unstable();
        schedule_ids.dedup();
        let schedules: HashMap<i64, WorkSchedule> = self
            .find_by_ids(&schedule_ids)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(|row| (row.id, row.into()))
            .collect();

        let candidates = assignments.into_iter().filter_map(|assignment| {
            schedules
                .get(&assignment.schedule_id)
                .cloned()
                .map(|schedule| ActiveAssignment {
                    assignment,
                    schedule,
                })
        });
        Ok(resolve_assignment(candidates, date))
    }
}
