//! Attendance repository for database operations.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

use domain::models::attendance::{
    AttendanceFilter, AttendanceRecord, CheckOutUpdate, NewAttendance,
};
use domain::store::{AttendanceStore, StoreResult};

use crate::entities::AttendanceEntity;
use crate::error::store_error;
use crate::metrics::QueryTimer;

const FILTER_CLAUSE: &str = r#"
    WHERE ($1::BIGINT IS NULL OR user_id = $1)
      AND ($2::BIGINT IS NULL OR location_id = $2)
      AND ($3::TEXT IS NULL OR status = $3)
      AND ($4::DATE IS NULL OR attendance_date >= $4)
      AND ($5::DATE IS NULL OR attendance_date <= $5)
"#;

/// Repository for the attendance ledger.
#[derive(Clone)]
pub struct AttendanceRepository {
    pool: PgPool,
}

impl AttendanceRepository {
    /// Creates a new AttendanceRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user's record for one calendar date.
    pub async fn find_by_user_and_date(
        &self,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_attendance_by_user_and_date");
        let result = sqlx::query_as::<_, AttendanceEntity>(
            r#"
            SELECT * FROM attendances WHERE user_id = $1 AND attendance_date = $2
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Insert a check-in. The (user_id, attendance_date) unique key rejects duplicates.
    pub async fn insert(&self, new: &NewAttendance) -> Result<AttendanceEntity, sqlx::Error> {
        let timer = QueryTimer::new("insert_attendance");
        let result = sqlx::query_as::<_, AttendanceEntity>(
            r#"
            INSERT INTO attendances (user_id, location_id, attendance_date, check_in_time,
                                     check_in_latitude, check_in_longitude,
                                     distance_from_location, status, notes, photo_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(new.user_id)
        .bind(new.location_id)
        .bind(new.attendance_date)
        .bind(new.check_in_time)
        .bind(new.check_in_point.latitude)
        .bind(new.check_in_point.longitude)
        .bind(new.distance_from_location)
        .bind(new.status.as_str())
        .bind(&new.notes)
        .bind(&new.photo_url)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Set the check-out fields unless another request already did.
    pub async fn record_check_out(
        &self,
        update: &CheckOutUpdate,
    ) -> Result<Option<AttendanceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("record_attendance_check_out");
        let result = sqlx::query_as::<_, AttendanceEntity>(
            r#"
            UPDATE attendances SET
                check_out_time = $2,
                check_out_latitude = $3,
                check_out_longitude = $4,
                notes = $5,
                updated_at = NOW()
            WHERE id = $1 AND check_out_time IS NULL
            RETURNING *
            "#,
        )
        .bind(update.record_id)
        .bind(update.event.time)
        .bind(update.event.point.latitude)
        .bind(update.event.point.longitude)
        .bind(&update.notes)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Records matching `filter`, newest check-in first.
    pub async fn find_filtered(
        &self,
        filter: &AttendanceFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AttendanceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_attendances_filtered");
        let sql = format!(
            "SELECT * FROM attendances {} ORDER BY check_in_time DESC, id DESC LIMIT $6 OFFSET $7",
            FILTER_CLAUSE
        );
        let result = sqlx::query_as::<_, AttendanceEntity>(&sql)
            .bind(filter.user_id)
            .bind(filter.location_id)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.date_from)
            .bind(filter.date_to)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Count records matching `filter`.
    pub async fn count_filtered(&self, filter: &AttendanceFilter) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_attendances_filtered");
        let sql = format!("SELECT COUNT(*) FROM attendances {}", FILTER_CLAUSE);
        let count: (i64,) = sqlx::query_as(&sql)
            .bind(filter.user_id)
            .bind(filter.location_id)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.date_from)
            .bind(filter.date_to)
            .fetch_one(&self.pool)
            .await?;
        timer.record();
        Ok(count.0)
    }
}

#[async_trait]
impl AttendanceStore for AttendanceRepository {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(store_error)
    }

    async fn find_by_user_and_date(
        &self,
        user_id: i64,
        date: NaiveDate,
    ) -> StoreResult<Option<AttendanceRecord>> {
        AttendanceRepository::find_by_user_and_date(self, user_id, date)
            .await
            .map(|row| row.map(AttendanceEntity::into_domain))
            .map_err(store_error)
    }

    async fn insert(&self, new: NewAttendance) -> StoreResult<AttendanceRecord> {
        AttendanceRepository::insert(self, &new)
            .await
            .map(AttendanceEntity::into_domain)
            .map_err(store_error)
    }

    async fn record_check_out(
        &self,
        update: CheckOutUpdate,
    ) -> StoreResult<Option<AttendanceRecord>> {
        AttendanceRepository::record_check_out(self, &update)
            .await
            .map(|row| row.map(AttendanceEntity::into_domain))
            .map_err(store_error)
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
        let rows = self
            .find_filtered(filter, limit, offset)
            .await
            .map_err(store_error)?;
        let total = self.count_filtered(filter).await.map_err(store_error)?;
        Ok((rows.into_iter().map(AttendanceEntity::into_domain).collect(), total))
    }
}
