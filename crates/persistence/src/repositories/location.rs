//! Attendance location repository for database operations.

use async_trait::async_trait;
use sqlx::PgPool;

use domain::models::location::{Geofence, GeofencePatch, NewGeofence};
use domain::store::{LocationStore, StoreResult};

use crate::entities::LocationEntity;
use crate::error::store_error;
use crate::metrics::QueryTimer;

/// Repository for the attendance_locations table.
#[derive(Clone)]
pub struct LocationRepository {
    pool: PgPool,
}

impl LocationRepository {
    /// Creates a new LocationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new, active location.
    pub async fn create(&self, new: &NewGeofence) -> Result<LocationEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_location");
        let result = sqlx::query_as::<_, LocationEntity>(
            r#"
            INSERT INTO attendance_locations (name, description, latitude, longitude, radius,
                                              is_active, created_by)
            VALUES ($1, $2, $3, $4, $5, true, $6)
            RETURNING *
            "#,
        )
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.center.latitude)
        .bind(new.center.longitude)
        .bind(new.radius_meters)
        .bind(new.created_by)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find location by ID.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<LocationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_location_by_id");
        let result = sqlx::query_as::<_, LocationEntity>(
            r#"
            SELECT * FROM attendance_locations WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List locations, optionally only those with the given active flag.
    pub async fn find_all(&self, active: Option<bool>) -> Result<Vec<LocationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_locations");
        let result = sqlx::query_as::<_, LocationEntity>(
            r#"
            SELECT * FROM attendance_locations
            WHERE ($1::BOOLEAN IS NULL OR is_active = $1)
            ORDER BY name ASC, id ASC
            "#,
        )
        .bind(active)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Update a location (partial update).
    /// Only provided fields are updated; None values are preserved.
    pub async fn update(
        &self,
        id: i64,
        patch: &GeofencePatch,
    ) -> Result<Option<LocationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_location");
        let result = sqlx::query_as::<_, LocationEntity>(
            r#"
            UPDATE attendance_locations SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                latitude = COALESCE($4, latitude),
                longitude = COALESCE($5, longitude),
                radius = COALESCE($6, radius),
                is_active = COALESCE($7, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.description)
        .bind(patch.latitude)
        .bind(patch.longitude)
        .bind(patch.radius_meters)
        .bind(patch.active)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Delete a location.
    /// Returns the number of rows deleted (0 or 1).
    pub async fn delete(&self, id: i64) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_location");
        let result = sqlx::query(
            r#"
            DELETE FROM attendance_locations WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl LocationStore for LocationRepository {
    async fn find(&self, id: i64) -> StoreResult<Option<Geofence>> {
        self.find_by_id(id)
            .await
            .map(|row| row.map(Into::into))
            .map_err(store_error)
    }

    async fn list(&self, active: Option<bool>) -> StoreResult<Vec<Geofence>> {
        self.find_all(active)
            .await
            .map(|rows| rows.into_iter().map(Into::into).collect())
            .map_err(store_error)
    }

    async fn create(&self, new: NewGeofence) -> StoreResult<Geofence> {
        LocationRepository::create(self, &new)
            .await
            .map(Into::into)
            .map_err(store_error)
    }

    async fn update(&self, id: i64, patch: GeofencePatch) -> StoreResult<Option<Geofence>> {
        LocationRepository::update(self, id, &patch)
            .await
            .map(|row| row.map(Into::into))
            .map_err(store_error)
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        LocationRepository::delete(self, id)
            .await
            .map(|rows| rows > 0)
            .map_err(store_error)
    }
}
