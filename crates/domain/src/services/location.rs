//! Location directory service: geofence CRUD and proximity lookups.

use std::sync::Arc;

use tracing::info;

use crate::errors::{DomainError, StoreError};
use crate::models::location::{
    GeoPoint, Geofence, GeofenceCheck, GeofencePatch, NewGeofence,
};
use crate::services::geo;
use crate::store::LocationStore;

/// Administrative and read access to geofences.
#[derive(Clone)]
pub struct LocationService {
    store: Arc<dyn LocationStore>,
}

impl LocationService {
    pub fn new(store: Arc<dyn LocationStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, new: NewGeofence) -> Result<Geofence, DomainError> {
        if new.radius_meters <= 0.0 {
            return Err(DomainError::Validation(
                "Radius must be greater than zero".to_string(),
            ));
        }
        let geofence = self.store.create(new).await?;
        info!(
            location_id = geofence.id,
            name = %geofence.name,
            radius = geofence.radius_meters,
            "Location created"
        );
        Ok(geofence)
    }

    pub async fn get(&self, id: i64) -> Result<Geofence, DomainError> {
        self.store
            .find(id)
            .await?
            .ok_or(DomainError::LocationNotFound)
    }

    pub async fn list(&self, active: Option<bool>) -> Result<Vec<Geofence>, DomainError> {
        Ok(self.store.list(active).await?)
    }

    /// Applies a partial update; only provided fields change.
    pub async fn update(&self, id: i64, patch: GeofencePatch) -> Result<Geofence, DomainError> {
        if let Some(radius) = patch.radius_meters {
            if radius <= 0.0 {
                return Err(DomainError::Validation(
                    "Radius must be greater than zero".to_string(),
                ));
            }
        }
        let geofence = self
            .store
            .update(id, patch)
            .await?
            .ok_or(DomainError::LocationNotFound)?;
        info!(location_id = id, active = geofence.active, "Location updated");
        Ok(geofence)
    }

    /// Deletes a geofence that no attendance or assignment references.
    pub async fn delete(&self, id: i64) -> Result<(), DomainError> {
        match self.store.delete(id).await {
            Ok(true) => {
                info!(location_id = id, "Location deleted");
                Ok(())
            }
            Ok(false) => Err(DomainError::LocationNotFound),
            Err(StoreError::ForeignKeyViolation(_)) => Err(DomainError::Conflict(
                "Location is still referenced by attendance records or schedules".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Active geofences whose center lies within `radius_km` of `point`, nearest first.
    pub async fn nearby(
        &self,
        point: GeoPoint,
        radius_km: f64,
    ) -> Result<Vec<Geofence>, DomainError> {
        let radius_meters = radius_km * 1000.0;
        let mut nearby: Vec<(f64, Geofence)> = self
            .store
            .list(Some(true))
            .await?
            .into_iter()
            .map(|g| (geo::distance(point, g.center), g))
            .filter(|(d, _)| *d <= radius_meters)
            .collect();
        nearby.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(nearby.into_iter().map(|(_, g)| g).collect())
    }

    /// Dry-run geofence check used by clients before checking in.
    pub async fn validate(
        &self,
        location_id: i64,
        point: GeoPoint,
    ) -> Result<GeofenceCheck, DomainError> {
        let geofence = self.get(location_id).await?;
        if !geofence.active {
            return Err(DomainError::LocationInactive);
        }
        Ok(geofence.check(point))
    }
}
