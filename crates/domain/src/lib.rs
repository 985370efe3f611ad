//! Domain layer for the attendance backend.
//!
//! This crate contains:
//! - Domain models (Geofence, WorkSchedule, AttendanceRecord)
//! - Storage ports implemented by the persistence layer
//! - The geofencing math, status policy and attendance engine
//! - Domain error types

pub mod errors;
pub mod models;
pub mod services;
pub mod store;

pub use errors::{DomainError, StoreError};
