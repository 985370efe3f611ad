//! Persistence layer for the attendance backend.
//!
//! This crate contains:
//! - Database connection management and migrations
//! - Entity definitions (database row mappings)
//! - Repository implementations of the domain storage ports
//! - Query duration metrics

pub mod db;
pub mod entities;
mod error;
pub mod metrics;
pub mod repositories;

/// Embedded SQL migrations, applied at startup.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./src/migrations");
