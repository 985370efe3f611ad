//! Shared utilities and common types for the attendance backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Coordinate and schedule validation helpers
//! - Offset-based pagination
//! - Bearer token verification

pub mod jwt;
pub mod pagination;
pub mod validation;
