//! HTTP route handlers.

pub mod admin;
pub mod attendance;
pub mod health;
pub mod locations;
pub mod schedules;
