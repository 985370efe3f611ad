//! Repository implementations for database operations.
//!
//! Each repository implements one storage port from `domain::store`.

pub mod attendance;
pub mod location;
pub mod schedule;

pub use attendance::AttendanceRepository;
pub use location::LocationRepository;
pub use schedule::ScheduleRepository;
