//! Domain models for the attendance backend.

pub mod attendance;
pub mod location;
pub mod schedule;

pub use attendance::{AttendanceFilter, AttendanceRecord, AttendanceState, AttendanceStatus};
pub use location::{GeoPoint, Geofence};
pub use schedule::{ScheduleAssignment, WorkSchedule};
