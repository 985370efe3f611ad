//! Domain services for the attendance backend.
//!
//! Services contain business logic that operates on domain models and
//! reach storage only through the ports in [`crate::store`].

pub mod attendance;
pub mod geo;
pub mod location;
pub mod memory;
pub mod schedule;
pub mod status_policy;

pub use attendance::AttendanceService;
pub use location::LocationService;
pub use memory::{FixedClock, InMemoryStore};
pub use schedule::ScheduleService;
