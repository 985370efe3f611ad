//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod attendance;
pub mod location;
pub mod schedule;

pub use attendance::AttendanceEntity;
pub use location::LocationEntity;
pub use schedule::{UserScheduleEntity, WorkScheduleEntity};
