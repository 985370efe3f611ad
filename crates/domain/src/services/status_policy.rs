//! Classification of a check-in as present, late or half day.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::models::attendance::AttendanceStatus;
use crate::models::schedule::WorkSchedule;

/// Last hour of the day (inclusive) that counts as on time without a schedule.
pub const FALLBACK_ON_TIME_UNTIL_HOUR: u32 = 9;

/// First hour of the day that counts as a half day without a schedule.
pub const FALLBACK_HALF_DAY_FROM_HOUR: u32 = 12;

/// Fixed hour table used when the user has no schedule for the day.
///
/// Every minute of the 09:00 hour still counts as present.
pub fn classify_fallback(time: NaiveTime) -> AttendanceStatus {
    let hour = time.hour();
    if hour <= FALLBACK_ON_TIME_UNTIL_HOUR {
        AttendanceStatus::Present
    } else if hour < FALLBACK_HALF_DAY_FROM_HOUR {
        AttendanceStatus::Late
    } else {
        AttendanceStatus::HalfDay
    }
}

/// Classifies a check-in time against a work window.
pub fn classify_with_schedule(time: NaiveTime, schedule: &WorkSchedule) -> AttendanceStatus {
    if time <= schedule.check_in_end {
        AttendanceStatus::Present
    } else if time >= schedule.half_day_threshold() {
        AttendanceStatus::HalfDay
    } else {
        AttendanceStatus::Late
    }
}

/// Classifies a local check-in instant.
///
/// Assignment resolution already skips schedules that do not work on the
/// check-in's weekday; an off-day schedule passed here still falls back.
pub fn classify(local: NaiveDateTime, schedule: Option<&WorkSchedule>) -> AttendanceStatus {
    let date: NaiveDate = local.date();
    match schedule.filter(|s| s.applies_on(date)) {
        Some(schedule) => classify_with_schedule(local.time(), schedule),
        None => classify_fallback(local.time()),
    }
}
