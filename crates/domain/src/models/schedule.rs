//! Work schedule and schedule assignment domain models.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::DomainError;

/// Gap between the end of the check-in window and the start of half-day
/// classification when a schedule does not define its own threshold.
pub const DEFAULT_HALF_DAY_GRACE_HOURS: i64 = 3;

/// A named work-time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkSchedule {
    pub id: i64,
    pub name: String,
    pub check_in_start: NaiveTime,
    pub check_in_end: NaiveTime,
    pub check_out_start: NaiveTime,
    /// ISO weekdays, 1 = Monday .. 7 = Sunday.
    pub work_days: Vec<u8>,
    /// Check-ins at or after this time count as half days.
    pub half_day_after: Option<NaiveTime>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkSchedule {
    /// Returns true if the schedule applies on the given calendar date.
    pub fn applies_on(&self, date: NaiveDate) -> bool {
        let weekday = date.weekday().number_from_monday() as u8;
        self.work_days.contains(&weekday)
    }

    /// Time of day from which a check-in is classified as a half day.
    pub fn half_day_threshold(&self) -> NaiveTime {
        if let Some(threshold) = self.half_day_after {
            return threshold;
        }
        let (shifted, wrapped) = self
            .check_in_end
            .overflowing_add_signed(Duration::hours(DEFAULT_HALF_DAY_GRACE_HOURS));
        if wrapped != 0 || shifted > self.check_out_start {
            self.check_out_start
        } else {
            shifted
        }
    }
}

/// Fields that define a work window, checked together for consistency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkWindow {
    pub name: String,
    pub check_in_start: NaiveTime,
    pub check_in_end: NaiveTime,
    pub check_out_start: NaiveTime,
    pub work_days: Vec<u8>,
    pub half_day_after: Option<NaiveTime>,
}

impl WorkWindow {
    /// Checks the ordering and weekday invariants of a window.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::Validation(
                "Schedule name is required".to_string(),
            ));
        }
        if self.check_in_start > self.check_in_end {
            return Err(DomainError::Validation(
                "check_in_start must not be after check_in_end".to_string(),
            ));
        }
        if self.check_in_end >= self.check_out_start {
            return Err(DomainError::Validation(
                "check_in_end must be before check_out_start".to_string(),
            ));
        }
        if let Some(half_day) = self.half_day_after {
            if half_day <= self.check_in_end {
                return Err(DomainError::Validation(
                    "half_day_after must be after check_in_end".to_string(),
                ));
            }
        }
        shared::validation::validate_work_days(&self.work_days).map_err(|e| {
            DomainError::Validation(
                e.message
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Invalid work days".to_string()),
            )
        })
    }
}

impl From<&WorkSchedule> for WorkWindow {
    fn from(s: &WorkSchedule) -> Self {
        Self {
            name: s.name.clone(),
            check_in_start: s.check_in_start,
            check_in_end: s.check_in_end,
            check_out_start: s.check_out_start,
            work_days: s.work_days.clone(),
            half_day_after: s.half_day_after,
        }
    }
}

/// Binds a schedule and a location to a user over `[effective_from, effective_to)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleAssignment {
    pub id: i64,
    pub user_id: i64,
    pub schedule_id: i64,
    pub location_id: i64,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl ScheduleAssignment {
    /// Returns true if the assignment's date interval covers `date`.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.effective_from <= date && self.effective_to.map_or(true, |to| date < to)
    }
}

/// An assignment together with its schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveAssignment {
    pub assignment: ScheduleAssignment,
    pub schedule: WorkSchedule,
}

/// Picks the assignment governing `date` among possibly overlapping ones.
///
/// A candidate resolves only if its interval covers `date` and its schedule
/// works on that weekday. Among those the latest `effective_from` wins; ties
/// go to the highest id.
pub fn resolve_assignment<I>(candidates: I, date: NaiveDate) -> Option<ActiveAssignment>
where
    I: IntoIterator<Item = ActiveAssignment>,
{
    candidates
        .into_iter()
        .filter(|c| c.assignment.covers(date) && c.schedule.applies_on(date))
        .max_by_key(|c| (c.assignment.effective_from, c.assignment.id))
}

/// Fields required to create an assignment.
#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub user_id: i64,
    pub schedule_id: i64,
    pub location_id: i64,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
}

/// Request payload for creating a schedule.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateScheduleRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    pub check_in_start: NaiveTime,
    pub check_in_end: NaiveTime,
    pub check_out_start: NaiveTime,
    pub work_days: Vec<u8>,
    pub half_day_after: Option<NaiveTime>,
}

impl From<CreateScheduleRequest> for WorkWindow {
    fn from(req: CreateScheduleRequest) -> Self {
        Self {
            name: req.name,
            check_in_start: req.check_in_start,
            check_in_end: req.check_in_end,
            check_out_start: req.check_out_start,
            work_days: req.work_days,
            half_day_after: req.half_day_after,
        }
    }
}

/// Request payload for updating a schedule (partial update).
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateScheduleRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,
    pub check_in_start: Option<NaiveTime>,
    pub check_in_end: Option<NaiveTime>,
    pub check_out_start: Option<NaiveTime>,
    pub work_days: Option<Vec<u8>>,
    pub half_day_after: Option<NaiveTime>,
}

impl UpdateScheduleRequest {
    /// Merges the provided fields over an existing window.
    pub fn merge_into(self, mut window: WorkWindow) -> WorkWindow {
        if let Some(name) = self.name {
            window.name = name;
        }
        if let Some(t) = self.check_in_start {
            window.check_in_start = t;
        }
        if let Some(t) = self.check_in_end {
            window.check_in_end = t;
        }
        if let Some(t) = self.check_out_start {
            window.check_out_start = t;
        }
        if let Some(days) = self.work_days {
            window.work_days = days;
        }
        if let Some(t) = self.half_day_after {
            window.half_day_after = Some(t);
        }
        window
    }
}

/// Request payload for assigning a schedule to a user.
#[derive(Debug, Clone, Deserialize)]
pub struct AssignScheduleRequest {
    pub user_id: i64,
    pub schedule_id: i64,
    pub location_id: i64,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
}

impl From<AssignScheduleRequest> for NewAssignment {
    fn from(req: AssignScheduleRequest) -> Self {
        Self {
            user_id: req.user_id,
            schedule_id: req.schedule_id,
            location_id: req.location_id,
            effective_from: req.effective_from,
            effective_to: req.effective_to,
        }
    }
}

/// Query parameters for listing a user's assignments.
#[derive(Debug, Clone, Deserialize)]
pub struct UserSchedulesQuery {
    pub user_id: i64,
}

/// Response payload for schedule operations.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleResponse {
    pub id: i64,
    pub name: String,
    pub check_in_start: NaiveTime,
    pub check_in_end: NaiveTime,
    pub check_out_start: NaiveTime,
    pub work_days: Vec<u8>,
    pub half_day_after: NaiveTime,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<WorkSchedule> for ScheduleResponse {
    fn from(s: WorkSchedule) -> Self {
        let half_day_after = s.half_day_threshold();
        Self {
            id: s.id,
            name: s.name,
            check_in_start: s.check_in_start,
            check_in_end: s.check_in_end,
            check_out_start: s.check_out_start,
            work_days: s.work_days,
            half_day_after,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

/// Response payload for assignments.
#[derive(Debug, Clone, Serialize)]
pub struct UserScheduleResponse {
    pub id: i64,
    pub user_id: i64,
    pub schedule_id: i64,
    pub location_id: i64,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ScheduleResponse>,
    pub created_at: DateTime<Utc>,
}

impl UserScheduleResponse {
    pub fn new(assignment: ScheduleAssignment, schedule: Option<WorkSchedule>) -> Self {
        Self {
            id: assignment.id,
            user_id: assignment.user_id,
            schedule_id: assignment.schedule_id,
            location_id: assignment.location_id,
            effective_from: assignment.effective_from,
            effective_to: assignment.effective_to,
            schedule: schedule.map(Into::into),
            created_at: assignment.created_at,
        }
    }
}
