//! Work schedule and user schedule entities (database row mappings).

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::FromRow;

use domain::models::schedule::{ScheduleAssignment, WorkSchedule};

/// Database row mapping for the work_schedules table.
#[derive(Debug, Clone, FromRow)]
pub struct WorkScheduleEntity {
    pub id: i64,
    pub name: String,
    pub check_in_start: NaiveTime,
    pub check_in_end: NaiveTime,
    pub check_out_start: NaiveTime,
    pub work_days: Vec<i16>, // SMALLINT[]
    pub half_day_after: Option<NaiveTime>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<WorkScheduleEntity> for WorkSchedule {
    fn from(entity: WorkScheduleEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            check_in_start: entity.check_in_start,
            check_in_end: entity.check_in_end,
            check_out_start: entity.check_out_start,
            work_days: entity
                .work_days
                .into_iter()
                .filter_map(|d| u8::try_from(d).ok())
                .collect(),
            half_day_after: entity.half_day_after,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Database row mapping for the user_schedules table.
#[derive(Debug, Clone, FromRow)]
pub struct UserScheduleEntity {
    pub id: i64,
    pub user_id: i64,
    pub schedule_id: i64,
    pub location_id: i64,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl From<UserScheduleEntity> for ScheduleAssignment {
    fn from(entity: UserScheduleEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            schedule_id: entity.schedule_id,
            location_id: entity.location_id,
            effective_from: entity.effective_from,
            effective_to: entity.effective_to,
            created_at: entity.created_at,
        }
    }
}
