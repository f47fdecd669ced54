use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use diesel::{pg::Pg, prelude::*};

use slotbook_core::scheduling::schedule::{weekday_from_iso, weekday_to_iso};
use slotbook_core::scheduling::{BookingPolicy, Schedule, ScheduleDefinition};

use crate::db::schema;
use crate::error::{DbError, DbResult};

/// Stored recurring schedule. Weekdays are ISO numbers (Monday = 1).
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = schema::schedules)]
#[diesel(check_for_backend(Pg))]
pub struct ScheduleRow {
    pub id: uuid::Uuid,
    pub profile_id: uuid::Uuid,
    pub name: String,
    pub days_of_week: Vec<i32>,
    pub start_time_of_day: NaiveTime,
    pub end_time_of_day: NaiveTime,
    pub slot_duration_minutes: i32,
    pub effective_from: NaiveDate,
    pub effective_until: Option<NaiveDate>,
    pub min_advance_booking_minutes: i32,
    pub max_advance_booking_days: i32,
    pub cancellation_deadline_minutes: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Mutable columns written by an update.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = schema::schedules)]
pub struct ScheduleChangeset<'a> {
    pub name: &'a str,
    pub days_of_week: &'a [i32],
    pub start_time_of_day: NaiveTime,
    pub end_time_of_day: NaiveTime,
    pub slot_duration_minutes: i32,
    pub effective_from: NaiveDate,
    // `None` must clear the column.
    #[diesel(treat_none_as_null = true)]
    pub effective_until: Option<NaiveDate>,
    pub min_advance_booking_minutes: i32,
    pub max_advance_booking_days: i32,
    pub cancellation_deadline_minutes: i32,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

impl ScheduleRow {
    /// Changeset carrying every mutable column of this row.
    #[must_use]
    pub fn changeset(&self) -> ScheduleChangeset<'_> {
        ScheduleChangeset {
            name: &self.name,
            days_of_week: &self.days_of_week,
            start_time_of_day: self.start_time_of_day,
            end_time_of_day: self.end_time_of_day,
            slot_duration_minutes: self.slot_duration_minutes,
            effective_from: self.effective_from,
            effective_until: self.effective_until,
            min_advance_booking_minutes: self.min_advance_booking_minutes,
            max_advance_booking_days: self.max_advance_booking_days,
            cancellation_deadline_minutes: self.cancellation_deadline_minutes,
            is_active: self.is_active,
            updated_at: self.updated_at,
        }
    }
}

impl TryFrom<ScheduleRow> for Schedule {
    type Error = DbError;

    fn try_from(row: ScheduleRow) -> DbResult<Self> {
        let days_of_week = row
            .days_of_week
            .iter()
            .map(|day| {
                weekday_from_iso(*day)
                    .ok_or_else(|| DbError::invalid_row("schedules", format!("weekday {day}")))
            })
            .collect::<DbResult<Vec<_>>>()?;

        let definition = ScheduleDefinition {
            name: row.name,
            days_of_week,
            start_time_of_day: row.start_time_of_day,
            end_time_of_day: row.end_time_of_day,
            slot_duration_minutes: row.slot_duration_minutes,
            effective_from: row.effective_from,
            effective_until: row.effective_until,
            policy: BookingPolicy {
                min_advance_booking_minutes: row.min_advance_booking_minutes,
                max_advance_booking_days: row.max_advance_booking_days,
                cancellation_deadline_minutes: row.cancellation_deadline_minutes,
            },
        };

        Ok(Self::restore(
            row.id,
            row.profile_id,
            definition,
            row.is_active,
            row.created_at,
            row.updated_at,
        ))
    }
}

impl From<&Schedule> for ScheduleRow {
    fn from(schedule: &Schedule) -> Self {
        Self {
            id: schedule.id,
            profile_id: schedule.profile_id,
            name: schedule.name.clone(),
            days_of_week: schedule
                .days_of_week
                .iter()
                .copied()
                .map(weekday_to_iso)
                .collect(),
            start_time_of_day: schedule.start_time_of_day,
            end_time_of_day: schedule.end_time_of_day,
            slot_duration_minutes: schedule.slot_duration_minutes,
            effective_from: schedule.effective_from,
            effective_until: schedule.effective_until,
            min_advance_booking_minutes: schedule.policy.min_advance_booking_minutes,
            max_advance_booking_days: schedule.policy.max_advance_booking_days,
            cancellation_deadline_minutes: schedule.policy.cancellation_deadline_minutes,
            is_active: schedule.is_active(),
            created_at: schedule.created_at,
            updated_at: schedule.updated_at,
        }
    }
}
