//! Recurring weekly templates that expand into availabilities.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc, Weekday};
use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::scheduling::availability::check_slot_duration;
use crate::scheduling::policy::BookingPolicy;

pub const MAX_SCHEDULE_NAME_LEN: usize = 100;

/// ISO weekday number (Monday = 1 .. Sunday = 7).
#[must_use]
pub fn weekday_to_iso(day: Weekday) -> i32 {
    i32::try_from(day.number_from_monday()).unwrap_or(i32::MAX)
}

/// Inverse of [`weekday_to_iso`]; `None` outside `1..=7`.
#[must_use]
pub fn weekday_from_iso(value: i32) -> Option<Weekday> {
    let index = u8::try_from(value.checked_sub(1)?).ok()?;
    Weekday::try_from(index).ok()
}

/// User-supplied shape of a schedule, shared by create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleDefinition {
    pub name: String,
    pub days_of_week: Vec<Weekday>,
    pub start_time_of_day: NaiveTime,
    pub end_time_of_day: NaiveTime,
    pub slot_duration_minutes: i32,
    pub effective_from: NaiveDate,
    pub effective_until: Option<NaiveDate>,
    pub policy: BookingPolicy,
}

impl ScheduleDefinition {
    /// ## Summary
    /// Validates and normalizes the definition (trimmed name, sorted unique days).
    ///
    /// ## Errors
    /// Returns `ValidationError` describing the first rule that fails.
    pub fn normalized(mut self) -> CoreResult<Self> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(CoreError::validation("schedule name must not be empty"));
        }
        if self.name.chars().count() > MAX_SCHEDULE_NAME_LEN {
            return Err(CoreError::validation(format!(
                "schedule name must be at most {MAX_SCHEDULE_NAME_LEN} characters"
            )));
        }

        self.days_of_week = normalize_days(&self.days_of_week);
        if self.days_of_week.is_empty() {
            return Err(CoreError::validation(
                "schedule must include at least one day of the week",
            ));
        }

        if self.end_time_of_day <= self.start_time_of_day {
            return Err(CoreError::validation(
                "end time of day must be after start time of day",
            ));
        }
        check_slot_duration(
            self.slot_duration_minutes,
            self.end_time_of_day - self.start_time_of_day,
        )?;

        if let Some(until) = self.effective_until
            && until < self.effective_from
        {
            return Err(CoreError::validation(
                "effective until must not be before effective from",
            ));
        }

        self.policy.validate()?;
        Ok(self)
    }
}

fn normalize_days(days: &[Weekday]) -> Vec<Weekday> {
    let mut days = days.to_vec();
    days.sort_by_key(Weekday::number_from_monday);
    days.dedup();
    days
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schedule {
    pub id: uuid::Uuid,
    pub profile_id: uuid::Uuid,
    pub name: String,
    pub days_of_week: Vec<Weekday>,
    pub start_time_of_day: NaiveTime,
    pub end_time_of_day: NaiveTime,
    pub slot_duration_minutes: i32,
    pub effective_from: NaiveDate,
    pub effective_until: Option<NaiveDate>,
    pub policy: BookingPolicy,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    is_active: bool,
}

impl Schedule {
    /// ## Summary
    /// Creates an active schedule for a profile.
    ///
    /// ## Errors
    /// Returns `ValidationError` if the definition is malformed.
    pub fn create(profile_id: uuid::Uuid, definition: ScheduleDefinition) -> CoreResult<Self> {
        let definition = definition.normalized()?;
        let now = Utc::now();

        Ok(Self::from_definition(
            uuid::Uuid::now_v7(),
            profile_id,
            definition,
            true,
            now,
            now,
        ))
    }

    /// Rebuilds a schedule from stored state. Days are re-normalized; no other
    /// validation is applied.
    #[must_use]
    pub fn restore(
        id: uuid::Uuid,
        profile_id: uuid::Uuid,
        definition: ScheduleDefinition,
        is_active: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        let mut definition = definition;
        definition.days_of_week = normalize_days(&definition.days_of_week);
        Self::from_definition(id, profile_id, definition, is_active, created_at, updated_at)
    }

    fn from_definition(
        id: uuid::Uuid,
        profile_id: uuid::Uuid,
        definition: ScheduleDefinition,
        is_active: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            profile_id,
            name: definition.name,
            days_of_week: definition.days_of_week,
            start_time_of_day: definition.start_time_of_day,
            end_time_of_day: definition.end_time_of_day,
            slot_duration_minutes: definition.slot_duration_minutes,
            effective_from: definition.effective_from,
            effective_until: definition.effective_until,
            policy: definition.policy,
            created_at,
            updated_at,
            is_active,
        }
    }

    /// ## Summary
    /// Replaces the schedule's definition. Already generated availabilities are
    /// not touched.
    ///
    /// ## Errors
    /// Returns `ValidationError` if the definition is malformed; the schedule is
    /// unchanged in that case.
    pub fn update(&mut self, definition: ScheduleDefinition) -> CoreResult<()> {
        let definition = definition.normalized()?;

        self.name = definition.name;
        self.days_of_week = definition.days_of_week;
        self.start_time_of_day = definition.start_time_of_day;
        self.end_time_of_day = definition.end_time_of_day;
        self.slot_duration_minutes = definition.slot_duration_minutes;
        self.effective_from = definition.effective_from;
        self.effective_until = definition.effective_until;
        self.policy = definition.policy;
        self.updated_at = Utc::now();
        Ok(())
    }

    #[must_use]
    pub fn definition(&self) -> ScheduleDefinition {
        ScheduleDefinition {
            name: self.name.clone(),
            days_of_week: self.days_of_week.clone(),
            start_time_of_day: self.start_time_of_day,
            end_time_of_day: self.end_time_of_day,
            slot_duration_minutes: self.slot_duration_minutes,
            effective_from: self.effective_from,
            effective_until: self.effective_until,
            policy: self.policy,
        }
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn pause(&mut self) {
        self.is_active = false;
        self.updated_at = Utc::now();
    }

    pub fn resume(&mut self) {
        self.is_active = true;
        self.updated_at = Utc::now();
    }

    #[must_use]
    pub fn is_effective_on(&self, date: NaiveDate) -> bool {
        self.is_active
            && date >= self.effective_from
            && self.effective_until.is_none_or(|until| date <= until)
            && self.days_of_week.contains(&date.weekday())
    }

    /// The daily window on `date`, with wall-clock times read as UTC.
    #[must_use]
    pub fn window_on(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            date.and_time(self.start_time_of_day).and_utc(),
            date.and_time(self.end_time_of_day).and_utc(),
        )
    }
}
