use chrono::{DateTime, Utc};
use diesel::{pg::Pg, prelude::*};

use slotbook_core::scheduling::{Availability, BookingPolicy};

use crate::db::schema;
use crate::error::DbResult;
use crate::model::TimeSlotRow;

/// Stored availability window. Its slots live in `time_slots`.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = schema::availabilities)]
#[diesel(check_for_backend(Pg))]
pub struct AvailabilityRow {
    pub id: uuid::Uuid,
    pub host_profile_id: uuid::Uuid,
    pub schedule_id: Option<uuid::Uuid>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub slot_duration_minutes: i32,
    pub min_advance_booking_minutes: i32,
    pub max_advance_booking_days: i32,
    pub cancellation_deadline_minutes: i32,
    pub created_at: DateTime<Utc>,
}

impl AvailabilityRow {
    /// ## Summary
    /// Reassembles the aggregate from this row and its slot rows.
    ///
    /// ## Errors
    /// Returns `CoreError(InvariantViolation)` if a slot row belongs to
    /// another availability.
    pub fn into_domain(self, slots: Vec<TimeSlotRow>) -> DbResult<Availability> {
        let policy = BookingPolicy {
            min_advance_booking_minutes: self.min_advance_booking_minutes,
            max_advance_booking_days: self.max_advance_booking_days,
            cancellation_deadline_minutes: self.cancellation_deadline_minutes,
        };

        Ok(Availability::restore(
            self.id,
            self.host_profile_id,
            self.schedule_id,
            self.start_time,
            self.end_time,
            self.slot_duration_minutes,
            policy,
            self.created_at,
            slots.into_iter().map(Into::into).collect(),
        )?)
    }
}

impl From<&Availability> for AvailabilityRow {
    fn from(availability: &Availability) -> Self {
        Self {
            id: availability.id,
            host_profile_id: availability.host_profile_id,
            schedule_id: availability.schedule_id,
            start_time: availability.start_time,
            end_time: availability.end_time,
            slot_duration_minutes: availability.slot_duration_minutes,
            min_advance_booking_minutes: availability.policy.min_advance_booking_minutes,
            max_advance_booking_days: availability.policy.max_advance_booking_days,
            cancellation_deadline_minutes: availability.policy.cancellation_deadline_minutes,
            created_at: availability.created_at,
        }
    }
}
