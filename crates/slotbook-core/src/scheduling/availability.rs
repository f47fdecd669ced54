//! Concrete bookable windows and their generated slots.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::scheduling::policy::BookingPolicy;
use crate::scheduling::time_slot::TimeSlot;
use crate::types::SlotStatus;

/// Shortest slot a host may offer.
pub const MIN_SLOT_DURATION_MINUTES: i32 = 5;

/// Half-open interval overlap: `[a_start, a_end)` and `[b_start, b_end)` share an instant.
#[must_use]
pub fn intervals_overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// Validates a slot duration against a window length.
pub(crate) fn check_slot_duration(slot_duration_minutes: i32, window: TimeDelta) -> CoreResult<()> {
    if slot_duration_minutes < MIN_SLOT_DURATION_MINUTES {
        return Err(CoreError::validation(format!(
            "slot duration must be at least {MIN_SLOT_DURATION_MINUTES} minutes"
        )));
    }
    if TimeDelta::minutes(i64::from(slot_duration_minutes)) > window {
        return Err(CoreError::validation(
            "slot duration does not fit into the time window",
        ));
    }
    Ok(())
}

/// A host's open window, divided into consecutive slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Availability {
    pub id: uuid::Uuid,
    pub host_profile_id: uuid::Uuid,
    /// Schedule that generated this window, if any.
    pub schedule_id: Option<uuid::Uuid>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub slot_duration_minutes: i32,
    pub policy: BookingPolicy,
    pub created_at: DateTime<Utc>,
    slots: Vec<TimeSlot>,
}

impl Availability {
    /// ## Summary
    /// Validates the window and eagerly generates its slots.
    ///
    /// Slots are laid end to end from `start_time`; a trailing remainder shorter
    /// than `slot_duration_minutes` is left unused.
    ///
    /// ## Errors
    /// Returns `ValidationError` if the window is empty or inverted, the slot
    /// duration is below the minimum or longer than the window, or the policy
    /// is invalid.
    pub fn create(
        host_profile_id: uuid::Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        slot_duration_minutes: i32,
        policy: BookingPolicy,
    ) -> CoreResult<Self> {
        if end_time <= start_time {
            return Err(CoreError::validation("end time must be after start time"));
        }
        check_slot_duration(slot_duration_minutes, end_time - start_time)?;
        policy.validate()?;

        let id = uuid::Uuid::now_v7();
        let slots = generate_slots(id, start_time, end_time, slot_duration_minutes);

        tracing::trace!(
            availability_id = %id,
            slot_count = slots.len(),
            "Generated slots for availability"
        );

        Ok(Self {
            id,
            host_profile_id,
            schedule_id: None,
            start_time,
            end_time,
            slot_duration_minutes,
            policy,
            created_at: Utc::now(),
            slots,
        })
    }

    /// Tags the availability with the schedule it was generated from.
    #[must_use]
    pub const fn with_schedule(mut self, schedule_id: uuid::Uuid) -> Self {
        self.schedule_id = Some(schedule_id);
        self
    }

    /// ## Summary
    /// Rebuilds an availability and its slots from stored state.
    ///
    /// ## Errors
    /// Returns `InvariantViolation` if a slot belongs to another availability.
    #[expect(clippy::too_many_arguments)]
    pub fn restore(
        id: uuid::Uuid,
        host_profile_id: uuid::Uuid,
        schedule_id: Option<uuid::Uuid>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        slot_duration_minutes: i32,
        policy: BookingPolicy,
        created_at: DateTime<Utc>,
        mut slots: Vec<TimeSlot>,
    ) -> CoreResult<Self> {
        if slots.iter().any(|slot| slot.availability_id != id) {
            return Err(CoreError::InvariantViolation(
                "slot does not belong to availability",
            ));
        }
        slots.sort_by_key(|slot| slot.start_time);

        Ok(Self {
            id,
            host_profile_id,
            schedule_id,
            start_time,
            end_time,
            slot_duration_minutes,
            policy,
            created_at,
            slots,
        })
    }

    #[must_use]
    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    #[must_use]
    pub fn slot(&self, slot_id: uuid::Uuid) -> Option<&TimeSlot> {
        self.slots.iter().find(|slot| slot.id == slot_id)
    }

    pub fn slot_mut(&mut self, slot_id: uuid::Uuid) -> Option<&mut TimeSlot> {
        self.slots.iter_mut().find(|slot| slot.id == slot_id)
    }

    /// Splits the aggregate into a slot and the policy that governs it, so a
    /// caller can mutate the slot while reading the policy.
    pub fn slot_with_policy(&mut self, slot_id: uuid::Uuid) -> Option<(&mut TimeSlot, BookingPolicy)> {
        let policy = self.policy;
        self.slot_mut(slot_id).map(|slot| (slot, policy))
    }

    /// Slots a guest could book at `now`.
    pub fn bookable_slots(&self, now: DateTime<Utc>) -> impl Iterator<Item = &TimeSlot> {
        self.slots
            .iter()
            .filter(move |slot| slot.is_available() && self.policy.is_bookable(slot.start_time, now))
    }

    #[must_use]
    pub fn count_with_status(&self, status: SlotStatus) -> usize {
        self.slots.iter().filter(|slot| slot.status() == status).count()
    }

    /// True iff no slot is currently booked.
    #[must_use]
    pub fn can_be_deleted(&self) -> bool {
        self.slots
            .iter()
            .all(|slot| slot.status() != SlotStatus::Booked)
    }

    #[must_use]
    pub fn overlaps_with(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        intervals_overlap(self.start_time, self.end_time, start, end)
    }

    /// ## Summary
    /// Cancels every slot ahead of removing the availability.
    ///
    /// ## Errors
    /// Returns `AvailabilityHasBookings` if any slot is booked; no slot is
    /// touched in that case.
    pub fn retire(&mut self) -> CoreResult<()> {
        if !self.can_be_deleted() {
            return Err(CoreError::AvailabilityHasBookings);
        }
        for slot in &mut self.slots {
            slot.cancel();
        }
        Ok(())
    }
}

fn generate_slots(
    availability_id: uuid::Uuid,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    slot_duration_minutes: i32,
) -> Vec<TimeSlot> {
    let step = TimeDelta::minutes(i64::from(slot_duration_minutes));
    let mut slots = Vec::new();
    let mut cursor = start_time;

    while let Some(next) = cursor.checked_add_signed(step).filter(|next| *next <= end_time) {
        slots.push(TimeSlot::new(availability_id, cursor, next));
        cursor = next;
    }

    slots
}
