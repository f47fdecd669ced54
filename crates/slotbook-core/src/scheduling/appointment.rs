//! Booking records and their state machine.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::scheduling::policy::{BookingPolicy, cancellation_cutoff};
use crate::scheduling::profile::SchedulingProfile;
use crate::scheduling::time_slot::TimeSlot;
use crate::types::AppointmentStatus;

pub const MAX_NOTES_LEN: usize = 2000;

/// A guest's booking of one slot of a host's availability.
///
/// `Scheduled` is the only non-terminal state; both `Canceled` and `Completed`
/// reject further transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Appointment {
    pub id: uuid::Uuid,
    pub time_slot_id: uuid::Uuid,
    pub host_profile_id: uuid::Uuid,
    pub guest_profile_id: uuid::Uuid,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    status: AppointmentStatus,
    canceled_at: Option<DateTime<Utc>>,
    canceled_by: Option<String>,
    cancellation_reason: Option<String>,
    completed_at: Option<DateTime<Utc>>,
}

/// Stored appointment state, used to rebuild an [`Appointment`].
#[derive(Debug, Clone)]
pub struct AppointmentRecord {
    pub id: uuid::Uuid,
    pub time_slot_id: uuid::Uuid,
    pub host_profile_id: uuid::Uuid,
    pub guest_profile_id: uuid::Uuid,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub canceled_by: Option<String>,
    pub cancellation_reason: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Appointment {
    /// ## Summary
    /// Books `slot` for `guest` with `host`.
    ///
    /// Checks run in order: self-booking, booking window, then the slot's own
    /// `book` transition. The slot is only mutated when every check passes.
    ///
    /// ## Errors
    /// Returns `SelfBookingNotAllowed`, `TooSoon`, `TooFarInFuture`,
    /// `SlotNotAvailable`, or `ValidationError` for oversized notes.
    pub fn create(
        slot: &mut TimeSlot,
        host: &SchedulingProfile,
        guest: &SchedulingProfile,
        policy: &BookingPolicy,
        now: DateTime<Utc>,
        notes: Option<&str>,
    ) -> CoreResult<Self> {
        if host.shares_owner_with(guest) {
            return Err(CoreError::SelfBookingNotAllowed);
        }

        policy.check_booking_window(slot.start_time, now)?;

        let notes = notes.map(str::trim).filter(|n| !n.is_empty());
        if let Some(notes) = notes
            && notes.chars().count() > MAX_NOTES_LEN
        {
            return Err(CoreError::validation(format!(
                "notes must be at most {MAX_NOTES_LEN} characters"
            )));
        }

        slot.book()?;

        Ok(Self {
            id: uuid::Uuid::now_v7(),
            time_slot_id: slot.id,
            host_profile_id: host.id,
            guest_profile_id: guest.id,
            notes: notes.map(str::to_string),
            created_at: now,
            status: AppointmentStatus::Scheduled,
            canceled_at: None,
            canceled_by: None,
            cancellation_reason: None,
            completed_at: None,
        })
    }

    #[must_use]
    pub fn restore(record: AppointmentRecord) -> Self {
        Self {
            id: record.id,
            time_slot_id: record.time_slot_id,
            host_profile_id: record.host_profile_id,
            guest_profile_id: record.guest_profile_id,
            notes: record.notes,
            created_at: record.created_at,
            status: record.status,
            canceled_at: record.canceled_at,
            canceled_by: record.canceled_by,
            cancellation_reason: record.cancellation_reason,
            completed_at: record.completed_at,
        }
    }

    #[must_use]
    pub const fn status(&self) -> AppointmentStatus {
        self.status
    }

    #[must_use]
    pub const fn canceled_at(&self) -> Option<DateTime<Utc>> {
        self.canceled_at
    }

    #[must_use]
    pub fn canceled_by(&self) -> Option<&str> {
        self.canceled_by.as_deref()
    }

    #[must_use]
    pub fn cancellation_reason(&self) -> Option<&str> {
        self.cancellation_reason.as_deref()
    }

    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    fn ensure_scheduled(&self) -> CoreResult<()> {
        match self.status {
            AppointmentStatus::Scheduled => Ok(()),
            AppointmentStatus::Canceled => Err(CoreError::AlreadyCanceled),
            AppointmentStatus::Completed => Err(CoreError::AlreadyCompleted),
        }
    }

    /// ## Summary
    /// Cancels the appointment and releases its slot.
    ///
    /// ## Errors
    /// Returns `AlreadyCanceled`/`AlreadyCompleted` for terminal appointments,
    /// `CancellationDeadlinePassed` when `now` is later than the slot start minus
    /// the deadline, or `InvariantViolation` if `slot` is not this appointment's slot.
    pub fn cancel(
        &mut self,
        canceled_by: &str,
        slot: &mut TimeSlot,
        cancellation_deadline_minutes: i32,
        now: DateTime<Utc>,
        reason: Option<&str>,
    ) -> CoreResult<()> {
        self.ensure_scheduled()?;
        if slot.id != self.time_slot_id {
            return Err(CoreError::InvariantViolation(
                "slot does not belong to appointment",
            ));
        }
        if now > cancellation_cutoff(slot.start_time, cancellation_deadline_minutes) {
            return Err(CoreError::CancellationDeadlinePassed);
        }

        self.status = AppointmentStatus::Canceled;
        self.canceled_at = Some(now);
        self.canceled_by = Some(canceled_by.to_string());
        self.cancellation_reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);
        slot.release();
        Ok(())
    }

    /// ## Summary
    /// Marks the appointment as completed. The slot stays booked.
    ///
    /// ## Errors
    /// Returns `AlreadyCanceled`/`AlreadyCompleted` for terminal appointments.
    pub fn complete(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        self.ensure_scheduled()?;
        self.status = AppointmentStatus::Completed;
        self.completed_at = Some(now);
        Ok(())
    }

    #[must_use]
    pub fn is_host(&self, profile_id: uuid::Uuid) -> bool {
        self.host_profile_id == profile_id
    }

    #[must_use]
    pub fn is_guest(&self, profile_id: uuid::Uuid) -> bool {
        self.guest_profile_id == profile_id
    }

    #[must_use]
    pub fn is_participant(&self, profile_id: uuid::Uuid) -> bool {
        self.is_host(profile_id) || self.is_guest(profile_id)
    }
}
