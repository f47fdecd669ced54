//! Storage seams for the scheduling use cases.
//!
//! Every method is one atomic unit of work. Methods that race with other
//! requests (booking, cancellation, slot transitions, deletes) report the
//! losing side through their return value instead of an error, so callers can
//! map it to the matching domain error.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use slotbook_core::scheduling::{
    Appointment, Availability, BookingPolicy, Schedule, SchedulingProfile, TimeSlot,
};
use slotbook_core::types::{AppointmentStatus, SlotStatus};

use crate::error::DbResult;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Result of an insert or update guarded by a uniqueness or overlap rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Applied,
    /// A concurrent or pre-existing row violates the rule; nothing was written.
    Conflict,
}

/// Result of a guarded delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Missing,
    /// Live bookings prevent the delete; nothing was removed.
    Blocked,
}

/// A conditional slot status change: applied only if the slot is still in `from`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotTransition {
    pub slot_id: uuid::Uuid,
    pub from: SlotStatus,
    pub to: SlotStatus,
}

/// An available slot together with the policy of its availability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenSlot {
    pub slot: TimeSlot,
    pub policy: BookingPolicy,
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Stores a new profile. `Conflict` when the owner already has an
    /// individual profile or a business profile with the same name.
    async fn insert_profile(&self, profile: &SchedulingProfile) -> DbResult<WriteOutcome>;

    async fn find_profile(&self, id: uuid::Uuid) -> DbResult<Option<SchedulingProfile>>;

    async fn list_profiles_by_owner(
        &self,
        external_user_id: &str,
    ) -> DbResult<Vec<SchedulingProfile>>;

    /// Case-insensitive lookup of a business name among the owner's profiles.
    async fn business_name_taken(&self, external_user_id: &str, name: &str) -> DbResult<bool>;

    /// Removes the profile and everything it owns. `Blocked` while the profile
    /// takes part in a scheduled appointment.
    async fn delete_profile(&self, id: uuid::Uuid) -> DbResult<DeleteOutcome>;
}

#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// `Conflict` when the profile already has a schedule with that name.
    async fn insert_schedule(&self, schedule: &Schedule) -> DbResult<WriteOutcome>;

    /// Overwrites the stored definition and activity flag. `Conflict` on a
    /// name clash.
    async fn update_schedule(&self, schedule: &Schedule) -> DbResult<WriteOutcome>;

    async fn find_schedule(&self, id: uuid::Uuid) -> DbResult<Option<Schedule>>;

    async fn list_schedules(&self, profile_id: uuid::Uuid) -> DbResult<Vec<Schedule>>;

    async fn list_active_schedules(&self) -> DbResult<Vec<Schedule>>;

    async fn schedule_name_taken(
        &self,
        profile_id: uuid::Uuid,
        name: &str,
        excluding: Option<uuid::Uuid>,
    ) -> DbResult<bool>;

    /// Removes the schedule together with the availabilities generated from
    /// it. `Blocked` if any of those has a booked slot.
    async fn delete_schedule(&self, id: uuid::Uuid) -> DbResult<DeleteOutcome>;
}

#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    /// Stores the availability and its slots. `Conflict` when it overlaps
    /// another availability of the same host.
    async fn insert_availability(&self, availability: &Availability) -> DbResult<WriteOutcome>;

    async fn find_availability(&self, id: uuid::Uuid) -> DbResult<Option<Availability>>;

    /// Loads the availability owning `slot_id`.
    async fn find_availability_by_slot(
        &self,
        slot_id: uuid::Uuid,
    ) -> DbResult<Option<Availability>>;

    /// A host's availabilities intersecting the optional bounds, by start.
    async fn list_availabilities(
        &self,
        host_profile_id: uuid::Uuid,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> DbResult<Vec<Availability>>;

    /// Windows of the host's availabilities overlapping `[start, end)`.
    async fn overlapping_windows(
        &self,
        host_profile_id: uuid::Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<(DateTime<Utc>, DateTime<Utc>)>>;

    /// Available slots of the host starting in `[from, to]`, by start.
    async fn list_open_slots(
        &self,
        host_profile_id: uuid::Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<OpenSlot>>;

    /// Applies every transition or none. Returns false when any slot was no
    /// longer in its expected status.
    async fn transition_slots(&self, transitions: &[SlotTransition]) -> DbResult<bool>;

    /// Cancels the slots and removes the availability with its slots and the
    /// canceled appointments on them. `Blocked` if a slot is booked.
    async fn delete_availability(&self, id: uuid::Uuid) -> DbResult<DeleteOutcome>;
}

#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// Books the appointment's slot and stores the appointment together.
    /// Returns false when the slot was no longer available.
    async fn commit_booking(&self, appointment: &Appointment) -> DbResult<bool>;

    /// Stores the cancellation and releases the slot together. Returns false
    /// when the stored appointment was no longer scheduled.
    async fn commit_cancellation(&self, appointment: &Appointment) -> DbResult<bool>;

    /// Stores the completion. Returns false when the stored appointment was no
    /// longer scheduled.
    async fn commit_completion(&self, appointment: &Appointment) -> DbResult<bool>;

    async fn find_appointment(&self, id: uuid::Uuid) -> DbResult<Option<Appointment>>;

    /// Appointments where the profile is host or guest, newest first.
    async fn list_appointments(
        &self,
        profile_id: uuid::Uuid,
        status: Option<AppointmentStatus>,
    ) -> DbResult<Vec<Appointment>>;
}

/// Everything the scheduling use cases need from storage.
pub trait SchedulingStore:
    ProfileRepository + ScheduleRepository + AvailabilityRepository + AppointmentRepository
{
}

impl<T> SchedulingStore for T where
    T: ProfileRepository + ScheduleRepository + AvailabilityRepository + AppointmentRepository
{
}
