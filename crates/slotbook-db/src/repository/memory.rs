//! In-process store for tests and single-node tooling.
//!
//! One async mutex guards the whole state, so every method is trivially
//! atomic. The guarded-write rules mirror the Postgres constraints.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use slotbook_core::scheduling::{
    Appointment, Availability, Schedule, SchedulingProfile, TimeSlot, intervals_overlap,
};
use slotbook_core::types::{AppointmentStatus, ProfileType, SlotStatus};

use crate::error::DbResult;
use crate::repository::{
    AppointmentRepository, AvailabilityRepository, DeleteOutcome, OpenSlot, ProfileRepository,
    ScheduleRepository, SlotTransition, WriteOutcome,
};

#[derive(Debug, Default)]
struct MemoryState {
    profiles: HashMap<uuid::Uuid, SchedulingProfile>,
    schedules: HashMap<uuid::Uuid, Schedule>,
    availabilities: HashMap<uuid::Uuid, Availability>,
    appointments: HashMap<uuid::Uuid, Appointment>,
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

fn set_status(slot: &mut TimeSlot, status: SlotStatus) {
    *slot = TimeSlot::restore(
        slot.id,
        slot.availability_id,
        slot.start_time,
        slot.end_time,
        status,
    );
}

impl MemoryState {
    fn slot(&self, slot_id: uuid::Uuid) -> Option<&TimeSlot> {
        self.availabilities
            .values()
            .find_map(|availability| availability.slot(slot_id))
    }

    fn slot_mut(&mut self, slot_id: uuid::Uuid) -> Option<&mut TimeSlot> {
        self.availabilities
            .values_mut()
            .find_map(|availability| availability.slot_mut(slot_id))
    }

    fn business_name_taken(&self, external_user_id: &str, name: &str) -> bool {
        self.profiles.values().any(|profile| {
            profile.external_user_id == external_user_id
                && profile.profile_type == ProfileType::Business
                && profile
                    .business_name
                    .as_deref()
                    .is_some_and(|existing| same_name(existing, name))
        })
    }

    fn schedule_name_taken(
        &self,
        profile_id: uuid::Uuid,
        name: &str,
        excluding: Option<uuid::Uuid>,
    ) -> bool {
        self.schedules.values().any(|schedule| {
            schedule.profile_id == profile_id
                && Some(schedule.id) != excluding
                && same_name(&schedule.name, name)
        })
    }

    /// Removes availabilities, their slots and the appointments on them.
    fn purge_availabilities(&mut self, ids: &[uuid::Uuid]) {
        let slot_ids: HashSet<uuid::Uuid> = ids
            .iter()
            .filter_map(|id| self.availabilities.remove(id))
            .flat_map(|availability| {
                availability
                    .slots()
                    .iter()
                    .map(|slot| slot.id)
                    .collect::<Vec<_>>()
            })
            .collect();
        self.appointments
            .retain(|_, appointment| !slot_ids.contains(&appointment.time_slot_id));
    }

    /// Like `purge_availabilities`, but refuses (returns false) while any
    /// slot is booked.
    fn remove_availabilities(&mut self, ids: &[uuid::Uuid]) -> bool {
        let booked = ids
            .iter()
            .filter_map(|id| self.availabilities.get(id))
            .any(|availability| !availability.can_be_deleted());
        if booked {
            return false;
        }
        self.purge_availabilities(ids);
        true
    }
}

/// Store holding everything in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileRepository for MemoryStore {
    async fn insert_profile(&self, profile: &SchedulingProfile) -> DbResult<WriteOutcome> {
        let mut state = self.state.lock().await;

        let clash = match (profile.profile_type, profile.business_name.as_deref()) {
            (ProfileType::Individual, _) => state.profiles.values().any(|existing| {
                existing.external_user_id == profile.external_user_id
                    && existing.profile_type == ProfileType::Individual
            }),
            (ProfileType::Business, Some(name)) => {
                state.business_name_taken(&profile.external_user_id, name)
            }
            (ProfileType::Business, None) => false,
        };
        if clash || state.profiles.contains_key(&profile.id) {
            return Ok(WriteOutcome::Conflict);
        }

        state.profiles.insert(profile.id, profile.clone());
        Ok(WriteOutcome::Applied)
    }

    async fn find_profile(&self, id: uuid::Uuid) -> DbResult<Option<SchedulingProfile>> {
        Ok(self.state.lock().await.profiles.get(&id).cloned())
    }

    async fn list_profiles_by_owner(
        &self,
        external_user_id: &str,
    ) -> DbResult<Vec<SchedulingProfile>> {
        let state = self.state.lock().await;
        let mut profiles: Vec<_> = state
            .profiles
            .values()
            .filter(|profile| profile.external_user_id == external_user_id)
            .cloned()
            .collect();
        profiles.sort_by_key(|profile| (profile.created_at, profile.id));
        Ok(profiles)
    }

    async fn business_name_taken(&self, external_user_id: &str, name: &str) -> DbResult<bool> {
        Ok(self
            .state
            .lock()
            .await
            .business_name_taken(external_user_id, name))
    }

    async fn delete_profile(&self, id: uuid::Uuid) -> DbResult<DeleteOutcome> {
        let mut state = self.state.lock().await;
        if !state.profiles.contains_key(&id) {
            return Ok(DeleteOutcome::Missing);
        }

        let engaged = state.appointments.values().any(|appointment| {
            appointment.status() == AppointmentStatus::Scheduled && appointment.is_participant(id)
        });
        if engaged {
            return Ok(DeleteOutcome::Blocked);
        }

        let owned: Vec<uuid::Uuid> = state
            .availabilities
            .values()
            .filter(|availability| availability.host_profile_id == id)
            .map(|availability| availability.id)
            .collect();
        // Only terminal appointments remain; completed ones may still hold
        // booked slots, which go with the profile.
        state.purge_availabilities(&owned);

        state.schedules.retain(|_, schedule| schedule.profile_id != id);
        state
            .appointments
            .retain(|_, appointment| !appointment.is_participant(id));
        state.profiles.remove(&id);
        Ok(DeleteOutcome::Deleted)
    }
}

#[async_trait]
impl ScheduleRepository for MemoryStore {
    async fn insert_schedule(&self, schedule: &Schedule) -> DbResult<WriteOutcome> {
        let mut state = self.state.lock().await;
        if state.schedule_name_taken(schedule.profile_id, &schedule.name, None) {
            return Ok(WriteOutcome::Conflict);
        }
        state.schedules.insert(schedule.id, schedule.clone());
        Ok(WriteOutcome::Applied)
    }

    async fn update_schedule(&self, schedule: &Schedule) -> DbResult<WriteOutcome> {
        let mut state = self.state.lock().await;
        if state.schedule_name_taken(schedule.profile_id, &schedule.name, Some(schedule.id)) {
            return Ok(WriteOutcome::Conflict);
        }
        if let Some(stored) = state.schedules.get_mut(&schedule.id) {
            *stored = schedule.clone();
        }
        Ok(WriteOutcome::Applied)
    }

    async fn find_schedule(&self, id: uuid::Uuid) -> DbResult<Option<Schedule>> {
        Ok(self.state.lock().await.schedules.get(&id).cloned())
    }

    async fn list_schedules(&self, profile_id: uuid::Uuid) -> DbResult<Vec<Schedule>> {
        let state = self.state.lock().await;
        let mut schedules: Vec<_> = state
            .schedules
            .values()
            .filter(|schedule| schedule.profile_id == profile_id)
            .cloned()
            .collect();
        schedules.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(schedules)
    }

    async fn list_active_schedules(&self) -> DbResult<Vec<Schedule>> {
        let state = self.state.lock().await;
        let mut schedules: Vec<_> = state
            .schedules
            .values()
            .filter(|schedule| schedule.is_active())
            .cloned()
            .collect();
        schedules.sort_by_key(|schedule| (schedule.created_at, schedule.id));
        Ok(schedules)
    }

    async fn schedule_name_taken(
        &self,
        profile_id: uuid::Uuid,
        name: &str,
        excluding: Option<uuid::Uuid>,
    ) -> DbResult<bool> {
        Ok(self
            .state
            .lock()
            .await
            .schedule_name_taken(profile_id, name, excluding))
    }

    async fn delete_schedule(&self, id: uuid::Uuid) -> DbResult<DeleteOutcome> {
        let mut state = self.state.lock().await;
        if !state.schedules.contains_key(&id) {
            return Ok(DeleteOutcome::Missing);
        }

        let generated: Vec<uuid::Uuid> = state
            .availabilities
            .values()
            .filter(|availability| availability.schedule_id == Some(id))
            .map(|availability| availability.id)
            .collect();
        if !state.remove_availabilities(&generated) {
            return Ok(DeleteOutcome::Blocked);
        }

        state.schedules.remove(&id);
        Ok(DeleteOutcome::Deleted)
    }
}

#[async_trait]
impl AvailabilityRepository for MemoryStore {
    async fn insert_availability(&self, availability: &Availability) -> DbResult<WriteOutcome> {
        let mut state = self.state.lock().await;
        let overlapping = state.availabilities.values().any(|existing| {
            existing.host_profile_id == availability.host_profile_id
                && existing.overlaps_with(availability.start_time, availability.end_time)
        });
        if overlapping {
            return Ok(WriteOutcome::Conflict);
        }
        state
            .availabilities
            .insert(availability.id, availability.clone());
        Ok(WriteOutcome::Applied)
    }

    async fn find_availability(&self, id: uuid::Uuid) -> DbResult<Option<Availability>> {
        Ok(self.state.lock().await.availabilities.get(&id).cloned())
    }

    async fn find_availability_by_slot(
        &self,
        slot_id: uuid::Uuid,
    ) -> DbResult<Option<Availability>> {
        let state = self.state.lock().await;
        Ok(state
            .availabilities
            .values()
            .find(|availability| availability.slot(slot_id).is_some())
            .cloned())
    }

    async fn list_availabilities(
        &self,
        host_profile_id: uuid::Uuid,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> DbResult<Vec<Availability>> {
        let state = self.state.lock().await;
        let mut availabilities: Vec<_> = state
            .availabilities
            .values()
            .filter(|availability| availability.host_profile_id == host_profile_id)
            .filter(|availability| from.is_none_or(|from| availability.end_time > from))
            .filter(|availability| to.is_none_or(|to| availability.start_time < to))
            .cloned()
            .collect();
        availabilities.sort_by_key(|availability| availability.start_time);
        Ok(availabilities)
    }

    async fn overlapping_windows(
        &self,
        host_profile_id: uuid::Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<(DateTime<Utc>, DateTime<Utc>)>> {
        let state = self.state.lock().await;
        Ok(state
            .availabilities
            .values()
            .filter(|availability| availability.host_profile_id == host_profile_id)
            .filter(|availability| {
                intervals_overlap(availability.start_time, availability.end_time, start, end)
            })
            .map(|availability| (availability.start_time, availability.end_time))
            .collect())
    }

    async fn list_open_slots(
        &self,
        host_profile_id: uuid::Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<OpenSlot>> {
        let state = self.state.lock().await;
        let mut open: Vec<OpenSlot> = state
            .availabilities
            .values()
            .filter(|availability| availability.host_profile_id == host_profile_id)
            .flat_map(|availability| {
                availability
                    .slots()
                    .iter()
                    .filter(|slot| {
                        slot.is_available() && slot.start_time >= from && slot.start_time <= to
                    })
                    .map(|slot| OpenSlot {
                        slot: slot.clone(),
                        policy: availability.policy,
                    })
            })
            .collect();
        open.sort_by_key(|open_slot| open_slot.slot.start_time);
        Ok(open)
    }

    async fn transition_slots(&self, transitions: &[SlotTransition]) -> DbResult<bool> {
        let mut state = self.state.lock().await;
        let all_current = transitions.iter().all(|transition| {
            state
                .slot(transition.slot_id)
                .is_some_and(|slot| slot.status() == transition.from)
        });
        if !all_current {
            return Ok(false);
        }

        for transition in transitions {
            if let Some(slot) = state.slot_mut(transition.slot_id) {
                set_status(slot, transition.to);
            }
        }
        Ok(true)
    }

    async fn delete_availability(&self, id: uuid::Uuid) -> DbResult<DeleteOutcome> {
        let mut state = self.state.lock().await;
        if !state.availabilities.contains_key(&id) {
            return Ok(DeleteOutcome::Missing);
        }
        if state.remove_availabilities(&[id]) {
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::Blocked)
        }
    }
}

#[async_trait]
impl AppointmentRepository for MemoryStore {
    async fn commit_booking(&self, appointment: &Appointment) -> DbResult<bool> {
        let mut state = self.state.lock().await;
        let slot_taken = state.appointments.values().any(|existing| {
            existing.time_slot_id == appointment.time_slot_id
                && existing.status() == AppointmentStatus::Scheduled
        });
        if slot_taken {
            return Ok(false);
        }

        match state.slot_mut(appointment.time_slot_id) {
            Some(slot) if slot.status() == SlotStatus::Available => {
                set_status(slot, SlotStatus::Booked);
            }
            _ => return Ok(false),
        }

        state
            .appointments
            .insert(appointment.id, appointment.clone());
        Ok(true)
    }

    async fn commit_cancellation(&self, appointment: &Appointment) -> DbResult<bool> {
        let mut state = self.state.lock().await;
        match state.appointments.get_mut(&appointment.id) {
            Some(stored) if stored.status() == AppointmentStatus::Scheduled => {
                *stored = appointment.clone();
            }
            _ => return Ok(false),
        }

        match state.slot_mut(appointment.time_slot_id) {
            Some(slot) if slot.status() == SlotStatus::Booked => {
                set_status(slot, SlotStatus::Available);
            }
            _ => {
                tracing::warn!(
                    slot_id = %appointment.time_slot_id,
                    "Canceled appointment's slot was not booked"
                );
            }
        }
        Ok(true)
    }

    async fn commit_completion(&self, appointment: &Appointment) -> DbResult<bool> {
        let mut state = self.state.lock().await;
        match state.appointments.get_mut(&appointment.id) {
            Some(stored) if stored.status() == AppointmentStatus::Scheduled => {
                *stored = appointment.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_appointment(&self, id: uuid::Uuid) -> DbResult<Option<Appointment>> {
        Ok(self.state.lock().await.appointments.get(&id).cloned())
    }

    async fn list_appointments(
        &self,
        profile_id: uuid::Uuid,
        status: Option<AppointmentStatus>,
    ) -> DbResult<Vec<Appointment>> {
        let state = self.state.lock().await;
        let mut appointments: Vec<_> = state
            .appointments
            .values()
            .filter(|appointment| appointment.is_participant(profile_id))
            .filter(|appointment| status.is_none_or(|status| appointment.status() == status))
            .cloned()
            .collect();
        appointments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(appointments)
    }
}
