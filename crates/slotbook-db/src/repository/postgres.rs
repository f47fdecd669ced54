//! Postgres-backed store on the bb8 pool.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::result::DatabaseErrorKind;
use diesel_async::AsyncPgConnection;
use diesel_async::scoped_futures::ScopedFutureExt;

use slotbook_core::error::CoreError;
use slotbook_core::scheduling::{Appointment, Availability, Schedule, SchedulingProfile};
use slotbook_core::types::{AppointmentStatus, SlotStatus};

use crate::db::connection::DbPool;
use crate::db::enums;
use crate::db::query::{appointment, availability, profile, schedule, time_slot};
use crate::db::transaction::with_transaction;
use crate::db::DbProvider;
use crate::error::{DbError, DbResult};
use crate::model::appointment::AppointmentTransition;
use crate::model::{AppointmentRow, AvailabilityRow, ProfileRow, ScheduleRow, TimeSlotRow};
use crate::repository::{
    AppointmentRepository, AvailabilityRepository, DeleteOutcome, OpenSlot, ProfileRepository,
    ScheduleRepository, SlotTransition, WriteOutcome,
};

/// Name of the exclusion constraint keeping a host's availabilities disjoint.
pub const OVERLAP_CONSTRAINT: &str = "availabilities_no_overlap";

/// Store backed by a Postgres connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// ## Summary
/// True for errors raised when a concurrent writer won a guarded write:
/// unique violations, serialization failures and the overlap exclusion.
#[must_use]
pub fn is_write_conflict(err: &DbError) -> bool {
    match err {
        DbError::DatabaseError(diesel::result::Error::DatabaseError(kind, info)) => {
            matches!(
                kind,
                DatabaseErrorKind::UniqueViolation | DatabaseErrorKind::SerializationFailure
            ) || info.constraint_name() == Some(OVERLAP_CONSTRAINT)
        }
        _ => false,
    }
}

fn conflict_as<T>(result: DbResult<T>, on_conflict: T) -> DbResult<T> {
    match result {
        Err(err) if is_write_conflict(&err) => {
            tracing::debug!(error = %err, "Write lost to a concurrent writer");
            Ok(on_conflict)
        }
        other => other,
    }
}

/// Reassembles availabilities with their slots, preserving row order.
async fn assemble(
    conn: &mut AsyncPgConnection,
    rows: Vec<AvailabilityRow>,
) -> DbResult<Vec<Availability>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids = rows.iter().map(|row| row.id).collect();
    let mut slots_by_availability: HashMap<uuid::Uuid, Vec<TimeSlotRow>> = HashMap::new();
    for slot in time_slot::list_by_availabilities(conn, ids).await? {
        slots_by_availability
            .entry(slot.availability_id)
            .or_default()
            .push(slot);
    }

    rows.into_iter()
        .map(|row| {
            let slots = slots_by_availability.remove(&row.id).unwrap_or_default();
            row.into_domain(slots)
        })
        .collect()
}

async fn load_availability(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
) -> DbResult<Option<Availability>> {
    let Some(row) = availability::find(conn, id).await? else {
        return Ok(None);
    };
    Ok(assemble(conn, vec![row]).await?.pop())
}

/// Retires the unbooked slots of `ids` and removes the availabilities, their
/// slots and appointments. Fails with `AvailabilityHasBookings`, rolling the
/// caller's transaction back, if a slot is booked.
async fn remove_availabilities(conn: &mut AsyncPgConnection, ids: &[uuid::Uuid]) -> DbResult<()> {
    if ids.is_empty() {
        return Ok(());
    }

    time_slot::retire_unbooked(conn, ids).await?;
    if time_slot::any_booked(conn, ids).await? {
        return Err(CoreError::AvailabilityHasBookings.into());
    }

    let removed_appointments = appointment::delete_for_availabilities(conn, ids).await?;
    let removed = availability::delete_many(conn, ids).await?;
    tracing::debug!(removed, removed_appointments, "Availabilities removed");
    Ok(())
}

fn blocked_on_bookings(result: DbResult<DeleteOutcome>) -> DbResult<DeleteOutcome> {
    match result {
        Err(DbError::CoreError(CoreError::AvailabilityHasBookings)) => Ok(DeleteOutcome::Blocked),
        other => other,
    }
}

#[async_trait]
impl ProfileRepository for PgStore {
    #[tracing::instrument(skip(self, profile), fields(profile_id = %profile.id))]
    async fn insert_profile(&self, profile: &SchedulingProfile) -> DbResult<WriteOutcome> {
        let row = ProfileRow::from(profile);
        let mut conn = self.pool.get_connection().await?;
        let result = profile::insert(&mut conn, &row)
            .await
            .map(|_| WriteOutcome::Applied)
            .map_err(DbError::from);
        conflict_as(result, WriteOutcome::Conflict)
    }

    async fn find_profile(&self, id: uuid::Uuid) -> DbResult<Option<SchedulingProfile>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(profile::find(&mut conn, id).await?.map(Into::into))
    }

    async fn list_profiles_by_owner(
        &self,
        external_user_id: &str,
    ) -> DbResult<Vec<SchedulingProfile>> {
        let mut conn = self.pool.get_connection().await?;
        let rows = profile::list_by_owner(&mut conn, external_user_id).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn business_name_taken(&self, external_user_id: &str, name: &str) -> DbResult<bool> {
        let mut conn = self.pool.get_connection().await?;
        Ok(profile::business_name_taken(&mut conn, external_user_id, name).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_profile(&self, id: uuid::Uuid) -> DbResult<DeleteOutcome> {
        let mut conn = self.pool.get_connection().await?;
        with_transaction(&mut conn, |tx| {
            async move {
                if profile::has_scheduled_appointments(tx, id).await? {
                    return Ok(DeleteOutcome::Blocked);
                }
                match profile::delete(tx, id).await? {
                    0 => Ok(DeleteOutcome::Missing),
                    _ => Ok(DeleteOutcome::Deleted),
                }
            }
            .scope_boxed()
        })
        .await
    }
}

#[async_trait]
impl ScheduleRepository for PgStore {
    #[tracing::instrument(skip(self, schedule), fields(schedule_id = %schedule.id))]
    async fn insert_schedule(&self, schedule: &Schedule) -> DbResult<WriteOutcome> {
        let row = ScheduleRow::from(schedule);
        let mut conn = self.pool.get_connection().await?;
        let result = schedule::insert(&mut conn, &row)
            .await
            .map(|_| WriteOutcome::Applied)
            .map_err(DbError::from);
        conflict_as(result, WriteOutcome::Conflict)
    }

    #[tracing::instrument(skip(self, schedule), fields(schedule_id = %schedule.id))]
    async fn update_schedule(&self, schedule: &Schedule) -> DbResult<WriteOutcome> {
        let row = ScheduleRow::from(schedule);
        let mut conn = self.pool.get_connection().await?;
        let result = schedule::update(&mut conn, &row)
            .await
            .map(|_| WriteOutcome::Applied)
            .map_err(DbError::from);
        conflict_as(result, WriteOutcome::Conflict)
    }

    async fn find_schedule(&self, id: uuid::Uuid) -> DbResult<Option<Schedule>> {
        let mut conn = self.pool.get_connection().await?;
        schedule::find(&mut conn, id)
            .await?
            .map(Schedule::try_from)
            .transpose()
    }

    async fn list_schedules(&self, profile_id: uuid::Uuid) -> DbResult<Vec<Schedule>> {
        let mut conn = self.pool.get_connection().await?;
        schedule::list_by_profile(&mut conn, profile_id)
            .await?
            .into_iter()
            .map(Schedule::try_from)
            .collect()
    }

    async fn list_active_schedules(&self) -> DbResult<Vec<Schedule>> {
        let mut conn = self.pool.get_connection().await?;
        schedule::list_active(&mut conn)
            .await?
            .into_iter()
            .map(Schedule::try_from)
            .collect()
    }

    async fn schedule_name_taken(
        &self,
        profile_id: uuid::Uuid,
        name: &str,
        excluding: Option<uuid::Uuid>,
    ) -> DbResult<bool> {
        let mut conn = self.pool.get_connection().await?;
        Ok(schedule::name_taken(&mut conn, profile_id, name, excluding).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_schedule(&self, id: uuid::Uuid) -> DbResult<DeleteOutcome> {
        let mut conn = self.pool.get_connection().await?;
        let result = with_transaction(&mut conn, |tx| {
            async move {
                let generated = availability::ids_by_schedule(tx, id).await?;
                remove_availabilities(tx, &generated).await?;
                match schedule::delete(tx, id).await? {
                    0 => Ok(DeleteOutcome::Missing),
                    _ => Ok(DeleteOutcome::Deleted),
                }
            }
            .scope_boxed()
        })
        .await;
        blocked_on_bookings(result)
    }
}

#[async_trait]
impl AvailabilityRepository for PgStore {
    #[tracing::instrument(
        skip(self, availability),
        fields(availability_id = %availability.id, slot_count = availability.slots().len())
    )]
    async fn insert_availability(&self, availability: &Availability) -> DbResult<WriteOutcome> {
        let row = AvailabilityRow::from(availability);
        let slots: Vec<TimeSlotRow> = availability.slots().iter().map(Into::into).collect();
        let mut conn = self.pool.get_connection().await?;

        let result = with_transaction(&mut conn, |tx| {
            async move {
                let overlapping =
                    availability::overlapping_windows(tx, row.host_profile_id, row.start_time, row.end_time)
                        .await?;
                if !overlapping.is_empty() {
                    return Ok(WriteOutcome::Conflict);
                }
                availability::insert(tx, &row).await?;
                if !slots.is_empty() {
                    time_slot::insert_all(tx, &slots).await?;
                }
                Ok(WriteOutcome::Applied)
            }
            .scope_boxed()
        })
        .await;
        conflict_as(result, WriteOutcome::Conflict)
    }

    async fn find_availability(&self, id: uuid::Uuid) -> DbResult<Option<Availability>> {
        let mut conn = self.pool.get_connection().await?;
        load_availability(&mut conn, id).await
    }

    async fn find_availability_by_slot(
        &self,
        slot_id: uuid::Uuid,
    ) -> DbResult<Option<Availability>> {
        let mut conn = self.pool.get_connection().await?;
        match time_slot::availability_of(&mut conn, slot_id).await? {
            Some(availability_id) => load_availability(&mut conn, availability_id).await,
            None => Ok(None),
        }
    }

    async fn list_availabilities(
        &self,
        host_profile_id: uuid::Uuid,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> DbResult<Vec<Availability>> {
        let mut conn = self.pool.get_connection().await?;
        let rows = availability::list_by_host(&mut conn, host_profile_id, from, to).await?;
        assemble(&mut conn, rows).await
    }

    async fn overlapping_windows(
        &self,
        host_profile_id: uuid::Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<(DateTime<Utc>, DateTime<Utc>)>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(availability::overlapping_windows(&mut conn, host_profile_id, start, end).await?)
    }

    async fn list_open_slots(
        &self,
        host_profile_id: uuid::Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<OpenSlot>> {
        let mut conn = self.pool.get_connection().await?;
        let rows = time_slot::list_open_for_host(&mut conn, host_profile_id, from, to).await?;
        Ok(rows
            .into_iter()
            .map(|(slot, owner)| OpenSlot {
                slot: slot.into(),
                policy: slotbook_core::scheduling::BookingPolicy {
                    min_advance_booking_minutes: owner.min_advance_booking_minutes,
                    max_advance_booking_days: owner.max_advance_booking_days,
                    cancellation_deadline_minutes: owner.cancellation_deadline_minutes,
                },
            })
            .collect())
    }

    #[tracing::instrument(skip(self, transitions), fields(count = transitions.len()))]
    async fn transition_slots(&self, transitions: &[SlotTransition]) -> DbResult<bool> {
        let transitions = transitions.to_vec();
        let mut conn = self.pool.get_connection().await?;

        let result = with_transaction(&mut conn, |tx| {
            async move {
                for transition in &transitions {
                    let updated = time_slot::transition(
                        tx,
                        transition.slot_id,
                        transition.from.into(),
                        transition.to.into(),
                    )
                    .await?;
                    if updated == 0 {
                        return Err(CoreError::SlotStateChanged.into());
                    }
                }
                Ok(true)
            }
            .scope_boxed()
        })
        .await;

        match result {
            Err(DbError::CoreError(CoreError::SlotStateChanged)) => Ok(false),
            other => conflict_as(other, false),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn delete_availability(&self, id: uuid::Uuid) -> DbResult<DeleteOutcome> {
        let mut conn = self.pool.get_connection().await?;
        let result = with_transaction(&mut conn, |tx| {
            async move {
                if availability::find(tx, id).await?.is_none() {
                    return Ok(DeleteOutcome::Missing);
                }
                remove_availabilities(tx, &[id]).await?;
                Ok(DeleteOutcome::Deleted)
            }
            .scope_boxed()
        })
        .await;
        blocked_on_bookings(result)
    }
}

#[async_trait]
impl AppointmentRepository for PgStore {
    #[tracing::instrument(
        skip(self, appointment),
        fields(appointment_id = %appointment.id, slot_id = %appointment.time_slot_id)
    )]
    async fn commit_booking(&self, appointment: &Appointment) -> DbResult<bool> {
        let row = AppointmentRow::from(appointment);
        let mut conn = self.pool.get_connection().await?;

        let result = with_transaction(&mut conn, |tx| {
            async move {
                let won = time_slot::transition(
                    tx,
                    row.time_slot_id,
                    enums::SlotStatus::Available,
                    enums::SlotStatus::Booked,
                )
                .await?;
                if won == 0 {
                    return Ok(false);
                }
                appointment::insert(tx, &row).await?;
                Ok(true)
            }
            .scope_boxed()
        })
        .await;
        conflict_as(result, false)
    }

    #[tracing::instrument(skip(self, appointment), fields(appointment_id = %appointment.id))]
    async fn commit_cancellation(&self, appointment: &Appointment) -> DbResult<bool> {
        let id = appointment.id;
        let slot_id = appointment.time_slot_id;
        let transition = AppointmentTransition::from(appointment);
        let mut conn = self.pool.get_connection().await?;

        with_transaction(&mut conn, |tx| {
            async move {
                if appointment::leave_scheduled(tx, id, &transition).await? == 0 {
                    return Ok(false);
                }
                let released = time_slot::transition(
                    tx,
                    slot_id,
                    enums::SlotStatus::Booked,
                    enums::SlotStatus::Available,
                )
                .await?;
                if released == 0 {
                    tracing::warn!(%slot_id, "Canceled appointment's slot was not booked");
                }
                Ok(true)
            }
            .scope_boxed()
        })
        .await
    }

    #[tracing::instrument(skip(self, appointment), fields(appointment_id = %appointment.id))]
    async fn commit_completion(&self, appointment: &Appointment) -> DbResult<bool> {
        let transition = AppointmentTransition::from(appointment);
        let mut conn = self.pool.get_connection().await?;
        let updated = appointment::leave_scheduled(&mut conn, appointment.id, &transition).await?;
        Ok(updated == 1)
    }

    async fn find_appointment(&self, id: uuid::Uuid) -> DbResult<Option<Appointment>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(appointment::find(&mut conn, id).await?.map(Into::into))
    }

    async fn list_appointments(
        &self,
        profile_id: uuid::Uuid,
        status: Option<AppointmentStatus>,
    ) -> DbResult<Vec<Appointment>> {
        let mut conn = self.pool.get_connection().await?;
        let rows =
            appointment::list_by_participant(&mut conn, profile_id, status.map(Into::into)).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
