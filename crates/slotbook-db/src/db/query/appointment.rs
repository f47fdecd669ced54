//! Query functions for appointments.

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::db::enums::AppointmentStatus;
use crate::db::schema::{appointments, time_slots};
use crate::model::AppointmentRow;
use crate::model::appointment::AppointmentTransition;

type BoxedQuery<'a> = appointments::BoxedQuery<'a, diesel::pg::Pg>;

/// ## Summary
/// Returns a query to select all appointments.
#[must_use]
pub fn all() -> BoxedQuery<'static> {
    appointments::table.into_boxed()
}

/// ## Summary
/// Returns a query to find an appointment by ID.
#[must_use]
pub fn by_id(id: uuid::Uuid) -> BoxedQuery<'static> {
    all().filter(appointments::id.eq(id))
}

/// ## Summary
/// Returns a query to find appointments where the profile is host or guest,
/// newest first, optionally restricted to one status.
#[must_use]
pub fn by_participant(
    profile_id: uuid::Uuid,
    status: Option<AppointmentStatus>,
) -> BoxedQuery<'static> {
    let query = all()
        .filter(
            appointments::host_profile_id
                .eq(profile_id)
                .or(appointments::guest_profile_id.eq(profile_id)),
        )
        .order(appointments::created_at.desc());

    match status {
        Some(status) => query.filter(appointments::status.eq(status)),
        None => query,
    }
}

/// ## Summary
/// Inserts an appointment.
///
/// ## Errors
/// Returns a database error if the insert fails, including a unique violation
/// of `appointments_one_scheduled_per_slot`.
pub async fn insert(conn: &mut AsyncPgConnection, row: &AppointmentRow) -> QueryResult<usize> {
    diesel::insert_into(appointments::table)
        .values(row)
        .execute(conn)
        .await
}

/// ## Summary
/// Retrieves an appointment by ID.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn find(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
) -> QueryResult<Option<AppointmentRow>> {
    by_id(id)
        .select(AppointmentRow::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Lists the appointments a profile takes part in.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn list_by_participant(
    conn: &mut AsyncPgConnection,
    profile_id: uuid::Uuid,
    status: Option<AppointmentStatus>,
) -> QueryResult<Vec<AppointmentRow>> {
    by_participant(profile_id, status)
        .select(AppointmentRow::as_select())
        .load(conn)
        .await
}

/// ## Summary
/// Writes a terminal transition, only if the appointment is still scheduled.
///
/// Returns `1` when the transition won and `0` when the appointment was
/// missing or had already left `scheduled`.
///
/// ## Errors
/// Returns a database error if the update fails.
pub async fn leave_scheduled(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
    transition: &AppointmentTransition<'_>,
) -> QueryResult<usize> {
    diesel::update(
        appointments::table
            .filter(appointments::id.eq(id))
            .filter(appointments::status.eq(AppointmentStatus::Scheduled)),
    )
    .set(transition)
    .execute(conn)
    .await
}

/// ## Summary
/// Deletes the appointments attached to slots of the given availabilities.
///
/// ## Errors
/// Returns a database error if the delete fails.
pub async fn delete_for_availabilities(
    conn: &mut AsyncPgConnection,
    availability_ids: &[uuid::Uuid],
) -> QueryResult<usize> {
    let slot_ids = time_slots::table
        .filter(time_slots::availability_id.eq_any(availability_ids))
        .select(time_slots::id);

    diesel::delete(appointments::table.filter(appointments::time_slot_id.eq_any(slot_ids)))
        .execute(conn)
        .await
}
