//! Query functions for time slots, including the conditional status updates
//! that gate booking.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::db::enums::SlotStatus;
use crate::db::schema::{availabilities, time_slots};
use crate::model::{AvailabilityRow, TimeSlotRow};

type BoxedQuery<'a> = time_slots::BoxedQuery<'a, diesel::pg::Pg>;

/// ## Summary
/// Returns a query to select all time slots.
#[must_use]
pub fn all() -> BoxedQuery<'static> {
    time_slots::table.into_boxed()
}

/// ## Summary
/// Returns a query to find a slot by ID.
#[must_use]
pub fn by_id(id: uuid::Uuid) -> BoxedQuery<'static> {
    all().filter(time_slots::id.eq(id))
}

/// ## Summary
/// Returns a query to find the slots of the given availabilities, in order.
#[must_use]
pub fn by_availabilities(availability_ids: Vec<uuid::Uuid>) -> BoxedQuery<'static> {
    all()
        .filter(time_slots::availability_id.eq_any(availability_ids))
        .order((time_slots::availability_id, time_slots::start_time.asc()))
}

/// ## Summary
/// Returns a query to find a host's available slots starting in `[from, to]`,
/// joined with their availability.
#[must_use]
pub fn open_for_host(
    host_profile_id: uuid::Uuid,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> diesel::helper_types::IntoBoxed<
    'static,
    diesel::helper_types::InnerJoin<time_slots::table, availabilities::table>,
    diesel::pg::Pg,
> {
    time_slots::table
        .inner_join(availabilities::table)
        .into_boxed()
        .filter(availabilities::host_profile_id.eq(host_profile_id))
        .filter(time_slots::status.eq(SlotStatus::Available))
        .filter(time_slots::start_time.ge(from))
        .filter(time_slots::start_time.le(to))
        .order(time_slots::start_time.asc())
}

/// ## Summary
/// Inserts slot rows.
///
/// ## Errors
/// Returns a database error if the insert fails.
pub async fn insert_all(conn: &mut AsyncPgConnection, rows: &[TimeSlotRow]) -> QueryResult<usize> {
    diesel::insert_into(time_slots::table)
        .values(rows)
        .execute(conn)
        .await
}

/// ## Summary
/// Loads the slots of the given availabilities.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn list_by_availabilities(
    conn: &mut AsyncPgConnection,
    availability_ids: Vec<uuid::Uuid>,
) -> QueryResult<Vec<TimeSlotRow>> {
    by_availabilities(availability_ids)
        .select(TimeSlotRow::as_select())
        .load(conn)
        .await
}

/// ## Summary
/// Returns the ID of the availability owning `slot_id`.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn availability_of(
    conn: &mut AsyncPgConnection,
    slot_id: uuid::Uuid,
) -> QueryResult<Option<uuid::Uuid>> {
    by_id(slot_id)
        .select(time_slots::availability_id)
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Loads a host's open slots in `[from, to]` with their availability.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn list_open_for_host(
    conn: &mut AsyncPgConnection,
    host_profile_id: uuid::Uuid,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> QueryResult<Vec<(TimeSlotRow, AvailabilityRow)>> {
    open_for_host(host_profile_id, from, to)
        .select((TimeSlotRow::as_select(), AvailabilityRow::as_select()))
        .load(conn)
        .await
}

/// ## Summary
/// Moves a slot from `from` to `to` only if it is still in `from`.
///
/// Returns the number of updated rows: `1` when the transition won, `0` when
/// the slot was missing or had already changed.
///
/// ## Errors
/// Returns a database error if the update fails.
#[tracing::instrument(skip(conn))]
pub async fn transition(
    conn: &mut AsyncPgConnection,
    slot_id: uuid::Uuid,
    from: SlotStatus,
    to: SlotStatus,
) -> QueryResult<usize> {
    diesel::update(
        time_slots::table
            .filter(time_slots::id.eq(slot_id))
            .filter(time_slots::status.eq(from)),
    )
    .set(time_slots::status.eq(to))
    .execute(conn)
    .await
}

/// ## Summary
/// Returns true if any slot of the given availabilities is booked.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn any_booked(
    conn: &mut AsyncPgConnection,
    availability_ids: &[uuid::Uuid],
) -> QueryResult<bool> {
    diesel::select(diesel::dsl::exists(
        time_slots::table
            .filter(time_slots::availability_id.eq_any(availability_ids))
            .filter(time_slots::status.eq(SlotStatus::Booked)),
    ))
    .get_result(conn)
    .await
}

/// ## Summary
/// Cancels every slot of the given availabilities that is not booked.
///
/// Booked slots are left alone so the caller can detect them afterwards and
/// roll back; the row locks taken here make concurrent bookings of the
/// canceled slots fail their conditional update.
///
/// ## Errors
/// Returns a database error if the update fails.
pub async fn retire_unbooked(
    conn: &mut AsyncPgConnection,
    availability_ids: &[uuid::Uuid],
) -> QueryResult<usize> {
    diesel::update(
        time_slots::table
            .filter(time_slots::availability_id.eq_any(availability_ids))
            .filter(time_slots::status.ne(SlotStatus::Booked)),
    )
    .set(time_slots::status.eq(SlotStatus::Canceled))
    .execute(conn)
    .await
}
