//! Query functions for availability windows.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::db::schema::availabilities;
use crate::model::AvailabilityRow;

type BoxedQuery<'a> = availabilities::BoxedQuery<'a, diesel::pg::Pg>;

/// ## Summary
/// Returns a query to select all availabilities.
#[must_use]
pub fn all() -> BoxedQuery<'static> {
    availabilities::table.into_boxed()
}

/// ## Summary
/// Returns a query to find an availability by ID.
#[must_use]
pub fn by_id(id: uuid::Uuid) -> BoxedQuery<'static> {
    all().filter(availabilities::id.eq(id))
}

/// ## Summary
/// Returns a query to find a host's availabilities that intersect the
/// optional bounds, ordered by start.
#[must_use]
pub fn by_host(
    host_profile_id: uuid::Uuid,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> BoxedQuery<'static> {
    let mut query = all()
        .filter(availabilities::host_profile_id.eq(host_profile_id))
        .order(availabilities::start_time.asc());

    if let Some(from) = from {
        query = query.filter(availabilities::end_time.gt(from));
    }
    if let Some(to) = to {
        query = query.filter(availabilities::start_time.lt(to));
    }

    query
}

/// ## Summary
/// Returns a query to find a host's availabilities overlapping `[start, end)`.
#[must_use]
pub fn overlapping(
    host_profile_id: uuid::Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> BoxedQuery<'static> {
    all()
        .filter(availabilities::host_profile_id.eq(host_profile_id))
        .filter(availabilities::start_time.lt(end))
        .filter(availabilities::end_time.gt(start))
}

/// ## Summary
/// Returns a query to find the availabilities generated from a schedule.
#[must_use]
pub fn by_schedule(schedule_id: uuid::Uuid) -> BoxedQuery<'static> {
    all().filter(availabilities::schedule_id.eq(schedule_id))
}

/// ## Summary
/// Inserts an availability row (without its slots).
///
/// ## Errors
/// Returns a database error if the insert fails, including violations of the
/// `availabilities_no_overlap` exclusion constraint.
pub async fn insert(conn: &mut AsyncPgConnection, row: &AvailabilityRow) -> QueryResult<usize> {
    diesel::insert_into(availabilities::table)
        .values(row)
        .execute(conn)
        .await
}

/// ## Summary
/// Retrieves an availability by ID.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn find(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
) -> QueryResult<Option<AvailabilityRow>> {
    by_id(id)
        .select(AvailabilityRow::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Lists a host's availabilities intersecting the optional bounds.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn list_by_host(
    conn: &mut AsyncPgConnection,
    host_profile_id: uuid::Uuid,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> QueryResult<Vec<AvailabilityRow>> {
    by_host(host_profile_id, from, to)
        .select(AvailabilityRow::as_select())
        .load(conn)
        .await
}

/// ## Summary
/// Returns the windows of a host's availabilities overlapping `[start, end)`.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn overlapping_windows(
    conn: &mut AsyncPgConnection,
    host_profile_id: uuid::Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> QueryResult<Vec<(DateTime<Utc>, DateTime<Utc>)>> {
    overlapping(host_profile_id, start, end)
        .select((availabilities::start_time, availabilities::end_time))
        .load(conn)
        .await
}

/// ## Summary
/// Returns the IDs of the availabilities generated from a schedule.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn ids_by_schedule(
    conn: &mut AsyncPgConnection,
    schedule_id: uuid::Uuid,
) -> QueryResult<Vec<uuid::Uuid>> {
    by_schedule(schedule_id)
        .select(availabilities::id)
        .load(conn)
        .await
}

/// ## Summary
/// Deletes availabilities. Their slots go with them through `ON DELETE CASCADE`.
///
/// ## Errors
/// Returns a database error if the delete fails.
pub async fn delete_many(conn: &mut AsyncPgConnection, ids: &[uuid::Uuid]) -> QueryResult<usize> {
    diesel::delete(availabilities::table.filter(availabilities::id.eq_any(ids)))
        .execute(conn)
        .await
}
