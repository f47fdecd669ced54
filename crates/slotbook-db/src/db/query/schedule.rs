//! Query functions for recurring schedules.

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::db::query::text_match::exact_name_pattern;
use crate::db::schema::schedules;
use crate::model::ScheduleRow;

type BoxedQuery<'a> = schedules::BoxedQuery<'a, diesel::pg::Pg>;

/// ## Summary
/// Returns a query to select all schedules.
#[must_use]
pub fn all() -> BoxedQuery<'static> {
    schedules::table.into_boxed()
}

/// ## Summary
/// Returns a query to find a schedule by ID.
#[must_use]
pub fn by_id(id: uuid::Uuid) -> BoxedQuery<'static> {
    all().filter(schedules::id.eq(id))
}

/// ## Summary
/// Returns a query to find the schedules of a profile, by name.
#[must_use]
pub fn by_profile(profile_id: uuid::Uuid) -> BoxedQuery<'static> {
    all()
        .filter(schedules::profile_id.eq(profile_id))
        .order(schedules::name.asc())
}

/// ## Summary
/// Returns a query to find active schedules across all profiles.
#[must_use]
pub fn active() -> BoxedQuery<'static> {
    all()
        .filter(schedules::is_active.eq(true))
        .order(schedules::created_at.asc())
}

/// ## Summary
/// Returns a query to find a profile's schedules named `name`, ignoring case,
/// optionally excluding one schedule (the one being renamed).
#[must_use]
pub fn by_name(
    profile_id: uuid::Uuid,
    name: &str,
    excluding: Option<uuid::Uuid>,
) -> BoxedQuery<'static> {
    let query = all()
        .filter(schedules::profile_id.eq(profile_id))
        .filter(schedules::name.ilike(exact_name_pattern(name)));

    match excluding {
        Some(id) => query.filter(schedules::id.ne(id)),
        None => query,
    }
}

/// ## Summary
/// Inserts a schedule.
///
/// ## Errors
/// Returns a database error if the insert fails, including a unique violation
/// on the per-profile name index.
pub async fn insert(conn: &mut AsyncPgConnection, row: &ScheduleRow) -> QueryResult<usize> {
    diesel::insert_into(schedules::table)
        .values(row)
        .execute(conn)
        .await
}

/// ## Summary
/// Writes every mutable column of `row`.
///
/// ## Errors
/// Returns a database error if the update fails.
pub async fn update(conn: &mut AsyncPgConnection, row: &ScheduleRow) -> QueryResult<usize> {
    diesel::update(schedules::table.filter(schedules::id.eq(row.id)))
        .set(row.changeset())
        .execute(conn)
        .await
}

/// ## Summary
/// Retrieves a schedule by ID.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn find(conn: &mut AsyncPgConnection, id: uuid::Uuid) -> QueryResult<Option<ScheduleRow>> {
    by_id(id)
        .select(ScheduleRow::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Lists the schedules of a profile.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn list_by_profile(
    conn: &mut AsyncPgConnection,
    profile_id: uuid::Uuid,
) -> QueryResult<Vec<ScheduleRow>> {
    by_profile(profile_id)
        .select(ScheduleRow::as_select())
        .load(conn)
        .await
}

/// ## Summary
/// Lists every active schedule.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn list_active(conn: &mut AsyncPgConnection) -> QueryResult<Vec<ScheduleRow>> {
    active().select(ScheduleRow::as_select()).load(conn).await
}

/// ## Summary
/// Returns true if another schedule of the profile already uses `name`.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn name_taken(
    conn: &mut AsyncPgConnection,
    profile_id: uuid::Uuid,
    name: &str,
    excluding: Option<uuid::Uuid>,
) -> QueryResult<bool> {
    diesel::select(diesel::dsl::exists(
        by_name(profile_id, name, excluding).select(schedules::id),
    ))
    .get_result(conn)
    .await
}

/// ## Summary
/// Deletes a schedule row.
///
/// ## Errors
/// Returns a database error if the delete fails.
pub async fn delete(conn: &mut AsyncPgConnection, id: uuid::Uuid) -> QueryResult<usize> {
    diesel::delete(schedules::table.filter(schedules::id.eq(id)))
        .execute(conn)
        .await
}
