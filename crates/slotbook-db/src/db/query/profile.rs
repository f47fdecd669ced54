//! Query functions for scheduling profiles.

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::db::enums::{AppointmentStatus, ProfileType};
use crate::db::query::text_match::exact_name_pattern;
use crate::db::schema::{appointments, profiles};
use crate::model::ProfileRow;

type BoxedQuery<'a> = profiles::BoxedQuery<'a, diesel::pg::Pg>;

/// ## Summary
/// Returns a query to select all profiles.
#[must_use]
pub fn all() -> BoxedQuery<'static> {
    profiles::table.into_boxed()
}

/// ## Summary
/// Returns a query to find a profile by ID.
#[must_use]
pub fn by_id(id: uuid::Uuid) -> BoxedQuery<'static> {
    all().filter(profiles::id.eq(id))
}

/// ## Summary
/// Returns a query to find the profiles of one external user, oldest first.
#[must_use]
pub fn by_owner(external_user_id: &str) -> BoxedQuery<'_> {
    all()
        .filter(profiles::external_user_id.eq(external_user_id))
        .order(profiles::created_at.asc())
}

/// ## Summary
/// Returns a query to find a user's business profile by name, ignoring case.
#[must_use]
pub fn business_by_name(external_user_id: &str, business_name: &str) -> BoxedQuery<'static> {
    all()
        .filter(profiles::external_user_id.eq(external_user_id.to_string()))
        .filter(profiles::profile_type.eq(ProfileType::Business))
        .filter(profiles::business_name.ilike(exact_name_pattern(business_name)))
}

/// ## Summary
/// Inserts a profile.
///
/// ## Errors
/// Returns a database error if the insert fails, including unique violations
/// on the per-user constraints.
pub async fn insert(conn: &mut AsyncPgConnection, row: &ProfileRow) -> QueryResult<usize> {
    diesel::insert_into(profiles::table)
        .values(row)
        .execute(conn)
        .await
}

/// ## Summary
/// Retrieves a profile by ID.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn find(conn: &mut AsyncPgConnection, id: uuid::Uuid) -> QueryResult<Option<ProfileRow>> {
    by_id(id)
        .select(ProfileRow::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Lists the profiles of one external user.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn list_by_owner(
    conn: &mut AsyncPgConnection,
    external_user_id: &str,
) -> QueryResult<Vec<ProfileRow>> {
    by_owner(external_user_id)
        .select(ProfileRow::as_select())
        .load(conn)
        .await
}

/// ## Summary
/// Returns true if the user already has a business profile named `business_name`.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn business_name_taken(
    conn: &mut AsyncPgConnection,
    external_user_id: &str,
    business_name: &str,
) -> QueryResult<bool> {
    diesel::select(diesel::dsl::exists(
        business_by_name(external_user_id, business_name).select(profiles::id),
    ))
    .get_result(conn)
    .await
}

/// ## Summary
/// Returns true if the profile takes part in a scheduled appointment, as host
/// or as guest.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn has_scheduled_appointments(
    conn: &mut AsyncPgConnection,
    profile_id: uuid::Uuid,
) -> QueryResult<bool> {
    diesel::select(diesel::dsl::exists(
        appointments::table
            .filter(appointments::status.eq(AppointmentStatus::Scheduled))
            .filter(
                appointments::host_profile_id
                    .eq(profile_id)
                    .or(appointments::guest_profile_id.eq(profile_id)),
            ),
    ))
    .get_result(conn)
    .await
}

/// ## Summary
/// Deletes a profile. Owned rows go with it through `ON DELETE CASCADE`.
///
/// ## Errors
/// Returns a database error if the delete fails.
pub async fn delete(conn: &mut AsyncPgConnection, id: uuid::Uuid) -> QueryResult<usize> {
    diesel::delete(profiles::table.filter(profiles::id.eq(id)))
        .execute(conn)
        .await
}
