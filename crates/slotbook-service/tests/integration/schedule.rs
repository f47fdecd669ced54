#![allow(clippy::expect_used)]
//! Recurring schedules and their expansion into availabilities.

use chrono::{Days, NaiveDate, TimeDelta};

use slotbook_core::error::ErrorKind;
use slotbook_service::scheduling::{
    CancelAppointmentContext, ExtendSchedulesResult, GenerateAvailabilitiesContext,
    ListAvailabilitiesContext,
};

use super::helpers::*;

fn first_week(schedule_id: uuid::Uuid) -> GenerateAvailabilitiesContext {
    GenerateAvailabilitiesContext {
        schedule_id,
        from: date(3, 2),
        to: date(3, 8),
    }
}

/// ## Summary
/// Generating the same range twice creates nothing new the second time.
#[test_log::test(tokio::test)]
async fn generation_is_idempotent() {
    let h = Harness::new();
    let host = h.individual("alice").await;
    let schedule = h.weekday_schedule(&host, "Mornings").await;

    let first = h
        .service
        .generate_availabilities(&user("alice"), first_week(schedule.id))
        .await
        .expect("Failed to generate");
    assert_eq!(first.generated_count, 5);
    assert_eq!(first.skipped_count, 0);
    assert!(first.accepted.iter().all(|a| a.schedule_id == Some(schedule.id)));
    assert!(first.accepted.iter().all(|a| a.slots().len() == 3));

    let second = h
        .service
        .generate_availabilities(&user("alice"), first_week(schedule.id))
        .await
        .expect("Failed to generate");
    assert_eq!(second.generated_count, 0);
    assert_eq!(second.skipped_count, first.generated_count);
}

/// ## Summary
/// Days already covered by a one-off window are skipped, not failed.
#[test_log::test(tokio::test)]
async fn generation_skips_days_with_existing_windows() {
    let h = Harness::new();
    let host = h.individual("alice").await;
    let schedule = h.weekday_schedule(&host, "Mornings").await;
    let one_off = h.window(&host, at(3, 10, 0), at(3, 11, 0)).await;

    let outcome = h
        .service
        .generate_availabilities(&user("alice"), first_week(schedule.id))
        .await
        .expect("Failed to generate");
    assert_eq!(outcome.generated_count, 4);
    assert_eq!(outcome.skipped_count, 1);

    let windows = h
        .service
        .list_availabilities(
            &user("alice"),
            ListAvailabilitiesContext {
                profile_id: host.id,
                from: Some(at(3, 0, 0)),
                to: Some(at(4, 0, 0)),
            },
        )
        .await
        .expect("Failed to list availabilities");
    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0].id, one_off.id);
}

#[test_log::test(tokio::test)]
async fn generation_range_is_validated() {
    let h = Harness::new();
    let host = h.individual("alice").await;
    let schedule = h.weekday_schedule(&host, "Mornings").await;

    let inverted = GenerateAvailabilitiesContext {
        schedule_id: schedule.id,
        from: date(3, 8),
        to: date(3, 2),
    };
    assert_kind(
        h.service.generate_availabilities(&user("alice"), inverted).await,
        ErrorKind::ValidationFailed,
    );

    let too_long = GenerateAvailabilitiesContext {
        schedule_id: schedule.id,
        from: date(3, 2),
        to: date(3, 2) + TimeDelta::days(366),
    };
    assert_kind(
        h.service.generate_availabilities(&user("alice"), too_long).await,
        ErrorKind::ValidationFailed,
    );

    assert_kind(
        h.service
            .generate_availabilities(&user("bob"), first_week(schedule.id))
            .await,
        ErrorKind::Forbidden,
    );
}

/// ## Summary
/// A range ending on the last representable date is refused instead of
/// overflowing; the week before it still generates.
#[test_log::test(tokio::test)]
async fn generation_range_at_the_last_date_is_validated() {
    let h = Harness::new();
    let host = h.individual("alice").await;
    let schedule = h.weekday_schedule(&host, "Mornings").await;

    let at_the_end = GenerateAvailabilitiesContext {
        schedule_id: schedule.id,
        from: NaiveDate::MAX - Days::new(6),
        to: NaiveDate::MAX,
    };
    assert_kind(
        h.service.generate_availabilities(&user("alice"), at_the_end).await,
        ErrorKind::ValidationFailed,
    );

    let week_before = GenerateAvailabilitiesContext {
        schedule_id: schedule.id,
        from: NaiveDate::MAX - Days::new(7),
        to: NaiveDate::MAX - Days::new(1),
    };
    let outcome = h
        .service
        .generate_availabilities(&user("alice"), week_before)
        .await
        .expect("Failed to generate");
    assert_eq!(outcome.generated_count, 5);
}

#[test_log::test(tokio::test)]
async fn paused_schedules_generate_nothing() {
    let h = Harness::new();
    let host = h.individual("alice").await;
    let schedule = h.weekday_schedule(&host, "Mornings").await;

    let paused = h
        .service
        .pause_schedule(&user("alice"), schedule.id)
        .await
        .expect("Failed to pause");
    assert!(!paused.is_active());

    let outcome = h
        .service
        .generate_availabilities(&user("alice"), first_week(schedule.id))
        .await
        .expect("Failed to generate");
    assert_eq!((outcome.generated_count, outcome.skipped_count), (0, 0));

    h.service
        .resume_schedule(&user("alice"), schedule.id)
        .await
        .expect("Failed to resume");
    let outcome = h
        .service
        .generate_availabilities(&user("alice"), first_week(schedule.id))
        .await
        .expect("Failed to generate");
    assert_eq!(outcome.generated_count, 5);
}

/// ## Summary
/// Schedule names are unique per profile, ignoring case; a schedule may keep
/// its own name across updates.
#[test_log::test(tokio::test)]
async fn schedule_names_are_unique_per_profile() {
    let h = Harness::new();
    let host = h.individual("alice").await;
    let mornings = h.weekday_schedule(&host, "Mornings").await;
    h.weekday_schedule(&host, "Afternoons").await;

    assert_kind(
        h.service
            .create_schedule(&user("alice"), host.id, &schedule_context(" mornings "))
            .await,
        ErrorKind::Conflict,
    );
    assert_kind(
        h.service
            .update_schedule(&user("alice"), mornings.id, &schedule_context("AFTERNOONS"))
            .await,
        ErrorKind::Conflict,
    );

    let mut ctx = schedule_context("MORNINGS");
    ctx.slot_duration_minutes = 30;
    let updated = h
        .service
        .update_schedule(&user("alice"), mornings.id, &ctx)
        .await
        .expect("Failed to update");
    assert_eq!(updated.name, "MORNINGS");
    assert_eq!(updated.slot_duration_minutes, 30);

    // Another profile may reuse the name.
    let other = h.individual("bob").await;
    h.weekday_schedule(&other, "Mornings").await;

    let names: Vec<_> = h
        .service
        .list_schedules(&user("alice"), host.id)
        .await
        .expect("Failed to list schedules")
        .into_iter()
        .map(|schedule| schedule.name)
        .collect();
    assert_eq!(names.len(), 2);
}

#[test_log::test(tokio::test)]
async fn malformed_schedules_are_rejected() {
    let h = Harness::new();
    let host = h.individual("alice").await;

    let mut ctx = schedule_context("Backwards");
    ctx.end_time_of_day = time(8);
    assert_kind(
        h.service.create_schedule(&user("alice"), host.id, &ctx).await,
        ErrorKind::ValidationFailed,
    );

    let mut ctx = schedule_context("No days");
    ctx.days_of_week.clear();
    assert_kind(
        h.service.create_schedule(&user("alice"), host.id, &ctx).await,
        ErrorKind::ValidationFailed,
    );
}

/// ## Summary
/// A schedule whose generated windows hold a booking cannot be deleted; once
/// the booking is canceled the schedule and its windows are removed.
#[test_log::test(tokio::test)]
async fn delete_schedule_respects_bookings() {
    let h = Harness::new();
    let host = h.individual("alice").await;
    let guest = h.individual("bob").await;
    let schedule = h.weekday_schedule(&host, "Mornings").await;
    h.service
        .generate_availabilities(&user("alice"), first_week(schedule.id))
        .await
        .expect("Failed to generate");

    let wednesday = h
        .service
        .list_availabilities(
            &user("alice"),
            ListAvailabilitiesContext {
                profile_id: host.id,
                from: Some(at(4, 0, 0)),
                to: Some(at(5, 0, 0)),
            },
        )
        .await
        .expect("Failed to list availabilities");
    let appointment = h
        .book(&host, &guest, wednesday[0].slots()[0].id)
        .await
        .expect("Failed to book");

    assert_kind(
        h.service.delete_schedule(&user("alice"), schedule.id).await,
        ErrorKind::InvalidState,
    );

    h.service
        .cancel_appointment(
            &user("alice"),
            &CancelAppointmentContext {
                appointment_id: appointment.id,
                reason: Some("Closed that day".to_string()),
            },
        )
        .await
        .expect("Failed to cancel");
    h.service
        .delete_schedule(&user("alice"), schedule.id)
        .await
        .expect("Failed to delete schedule");

    let remaining = h
        .service
        .list_availabilities(
            &user("alice"),
            ListAvailabilitiesContext {
                profile_id: host.id,
                from: None,
                to: None,
            },
        )
        .await
        .expect("Failed to list availabilities");
    assert!(remaining.is_empty());
    assert_kind(
        h.service.delete_schedule(&user("alice"), schedule.id).await,
        ErrorKind::NotFound,
    );
}

/// ## Summary
/// The maintenance pass extends active schedules over the horizon and is
/// safe to repeat.
#[test_log::test(tokio::test)]
async fn extend_active_schedules_covers_the_horizon() {
    let h = Harness::new();
    let alice = h.individual("alice").await;
    let carol = h.individual("carol").await;
    h.weekday_schedule(&alice, "Mornings").await;
    let paused = h.weekday_schedule(&carol, "Mornings").await;
    h.service
        .pause_schedule(&user("carol"), paused.id)
        .await
        .expect("Failed to pause");

    // 2026-03-02 through 2026-03-30 holds 21 weekdays.
    let first = h
        .service
        .extend_active_schedules()
        .await
        .expect("Failed to extend");
    assert_eq!(
        first,
        ExtendSchedulesResult {
            schedules: 1,
            failed: 0,
            generated_count: 21,
            skipped_count: 0,
        }
    );

    let second = h
        .service
        .extend_active_schedules()
        .await
        .expect("Failed to extend");
    assert_eq!(second.generated_count, 0);
    assert_eq!(second.skipped_count, 21);
}
