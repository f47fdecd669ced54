#![allow(clippy::expect_used)]
//! One-off availability windows.

use chrono::{DateTime, Utc};

use slotbook_core::error::ErrorKind;
use slotbook_core::scheduling::{MAX_ADVANCE_BOOKING_DAYS, SchedulingProfile};
use slotbook_core::types::SlotStatus;
use slotbook_service::scheduling::{
    ListAvailabilitiesContext, ListAvailableSlotsContext, PolicyOverrides, SlotBatchContext,
};

use super::helpers::*;

#[test_log::test(tokio::test)]
async fn slots_tile_the_window() {
    let h = Harness::new();
    let host = h.individual("alice").await;

    let mut ctx = window_context(&host, at(4, 9, 0), at(4, 11, 45));
    ctx.slot_duration_minutes = 30;
    ctx.policy = PolicyOverrides {
        cancellation_deadline_minutes: Some(60),
        ..PolicyOverrides::default()
    };
    let window = h
        .service
        .create_availability(&user("alice"), &ctx)
        .await
        .expect("Failed to create availability");

    // Five 30 minute slots; the trailing 15 minutes stay unused.
    let slots = window.slots();
    assert_eq!(slots.len(), 5);
    assert_eq!(slots[0].start_time, at(4, 9, 0));
    assert_eq!(slots[4].end_time, at(4, 11, 30));
    assert!(slots.windows(2).all(|pair| pair[0].end_time == pair[1].start_time));
    assert!(slots.iter().all(|slot| slot.status() == SlotStatus::Available));
    assert_eq!(window.policy.cancellation_deadline_minutes, 60);
    assert_eq!(window.policy.min_advance_booking_minutes, 60);
}

/// ## Summary
/// Windows of one host never overlap; touching windows are fine.
#[test_log::test(tokio::test)]
async fn overlapping_windows_are_rejected() {
    let h = Harness::new();
    let host = h.individual("alice").await;
    h.window(&host, at(4, 9, 0), at(4, 12, 0)).await;

    assert_kind(
        h.service
            .create_availability(&user("alice"), &window_context(&host, at(4, 11, 0), at(4, 13, 0)))
            .await,
        ErrorKind::Conflict,
    );
    assert_kind(
        h.service
            .create_availability(&user("alice"), &window_context(&host, at(4, 8, 0), at(4, 13, 0)))
            .await,
        ErrorKind::Conflict,
    );

    h.window(&host, at(4, 12, 0), at(4, 13, 0)).await;

    // Another host may use the same hours.
    let other = h.individual("bob").await;
    h.window(&other, at(4, 9, 0), at(4, 12, 0)).await;
}

#[test_log::test(tokio::test)]
async fn malformed_windows_are_rejected() {
    let h = Harness::new();
    let host = h.individual("alice").await;

    assert_kind(
        h.service
            .create_availability(&user("alice"), &window_context(&host, at(4, 12, 0), at(4, 9, 0)))
            .await,
        ErrorKind::ValidationFailed,
    );

    let mut ctx = window_context(&host, at(4, 9, 0), at(4, 9, 30));
    ctx.slot_duration_minutes = 60;
    assert_kind(
        h.service.create_availability(&user("alice"), &ctx).await,
        ErrorKind::ValidationFailed,
    );
}

/// ## Summary
/// Booking horizons beyond ten years are refused up front, so the window
/// arithmetic in booking and slot search never runs on them.
#[test_log::test(tokio::test)]
async fn oversized_booking_horizons_are_rejected() {
    let h = Harness::new();
    let host = h.individual("alice").await;
    let oversized = PolicyOverrides {
        min_advance_booking_minutes: Some(0),
        max_advance_booking_days: Some(100_000_000),
        cancellation_deadline_minutes: Some(0),
    };

    let mut ctx = window_context(&host, at(4, 9, 0), at(4, 12, 0));
    ctx.policy = oversized;
    assert_kind(
        h.service.create_availability(&user("alice"), &ctx).await,
        ErrorKind::ValidationFailed,
    );

    let mut schedule = schedule_context("Mornings");
    schedule.policy = oversized;
    assert_kind(
        h.service
            .create_schedule(&user("alice"), host.id, &schedule)
            .await,
        ErrorKind::ValidationFailed,
    );

    ctx.policy.max_advance_booking_days = Some(MAX_ADVANCE_BOOKING_DAYS);
    h.service
        .create_availability(&user("alice"), &ctx)
        .await
        .expect("Failed to create availability at the horizon cap");
    let open = h
        .service
        .list_available_slots(ListAvailableSlotsContext {
            profile_id: host.id,
            from: at(4, 0, 0),
            to: at(5, 0, 0),
        })
        .await
        .expect("Failed to list available slots");
    assert_eq!(open.len(), 3);
}

#[test_log::test(tokio::test)]
async fn only_the_host_owner_manages_windows() {
    let h = Harness::new();
    let host = h.individual("alice").await;
    let window = h.window(&host, at(4, 9, 0), at(4, 12, 0)).await;

    assert_kind(
        h.service
            .create_availability(&user("bob"), &window_context(&host, at(5, 9, 0), at(5, 12, 0)))
            .await,
        ErrorKind::Forbidden,
    );
    assert_kind(
        h.service.get_availability(&user("bob"), window.id).await,
        ErrorKind::Forbidden,
    );
    assert_kind(
        h.service.delete_availability(&user("bob"), window.id).await,
        ErrorKind::Forbidden,
    );
}

async fn window_ids(
    h: &Harness,
    host: &SchedulingProfile,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Vec<uuid::Uuid> {
    h.service
        .list_availabilities(
            &user(&host.external_user_id),
            ListAvailabilitiesContext {
                profile_id: host.id,
                from,
                to,
            },
        )
        .await
        .expect("Failed to list availabilities")
        .into_iter()
        .map(|availability| availability.id)
        .collect()
}

#[test_log::test(tokio::test)]
async fn list_availabilities_filters_by_range() {
    let h = Harness::new();
    let host = h.individual("alice").await;
    let tuesday = h.window(&host, at(3, 9, 0), at(3, 12, 0)).await;
    let wednesday = h.window(&host, at(4, 9, 0), at(4, 12, 0)).await;
    let thursday = h.window(&host, at(5, 9, 0), at(5, 12, 0)).await;

    let all = window_ids(&h, &host, None, None).await;
    assert_eq!(all, vec![tuesday.id, wednesday.id, thursday.id]);

    let from_wednesday = window_ids(&h, &host, Some(at(4, 0, 0)), None).await;
    assert_eq!(from_wednesday, vec![wednesday.id, thursday.id]);

    let midweek = window_ids(&h, &host, Some(at(3, 11, 0)), Some(at(4, 10, 0))).await;
    assert_eq!(midweek, vec![tuesday.id, wednesday.id]);
}

/// ## Summary
/// Booked slots block deletion; blocked slots do not.
#[test_log::test(tokio::test)]
async fn delete_availability_requires_no_bookings() {
    let h = Harness::new();
    let host = h.individual("alice").await;
    let guest = h.individual("bob").await;
    let booked = h.window(&host, at(4, 9, 0), at(4, 12, 0)).await;
    let blocked = h.window(&host, at(5, 9, 0), at(5, 12, 0)).await;

    h.book(&host, &guest, booked.slots()[1].id)
        .await
        .expect("Failed to book");
    h.service
        .block_slots(
            &user("alice"),
            &SlotBatchContext {
                profile_id: host.id,
                slot_ids: vec![blocked.slots()[0].id],
            },
        )
        .await
        .expect("Failed to block");

    assert_kind(
        h.service.delete_availability(&user("alice"), booked.id).await,
        ErrorKind::InvalidState,
    );
    h.service
        .delete_availability(&user("alice"), blocked.id)
        .await
        .expect("Failed to delete availability");

    assert_kind(
        h.service.get_availability(&user("alice"), blocked.id).await,
        ErrorKind::NotFound,
    );
    let kept = h
        .service
        .get_availability(&user("alice"), booked.id)
        .await
        .expect("Booked window should remain");
    assert_eq!(kept.slots()[1].status(), SlotStatus::Booked);
}
