#![allow(clippy::expect_used)]
//! Booking, cancellation and completion.

use std::sync::Arc;

use chrono::TimeDelta;

use slotbook_core::error::{CoreError, ErrorKind};
use slotbook_core::types::{AppointmentStatus, SlotStatus};
use slotbook_service::error::ServiceError;
use slotbook_service::scheduling::{BookAppointmentContext, CancelAppointmentContext};

use super::helpers::*;

fn cancel(appointment_id: uuid::Uuid, reason: Option<&str>) -> CancelAppointmentContext {
    CancelAppointmentContext {
        appointment_id,
        reason: reason.map(str::to_string),
    }
}

/// ## Summary
/// Of many concurrent bookings for one slot exactly one wins; every other
/// caller sees the slot as booked.
#[test_log::test(tokio::test)]
async fn concurrent_bookings_have_one_winner() {
    let h = Harness::new();
    let host = h.individual("alice").await;
    let window = h.window(&host, at(4, 9, 0), at(4, 12, 0)).await;
    let slot_id = window.slots()[0].id;

    let mut guests = Vec::new();
    for n in 0..8 {
        guests.push(h.individual(&format!("guest-{n}")).await);
    }

    let attempts = guests.into_iter().map(|guest| {
        let service = Arc::clone(&h.service);
        let ctx = BookAppointmentContext {
            host_profile_id: host.id,
            guest_profile_id: guest.id,
            slot_id,
            notes: None,
        };
        async move {
            service
                .book_appointment(&user(&guest.external_user_id), &ctx)
                .await
        }
    });
    let results = futures::future::join_all(attempts).await;

    assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
    for err in results.into_iter().filter_map(Result::err) {
        assert!(
            matches!(
                err,
                ServiceError::CoreError(CoreError::SlotNotAvailable(SlotStatus::Booked))
            ),
            "unexpected error: {err}"
        );
    }

    let scheduled = h
        .service
        .list_appointments(&user("alice"), host.id, Some(AppointmentStatus::Scheduled))
        .await
        .expect("Failed to list appointments");
    assert_eq!(scheduled.len(), 1);
}

#[test_log::test(tokio::test)]
async fn booking_records_participants_and_notes() {
    let h = Harness::new();
    let host = h.individual("alice").await;
    let guest = h.individual("bob").await;
    let window = h.window(&host, at(4, 9, 0), at(4, 12, 0)).await;
    let slot_id = window.slots()[2].id;

    let appointment = h
        .service
        .book_appointment(
            &user("bob"),
            &BookAppointmentContext {
                host_profile_id: host.id,
                guest_profile_id: guest.id,
                slot_id,
                notes: Some("  First visit ".to_string()),
            },
        )
        .await
        .expect("Failed to book");

    assert_eq!(appointment.status(), AppointmentStatus::Scheduled);
    assert_eq!(appointment.time_slot_id, slot_id);
    assert!(appointment.is_host(host.id));
    assert!(appointment.is_guest(guest.id));
    assert_eq!(appointment.notes.as_deref(), Some("First visit"));
    assert_eq!(appointment.created_at, at(2, 8, 0));

    let stored = h
        .service
        .get_availability(&user("alice"), window.id)
        .await
        .expect("Failed to load availability");
    assert_eq!(stored.slot(slot_id).map(|slot| slot.status()), Some(SlotStatus::Booked));
}

#[test_log::test(tokio::test)]
async fn booking_rules_are_enforced() {
    let h = Harness::new();
    let host = h.individual("alice").await;
    let guest = h.individual("bob").await;
    let soon = h.window(&host, at(2, 8, 30), at(2, 9, 30)).await;
    let far = h
        .window(
            &host,
            at(2, 9, 0) + TimeDelta::days(120),
            at(2, 10, 0) + TimeDelta::days(120),
        )
        .await;
    let wednesday = h.window(&host, at(4, 9, 0), at(4, 12, 0)).await;

    assert_kind(
        h.book(&host, &guest, soon.slots()[0].id).await,
        ErrorKind::ValidationFailed,
    );
    assert_kind(
        h.book(&host, &guest, far.slots()[0].id).await,
        ErrorKind::ValidationFailed,
    );

    // The host's own business profile cannot book the host.
    let own_business = h.business("alice", "Alice Consulting").await;
    let err = h
        .book(&host, &own_business, wednesday.slots()[0].id)
        .await
        .expect_err("Self booking must fail");
    assert!(matches!(
        err,
        ServiceError::CoreError(CoreError::SelfBookingNotAllowed)
    ));
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    // Booking for someone else's guest profile.
    let carol = h.individual("carol").await;
    assert_kind(
        h.service
            .book_appointment(
                &user("bob"),
                &BookAppointmentContext {
                    host_profile_id: host.id,
                    guest_profile_id: carol.id,
                    slot_id: wednesday.slots()[0].id,
                    notes: None,
                },
            )
            .await,
        ErrorKind::Forbidden,
    );

    // The slot must belong to the named host.
    assert_kind(
        h.book(&carol, &guest, wednesday.slots()[0].id).await,
        ErrorKind::NotFound,
    );
    assert_kind(
        h.book(&host, &guest, uuid::Uuid::now_v7()).await,
        ErrorKind::NotFound,
    );
}

/// ## Summary
/// Canceling returns the slot to the pool so another guest can book it.
#[test_log::test(tokio::test)]
async fn cancel_releases_the_slot_for_rebooking() {
    let h = Harness::new();
    let host = h.individual("alice").await;
    let bob = h.individual("bob").await;
    let carol = h.individual("carol").await;
    let window = h.window(&host, at(4, 9, 0), at(4, 12, 0)).await;
    let slot_id = window.slots()[0].id;

    let first = h.book(&host, &bob, slot_id).await.expect("Failed to book");
    assert_kind(h.book(&host, &carol, slot_id).await, ErrorKind::InvalidState);

    let canceled = h
        .service
        .cancel_appointment(&user("bob"), &cancel(first.id, Some(" running late ")))
        .await
        .expect("Failed to cancel");
    assert_eq!(canceled.status(), AppointmentStatus::Canceled);
    assert_eq!(canceled.canceled_by(), Some("bob"));
    assert_eq!(canceled.cancellation_reason(), Some("running late"));
    assert_eq!(canceled.canceled_at(), Some(at(2, 8, 0)));

    let available = h
        .service
        .get_availability(&user("alice"), window.id)
        .await
        .expect("Failed to load availability");
    assert_eq!(
        available.slot(slot_id).map(|slot| slot.status()),
        Some(SlotStatus::Available)
    );

    h.book(&host, &carol, slot_id)
        .await
        .expect("Rebooking a released slot should succeed");

    let canceled_list = h
        .service
        .list_appointments(&user("alice"), host.id, Some(AppointmentStatus::Canceled))
        .await
        .expect("Failed to list appointments");
    assert_eq!(canceled_list.len(), 1);
    assert_eq!(canceled_list[0].id, first.id);

    let all = h
        .service
        .list_appointments(&user("alice"), host.id, None)
        .await
        .expect("Failed to list appointments");
    assert_eq!(all.len(), 2);
}

#[test_log::test(tokio::test)]
async fn cancellation_deadline_and_terminal_states() {
    let h = Harness::new();
    let host = h.individual("alice").await;
    let guest = h.individual("bob").await;
    let window = h.window(&host, at(4, 9, 0), at(4, 12, 0)).await;

    let late = h
        .book(&host, &guest, window.slots()[0].id)
        .await
        .expect("Failed to book");
    let early = h
        .book(&host, &guest, window.slots()[1].id)
        .await
        .expect("Failed to book");

    h.service
        .cancel_appointment(&user("alice"), &cancel(early.id, None))
        .await
        .expect("Host may cancel");
    let err = h
        .service
        .cancel_appointment(&user("bob"), &cancel(early.id, None))
        .await
        .expect_err("Canceling twice must fail");
    assert!(matches!(err, ServiceError::CoreError(CoreError::AlreadyCanceled)));
    assert_kind(
        h.service.complete_appointment(&user("alice"), early.id).await,
        ErrorKind::InvalidState,
    );

    // Less than 24 hours before the 09:00 slot.
    h.clock.set(at(3, 10, 0));
    let err = h
        .service
        .cancel_appointment(&user("bob"), &cancel(late.id, None))
        .await
        .expect_err("Deadline has passed");
    assert!(matches!(
        err,
        ServiceError::CoreError(CoreError::CancellationDeadlinePassed)
    ));
}

/// ## Summary
/// Only the host completes an appointment; the slot stays booked afterwards.
#[test_log::test(tokio::test)]
async fn host_completes_appointments() {
    let h = Harness::new();
    let host = h.individual("alice").await;
    let guest = h.individual("bob").await;
    let window = h.window(&host, at(4, 9, 0), at(4, 12, 0)).await;
    let slot_id = window.slots()[0].id;
    let appointment = h.book(&host, &guest, slot_id).await.expect("Failed to book");

    assert_kind(
        h.service.complete_appointment(&user("bob"), appointment.id).await,
        ErrorKind::Forbidden,
    );

    h.clock.set(at(4, 10, 0));
    let completed = h
        .service
        .complete_appointment(&user("alice"), appointment.id)
        .await
        .expect("Failed to complete");
    assert_eq!(completed.status(), AppointmentStatus::Completed);
    assert_eq!(completed.completed_at(), Some(at(4, 10, 0)));

    let err = h
        .service
        .cancel_appointment(&user("bob"), &cancel(appointment.id, None))
        .await
        .expect_err("Completed appointments cannot be canceled");
    assert!(matches!(err, ServiceError::CoreError(CoreError::AlreadyCompleted)));

    let stored = h
        .service
        .get_availability(&user("alice"), window.id)
        .await
        .expect("Failed to load availability");
    assert_eq!(stored.slot(slot_id).map(|slot| slot.status()), Some(SlotStatus::Booked));
}

#[test_log::test(tokio::test)]
async fn appointments_are_visible_to_participants_only() {
    let h = Harness::new();
    let host = h.individual("alice").await;
    let guest = h.individual("bob").await;
    h.individual("mallory").await;
    let window = h.window(&host, at(4, 9, 0), at(4, 12, 0)).await;
    let appointment = h
        .book(&host, &guest, window.slots()[0].id)
        .await
        .expect("Failed to book");

    for caller in ["alice", "bob"] {
        let seen = h
            .service
            .get_appointment(&user(caller), appointment.id)
            .await
            .expect("Participant should see appointment");
        assert_eq!(seen.id, appointment.id);
    }

    assert_kind(
        h.service.get_appointment(&user("mallory"), appointment.id).await,
        ErrorKind::Forbidden,
    );
    assert_kind(
        h.service
            .cancel_appointment(&user("mallory"), &cancel(appointment.id, None))
            .await,
        ErrorKind::Forbidden,
    );
    assert_kind(
        h.service.list_appointments(&user("mallory"), guest.id, None).await,
        ErrorKind::Forbidden,
    );
    assert_kind(
        h.service
            .get_appointment(&user("alice"), uuid::Uuid::now_v7())
            .await,
        ErrorKind::NotFound,
    );
}
