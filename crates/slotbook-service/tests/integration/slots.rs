#![allow(clippy::expect_used)]
//! Public slot search and host-side blocking.

use chrono::TimeDelta;

use slotbook_core::error::{CoreError, ErrorKind};
use slotbook_core::types::SlotStatus;
use slotbook_service::error::ServiceError;
use slotbook_service::scheduling::{ListAvailableSlotsContext, SlotBatchContext};

use super::helpers::*;

fn batch(profile_id: uuid::Uuid, slot_ids: &[uuid::Uuid]) -> SlotBatchContext {
    SlotBatchContext {
        profile_id,
        slot_ids: slot_ids.to_vec(),
    }
}

/// ## Summary
/// Only available slots inside the booking window are offered.
#[test_log::test(tokio::test)]
async fn available_slots_respect_status_and_booking_window() {
    let h = Harness::new();
    let host = h.individual("alice").await;
    let guest = h.individual("bob").await;

    // 08:30 starts within the 60 minute lead time.
    h.window(&host, at(2, 8, 30), at(2, 9, 30)).await;
    let wednesday = h.window(&host, at(4, 9, 0), at(4, 12, 0)).await;
    // Beyond the 90 day horizon.
    h.window(
        &host,
        at(2, 9, 0) + TimeDelta::days(120),
        at(2, 10, 0) + TimeDelta::days(120),
    )
    .await;

    let slots = wednesday.slots();
    h.service
        .block_slots(&user("alice"), &batch(host.id, &[slots[0].id]))
        .await
        .expect("Failed to block");
    h.book(&host, &guest, slots[1].id)
        .await
        .expect("Failed to book");

    let open = h
        .service
        .list_available_slots(ListAvailableSlotsContext {
            profile_id: host.id,
            from: at(1, 0, 0),
            to: at(1, 0, 0) + TimeDelta::days(200),
        })
        .await
        .expect("Failed to list slots");
    let ids: Vec<_> = open.iter().map(|slot| slot.id).collect();
    assert_eq!(ids, vec![slots[2].id]);

    // A day later Monday's early slot has started.
    h.clock.advance(TimeDelta::days(1));
    let open = h
        .service
        .list_available_slots(ListAvailableSlotsContext {
            profile_id: host.id,
            from: at(2, 0, 0),
            to: at(3, 0, 0),
        })
        .await
        .expect("Failed to list slots");
    assert!(open.is_empty());
}

#[test_log::test(tokio::test)]
async fn available_slot_search_validates_input() {
    let h = Harness::new();
    let host = h.individual("alice").await;

    assert_kind(
        h.service
            .list_available_slots(ListAvailableSlotsContext {
                profile_id: uuid::Uuid::now_v7(),
                from: at(2, 0, 0),
                to: at(9, 0, 0),
            })
            .await,
        ErrorKind::NotFound,
    );
    assert_kind(
        h.service
            .list_available_slots(ListAvailableSlotsContext {
                profile_id: host.id,
                from: at(9, 0, 0),
                to: at(2, 0, 0),
            })
            .await,
        ErrorKind::ValidationFailed,
    );
}

/// ## Summary
/// A batch with one illegal transition changes nothing.
#[test_log::test(tokio::test)]
async fn block_slots_is_all_or_nothing() {
    let h = Harness::new();
    let host = h.individual("alice").await;
    let guest = h.individual("bob").await;
    let window = h.window(&host, at(4, 9, 0), at(4, 12, 0)).await;
    let slots = window.slots();
    h.book(&host, &guest, slots[1].id)
        .await
        .expect("Failed to book");

    let err = h
        .service
        .block_slots(&user("alice"), &batch(host.id, &[slots[0].id, slots[1].id]))
        .await
        .expect_err("Blocking a booked slot must fail");
    assert!(matches!(
        err,
        ServiceError::CoreError(CoreError::CannotBlockBooked)
    ));

    let stored = h
        .service
        .get_availability(&user("alice"), window.id)
        .await
        .expect("Failed to load availability");
    assert_eq!(stored.slots()[0].status(), SlotStatus::Available);
    assert_eq!(stored.slots()[1].status(), SlotStatus::Booked);
}

#[test_log::test(tokio::test)]
async fn block_and_unblock_round_trip() {
    let h = Harness::new();
    let host = h.individual("alice").await;
    let window = h.window(&host, at(4, 9, 0), at(4, 12, 0)).await;
    let ids: Vec<_> = window.slots().iter().map(|slot| slot.id).collect();

    let blocked = h
        .service
        .block_slots(&user("alice"), &batch(host.id, &ids[..2]))
        .await
        .expect("Failed to block");
    assert!(blocked.iter().all(|slot| slot.status() == SlotStatus::Blocked));

    let err = h
        .service
        .block_slots(&user("alice"), &batch(host.id, &ids[..1]))
        .await
        .expect_err("Blocking twice must fail");
    assert!(matches!(err, ServiceError::CoreError(CoreError::AlreadyBlocked)));

    // Unblocking includes an already available slot, which is left as is.
    let reopened = h
        .service
        .unblock_slots(&user("alice"), &batch(host.id, &ids))
        .await
        .expect("Failed to unblock");
    assert_eq!(reopened.len(), 3);
    assert!(reopened.iter().all(|slot| slot.status() == SlotStatus::Available));
}

#[test_log::test(tokio::test)]
async fn slots_must_belong_to_the_callers_host_profile() {
    let h = Harness::new();
    let alice = h.individual("alice").await;
    let bob = h.individual("bob").await;
    let alice_window = h.window(&alice, at(4, 9, 0), at(4, 12, 0)).await;
    let bob_window = h.window(&bob, at(4, 9, 0), at(4, 12, 0)).await;

    assert_kind(
        h.service
            .block_slots(
                &user("alice"),
                &batch(alice.id, &[alice_window.slots()[0].id, bob_window.slots()[0].id]),
            )
            .await,
        ErrorKind::NotFound,
    );
    assert_kind(
        h.service
            .block_slots(&user("bob"), &batch(alice.id, &[alice_window.slots()[0].id]))
            .await,
        ErrorKind::Forbidden,
    );

    let stored = h
        .service
        .get_availability(&user("alice"), alice_window.id)
        .await
        .expect("Failed to load availability");
    assert_eq!(stored.slots()[0].status(), SlotStatus::Available);
}
