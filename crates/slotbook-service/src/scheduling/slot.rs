//! Public slot listing and host-side blocking.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use slotbook_core::error::{CoreError, CoreResult};
use slotbook_core::scheduling::{Availability, TimeSlot};
use slotbook_db::repository::{SchedulingStore, SlotTransition};

use crate::auth::AuthContext;
use crate::clock::Clock;
use crate::error::{ServiceError, ServiceResult};
use crate::scheduling::SchedulingService;

/// Window of a host's calendar to search for bookable slots.
#[derive(Debug, Clone, Copy)]
pub struct ListAvailableSlotsContext {
    pub profile_id: uuid::Uuid,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// Slots of one host profile to block or unblock together.
#[derive(Debug, Clone)]
pub struct SlotBatchContext {
    pub profile_id: uuid::Uuid,
    pub slot_ids: Vec<uuid::Uuid>,
}

impl<S: SchedulingStore, C: Clock> SchedulingService<S, C> {
    /// ## Summary
    /// Lists the host's available slots starting in `[from, to]` that can be
    /// booked right now under their availability's policy. Requires no caller.
    ///
    /// ## Errors
    /// Returns `NotFound` for an unknown profile or `ValidationError` when
    /// `to < from`.
    pub async fn list_available_slots(
        &self,
        ctx: ListAvailableSlotsContext,
    ) -> ServiceResult<Vec<TimeSlot>> {
        if ctx.to < ctx.from {
            return Err(ServiceError::ValidationError(
                "search range must not end before it starts".to_string(),
            ));
        }
        self.profile(ctx.profile_id).await?;

        let now = self.clock.now();
        tracing::debug!(profile_id = %ctx.profile_id, %now, "Listing bookable slots");
        Ok(self
            .store
            .list_open_slots(ctx.profile_id, ctx.from, ctx.to)
            .await?
            .into_iter()
            .filter(|open| open.policy.is_bookable(open.slot.start_time, now))
            .map(|open| open.slot)
            .collect())
    }

    /// ## Summary
    /// Withdraws available slots from booking, all or none.
    ///
    /// ## Side Effects
    /// - Marks every listed slot as blocked
    ///
    /// ## Errors
    /// Returns `NotFound` if a slot is not the host's, `CannotBlockBooked` or
    /// `AlreadyBlocked` for an illegal transition, or `SlotStateChanged` when a
    /// slot changed after it was read. Nothing is written on error.
    #[tracing::instrument(skip(self, auth, ctx), fields(profile_id = %ctx.profile_id, count = ctx.slot_ids.len()))]
    pub async fn block_slots<A: AuthContext + ?Sized>(
        &self,
        auth: &A,
        ctx: &SlotBatchContext,
    ) -> ServiceResult<Vec<TimeSlot>> {
        let slots = self
            .transition_batch(auth, ctx, TimeSlot::block)
            .await?;
        tracing::info!("Slots blocked");
        Ok(slots)
    }

    /// ## Summary
    /// Reopens blocked slots, all or none. Slots that are not blocked are
    /// returned unchanged.
    ///
    /// ## Errors
    /// Returns `NotFound` if a slot is not the host's, or `SlotStateChanged`
    /// when a slot changed after it was read.
    #[tracing::instrument(skip(self, auth, ctx), fields(profile_id = %ctx.profile_id, count = ctx.slot_ids.len()))]
    pub async fn unblock_slots<A: AuthContext + ?Sized>(
        &self,
        auth: &A,
        ctx: &SlotBatchContext,
    ) -> ServiceResult<Vec<TimeSlot>> {
        let slots = self
            .transition_batch(auth, ctx, |slot| {
                slot.unblock();
                Ok(())
            })
            .await?;
        tracing::info!("Slots unblocked");
        Ok(slots)
    }

    /// Applies `apply` to a copy of every slot in the batch, then commits the
    /// changed ones conditionally on the status that was read.
    async fn transition_batch<A, F>(
        &self,
        auth: &A,
        ctx: &SlotBatchContext,
        apply: F,
    ) -> ServiceResult<Vec<TimeSlot>>
    where
        A: AuthContext + ?Sized,
        F: Fn(&mut TimeSlot) -> CoreResult<()>,
    {
        self.owned_profile(auth, ctx.profile_id).await?;

        let mut slot_ids = ctx.slot_ids.clone();
        slot_ids.sort_unstable();
        slot_ids.dedup();

        let mut loaded: HashMap<uuid::Uuid, Availability> = HashMap::new();
        let mut updated = Vec::with_capacity(slot_ids.len());
        let mut transitions = Vec::new();

        for slot_id in slot_ids {
            let mut slot = self.host_slot(ctx.profile_id, slot_id, &mut loaded).await?;
            let from = slot.status();
            apply(&mut slot)?;
            if slot.status() != from {
                transitions.push(SlotTransition {
                    slot_id,
                    from,
                    to: slot.status(),
                });
            }
            updated.push(slot);
        }

        if !transitions.is_empty() && !self.store.transition_slots(&transitions).await? {
            tracing::warn!("Slot batch lost a race");
            return Err(CoreError::SlotStateChanged.into());
        }

        updated.sort_by_key(|slot| slot.start_time);
        Ok(updated)
    }

    /// Reads a slot that belongs to one of `host_profile_id`'s availabilities.
    async fn host_slot(
        &self,
        host_profile_id: uuid::Uuid,
        slot_id: uuid::Uuid,
        loaded: &mut HashMap<uuid::Uuid, Availability>,
    ) -> ServiceResult<TimeSlot> {
        if let Some(slot) = loaded.values().find_map(|a| a.slot(slot_id)) {
            return Ok(slot.clone());
        }

        let availability = self
            .store
            .find_availability_by_slot(slot_id)
            .await?
            .filter(|a| a.host_profile_id == host_profile_id)
            .ok_or_else(|| ServiceError::not_found("slot", slot_id))?;

        let slot = availability
            .slot(slot_id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("slot", slot_id))?;
        loaded.insert(availability.id, availability);
        Ok(slot)
    }
}
