//! One-off availability windows.

use chrono::{DateTime, Utc};

use slotbook_core::error::CoreError;
use slotbook_core::scheduling::Availability;
use slotbook_db::repository::{DeleteOutcome, SchedulingStore, WriteOutcome};

use crate::auth::AuthContext;
use crate::clock::Clock;
use crate::error::{ServiceError, ServiceResult};
use crate::scheduling::{PolicyOverrides, SchedulingService};

/// Context for creating a one-off availability.
#[derive(Debug, Clone, Copy)]
pub struct CreateAvailabilityContext {
    pub host_profile_id: uuid::Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub slot_duration_minutes: i32,
    pub policy: PolicyOverrides,
}

/// Filter for listing a host's availabilities. Open bounds are unfiltered.
#[derive(Debug, Clone, Copy)]
pub struct ListAvailabilitiesContext {
    pub profile_id: uuid::Uuid,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl<S: SchedulingStore, C: Clock> SchedulingService<S, C> {
    /// ## Summary
    /// Opens a window on one of the caller's profiles and generates its slots.
    ///
    /// ## Side Effects
    /// - Inserts the availability and its slots
    ///
    /// ## Errors
    /// Returns `NotFound`, `AuthorizationError`, `ValidationError` for a
    /// malformed window or policy, or `OverlappingAvailability` (conflict) if
    /// the window overlaps another availability of the host.
    #[tracing::instrument(skip(self, auth, ctx), fields(host_profile_id = %ctx.host_profile_id))]
    pub async fn create_availability<A: AuthContext + ?Sized>(
        &self,
        auth: &A,
        ctx: &CreateAvailabilityContext,
    ) -> ServiceResult<Availability> {
        self.owned_profile(auth, ctx.host_profile_id).await?;

        let availability = Availability::create(
            ctx.host_profile_id,
            ctx.start_time,
            ctx.end_time,
            ctx.slot_duration_minutes,
            ctx.policy.resolve(self.default_policy()),
        )?;

        let overlapping = self
            .store
            .overlapping_windows(ctx.host_profile_id, ctx.start_time, ctx.end_time)
            .await?;
        if !overlapping.is_empty() {
            tracing::warn!(count = overlapping.len(), "Availability overlaps existing windows");
            return Err(CoreError::OverlappingAvailability.into());
        }

        match self.store.insert_availability(&availability).await? {
            WriteOutcome::Applied => {
                tracing::info!(
                    availability_id = %availability.id,
                    slot_count = availability.slots().len(),
                    "Availability created"
                );
                Ok(availability)
            }
            WriteOutcome::Conflict => Err(CoreError::OverlappingAvailability.into()),
        }
    }

    /// ## Summary
    /// Lists a host's availabilities with their slots, ordered by start.
    ///
    /// ## Errors
    /// Returns `NotFound` or `AuthorizationError`.
    pub async fn list_availabilities<A: AuthContext + ?Sized>(
        &self,
        auth: &A,
        ctx: ListAvailabilitiesContext,
    ) -> ServiceResult<Vec<Availability>> {
        self.owned_profile(auth, ctx.profile_id).await?;
        Ok(self
            .store
            .list_availabilities(ctx.profile_id, ctx.from, ctx.to)
            .await?)
    }

    /// ## Summary
    /// Returns one of the caller's availabilities with its slots.
    ///
    /// ## Errors
    /// Returns `NotFound` or `AuthorizationError`.
    pub async fn get_availability<A: AuthContext + ?Sized>(
        &self,
        auth: &A,
        availability_id: uuid::Uuid,
    ) -> ServiceResult<Availability> {
        let availability = self.availability(availability_id).await?;
        self.owned_profile(auth, availability.host_profile_id).await?;
        Ok(availability)
    }

    /// ## Summary
    /// Removes an availability that has no booked slot. Blocked slots do not
    /// prevent deletion.
    ///
    /// ## Side Effects
    /// - Cancels and removes the availability's slots
    ///
    /// ## Errors
    /// Returns `NotFound`, `AuthorizationError`, or `AvailabilityHasBookings`
    /// (invalid state).
    #[tracing::instrument(skip(self, auth))]
    pub async fn delete_availability<A: AuthContext + ?Sized>(
        &self,
        auth: &A,
        availability_id: uuid::Uuid,
    ) -> ServiceResult<()> {
        let mut availability = self.availability(availability_id).await?;
        self.owned_profile(auth, availability.host_profile_id).await?;
        availability.retire()?;

        match self.store.delete_availability(availability_id).await? {
            DeleteOutcome::Deleted => {
                tracing::info!("Availability deleted");
                Ok(())
            }
            DeleteOutcome::Missing => Err(ServiceError::not_found("availability", availability_id)),
            DeleteOutcome::Blocked => {
                tracing::warn!("Availability was booked concurrently");
                Err(CoreError::AvailabilityHasBookings.into())
            }
        }
    }

    async fn availability(&self, availability_id: uuid::Uuid) -> ServiceResult<Availability> {
        self.store
            .find_availability(availability_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("availability", availability_id))
    }
}
