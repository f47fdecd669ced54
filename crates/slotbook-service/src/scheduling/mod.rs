//! Scheduling use cases.
//!
//! Each method of [`SchedulingService`] authorizes the caller, loads the
//! aggregates it needs, runs the domain transition in memory and commits the
//! result through one atomic store operation. Losing a race to another request
//! surfaces as the same domain error a sequential caller would see.

use slotbook_core::config::SchedulingConfig;
use slotbook_core::scheduling::{BookingPolicy, Schedule, SchedulingProfile};
use slotbook_db::repository::SchedulingStore;

use crate::auth::{AuthContext, require_owner};
use crate::clock::{Clock, SystemClock};
use crate::error::{ServiceError, ServiceResult};

pub mod appointment;
pub mod availability;
pub mod profile;
pub mod schedule;
pub mod slot;

pub use appointment::{BookAppointmentContext, CancelAppointmentContext};
pub use availability::{CreateAvailabilityContext, ListAvailabilitiesContext};
pub use profile::CreateProfileContext;
pub use schedule::{ExtendSchedulesResult, GenerateAvailabilitiesContext, ScheduleContext};
pub use slot::{ListAvailableSlotsContext, SlotBatchContext};

/// Booking-policy fields a request may leave unset; unset fields fall back to
/// the configured defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PolicyOverrides {
    pub min_advance_booking_minutes: Option<i32>,
    pub max_advance_booking_days: Option<i32>,
    pub cancellation_deadline_minutes: Option<i32>,
}

impl PolicyOverrides {
    #[must_use]
    pub fn resolve(self, defaults: BookingPolicy) -> BookingPolicy {
        BookingPolicy {
            min_advance_booking_minutes: self
                .min_advance_booking_minutes
                .unwrap_or(defaults.min_advance_booking_minutes),
            max_advance_booking_days: self
                .max_advance_booking_days
                .unwrap_or(defaults.max_advance_booking_days),
            cancellation_deadline_minutes: self
                .cancellation_deadline_minutes
                .unwrap_or(defaults.cancellation_deadline_minutes),
        }
    }
}

/// Entry point for every scheduling operation.
pub struct SchedulingService<S, C = SystemClock> {
    store: S,
    clock: C,
    config: SchedulingConfig,
}

impl<S: SchedulingStore> SchedulingService<S> {
    #[must_use]
    pub const fn new(store: S, config: SchedulingConfig) -> Self {
        Self {
            store,
            clock: SystemClock,
            config,
        }
    }
}

impl<S: SchedulingStore, C: Clock> SchedulingService<S, C> {
    #[must_use]
    pub const fn with_clock(store: S, clock: C, config: SchedulingConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub const fn config(&self) -> &SchedulingConfig {
        &self.config
    }

    fn default_policy(&self) -> BookingPolicy {
        self.config.default_policy()
    }

    /// Loads a profile or fails with `NotFound`.
    async fn profile(&self, profile_id: uuid::Uuid) -> ServiceResult<SchedulingProfile> {
        self.store
            .find_profile(profile_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("profile", profile_id))
    }

    /// Loads a profile the caller owns.
    async fn owned_profile<A: AuthContext + ?Sized>(
        &self,
        auth: &A,
        profile_id: uuid::Uuid,
    ) -> ServiceResult<SchedulingProfile> {
        let profile = self.profile(profile_id).await?;
        require_owner(auth, &profile)?;
        Ok(profile)
    }

    /// Loads a schedule whose profile the caller owns.
    async fn owned_schedule<A: AuthContext + ?Sized>(
        &self,
        auth: &A,
        schedule_id: uuid::Uuid,
    ) -> ServiceResult<Schedule> {
        let schedule = self
            .store
            .find_schedule(schedule_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("schedule", schedule_id))?;
        self.owned_profile(auth, schedule.profile_id).await?;
        Ok(schedule)
    }
}
