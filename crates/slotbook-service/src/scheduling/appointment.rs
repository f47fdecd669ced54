//! Booking and the appointment lifecycle.

use slotbook_core::error::CoreError;
use slotbook_core::scheduling::{Appointment, BookingPolicy, TimeSlot};
use slotbook_core::types::{AppointmentStatus, SlotStatus};
use slotbook_db::repository::SchedulingStore;

use crate::auth::{AuthContext, require_user};
use crate::clock::Clock;
use crate::error::{ServiceError, ServiceResult};
use crate::scheduling::SchedulingService;

/// Context for booking a slot. The caller must own the guest profile.
#[derive(Debug, Clone)]
pub struct BookAppointmentContext {
    pub host_profile_id: uuid::Uuid,
    pub guest_profile_id: uuid::Uuid,
    pub slot_id: uuid::Uuid,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CancelAppointmentContext {
    pub appointment_id: uuid::Uuid,
    pub reason: Option<String>,
}

/// Side of an appointment the caller acts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Participant {
    Host,
    Guest,
}

/// Copy of a slot with the policy and host of its availability.
struct SlotView {
    slot: TimeSlot,
    policy: BookingPolicy,
    host_profile_id: uuid::Uuid,
}

/// Domain error for an appointment that left `Scheduled` under our feet.
fn already_terminal(status: Option<AppointmentStatus>) -> CoreError {
    match status {
        Some(AppointmentStatus::Completed) => CoreError::AlreadyCompleted,
        _ => CoreError::AlreadyCanceled,
    }
}

impl<S: SchedulingStore, C: Clock> SchedulingService<S, C> {
    /// ## Summary
    /// Books an available slot of the host for the caller's guest profile.
    ///
    /// Exactly one of any number of concurrent bookings for the same slot
    /// succeeds; the others fail with `SlotNotAvailable`.
    ///
    /// ## Side Effects
    /// - Marks the slot as booked
    /// - Inserts the appointment
    ///
    /// ## Errors
    /// Returns `NotFound` for an unknown profile or a slot outside the host's
    /// availabilities, `AuthorizationError` when the caller does not own the
    /// guest profile, `SelfBookingNotAllowed`, `TooSoon`, `TooFarInFuture`,
    /// or `SlotNotAvailable`.
    #[tracing::instrument(skip(self, auth, ctx), fields(slot_id = %ctx.slot_id, host_profile_id = %ctx.host_profile_id))]
    pub async fn book_appointment<A: AuthContext + ?Sized>(
        &self,
        auth: &A,
        ctx: &BookAppointmentContext,
    ) -> ServiceResult<Appointment> {
        let guest = self.owned_profile(auth, ctx.guest_profile_id).await?;
        let host = self.profile(ctx.host_profile_id).await?;
        let SlotView {
            mut slot,
            policy,
            host_profile_id,
        } = self.slot_view(ctx.slot_id).await?;
        if host_profile_id != host.id {
            return Err(ServiceError::not_found("slot", ctx.slot_id));
        }

        let appointment = Appointment::create(
            &mut slot,
            &host,
            &guest,
            &policy,
            self.clock.now(),
            ctx.notes.as_deref(),
        )?;

        if !self.store.commit_booking(&appointment).await? {
            let current = self
                .slot_view(ctx.slot_id)
                .await
                .ok()
                .map(|view| view.slot.status())
                .filter(|status| *status != SlotStatus::Available)
                .unwrap_or(SlotStatus::Booked);
            tracing::warn!(status = %current, "Slot was booked concurrently");
            return Err(CoreError::SlotNotAvailable(current).into());
        }

        tracing::info!(appointment_id = %appointment.id, "Appointment booked");
        Ok(appointment)
    }

    /// ## Summary
    /// Lists appointments where the profile is host or guest, newest first,
    /// optionally filtered by status.
    ///
    /// ## Errors
    /// Returns `NotFound` or `AuthorizationError`.
    pub async fn list_appointments<A: AuthContext + ?Sized>(
        &self,
        auth: &A,
        profile_id: uuid::Uuid,
        status: Option<AppointmentStatus>,
    ) -> ServiceResult<Vec<Appointment>> {
        self.owned_profile(auth, profile_id).await?;
        Ok(self.store.list_appointments(profile_id, status).await?)
    }

    /// ## Summary
    /// Returns an appointment the caller takes part in.
    ///
    /// ## Errors
    /// Returns `NotFound` or `AuthorizationError`.
    pub async fn get_appointment<A: AuthContext + ?Sized>(
        &self,
        auth: &A,
        appointment_id: uuid::Uuid,
    ) -> ServiceResult<Appointment> {
        let appointment = self.appointment(appointment_id).await?;
        self.participant(auth, &appointment).await?;
        Ok(appointment)
    }

    /// ## Summary
    /// Cancels a scheduled appointment on behalf of either participant and
    /// returns its slot to the pool.
    ///
    /// ## Side Effects
    /// - Marks the appointment as canceled
    /// - Marks the slot as available
    ///
    /// ## Errors
    /// Returns `NotFound`, `AuthorizationError`, `AlreadyCanceled`,
    /// `AlreadyCompleted`, or `CancellationDeadlinePassed`.
    #[tracing::instrument(skip(self, auth, ctx), fields(appointment_id = %ctx.appointment_id))]
    pub async fn cancel_appointment<A: AuthContext + ?Sized>(
        &self,
        auth: &A,
        ctx: &CancelAppointmentContext,
    ) -> ServiceResult<Appointment> {
        let mut appointment = self.appointment(ctx.appointment_id).await?;
        let participant = self.participant(auth, &appointment).await?;
        let canceled_by = require_user(auth)?;
        let SlotView { mut slot, policy, .. } = self.slot_view(appointment.time_slot_id).await?;

        appointment.cancel(
            canceled_by,
            &mut slot,
            policy.cancellation_deadline_minutes,
            self.clock.now(),
            ctx.reason.as_deref(),
        )?;

        if !self.store.commit_cancellation(&appointment).await? {
            return Err(self.lost_transition(appointment.id).await.into());
        }

        tracing::info!(?participant, "Appointment canceled");
        Ok(appointment)
    }

    /// ## Summary
    /// Marks a scheduled appointment as completed. Only the host may do this;
    /// the slot stays booked.
    ///
    /// ## Errors
    /// Returns `NotFound`, `AuthorizationError`, `AlreadyCanceled`, or
    /// `AlreadyCompleted`.
    #[tracing::instrument(skip(self, auth))]
    pub async fn complete_appointment<A: AuthContext + ?Sized>(
        &self,
        auth: &A,
        appointment_id: uuid::Uuid,
    ) -> ServiceResult<Appointment> {
        let mut appointment = self.appointment(appointment_id).await?;
        if self.participant(auth, &appointment).await? != Participant::Host {
            tracing::warn!("Guest tried to complete appointment");
            return Err(ServiceError::AuthorizationError(
                "only the host can complete an appointment".to_string(),
            ));
        }

        appointment.complete(self.clock.now())?;

        if !self.store.commit_completion(&appointment).await? {
            return Err(self.lost_transition(appointment.id).await.into());
        }

        tracing::info!("Appointment completed");
        Ok(appointment)
    }

    async fn appointment(&self, appointment_id: uuid::Uuid) -> ServiceResult<Appointment> {
        self.store
            .find_appointment(appointment_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("appointment", appointment_id))
    }

    /// Resolves which side of the appointment the caller owns; host wins when
    /// the caller owns both.
    async fn participant<A: AuthContext + ?Sized>(
        &self,
        auth: &A,
        appointment: &Appointment,
    ) -> ServiceResult<Participant> {
        let user_id = require_user(auth)?;

        let host = self.profile(appointment.host_profile_id).await?;
        if auth.is_owned_by(&host, user_id) {
            return Ok(Participant::Host);
        }
        let guest = self.profile(appointment.guest_profile_id).await?;
        if auth.is_owned_by(&guest, user_id) {
            return Ok(Participant::Guest);
        }

        tracing::warn!(appointment_id = %appointment.id, "Caller is not a participant");
        Err(ServiceError::AuthorizationError(format!(
            "appointment {} belongs to other users",
            appointment.id
        )))
    }

    async fn slot_view(&self, slot_id: uuid::Uuid) -> ServiceResult<SlotView> {
        let mut availability = self
            .store
            .find_availability_by_slot(slot_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("slot", slot_id))?;
        let host_profile_id = availability.host_profile_id;
        availability
            .slot_with_policy(slot_id)
            .map(|(slot, policy)| SlotView {
                slot: slot.clone(),
                policy,
                host_profile_id,
            })
            .ok_or_else(|| ServiceError::not_found("slot", slot_id))
    }

    /// Domain error for a cancel or complete that found the appointment no
    /// longer scheduled at commit time.
    async fn lost_transition(&self, appointment_id: uuid::Uuid) -> CoreError {
        let current = self
            .store
            .find_appointment(appointment_id)
            .await
            .ok()
            .flatten()
            .map(|appointment| appointment.status());
        tracing::warn!(?current, "Appointment changed concurrently");
        already_terminal(current)
    }
}
