//! Recurring schedule use cases, including expansion into availabilities.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc, Weekday};

use slotbook_core::scheduling::{
    AvailabilityGenerator, BookingPolicy, GenerationOutcome, Schedule, ScheduleDefinition,
};
use slotbook_db::repository::{DeleteOutcome, SchedulingStore, WriteOutcome};

use crate::auth::{AuthContext, Caller};
use crate::clock::Clock;
use crate::error::{ServiceError, ServiceResult};
use crate::scheduling::{PolicyOverrides, SchedulingService};

/// Requested shape of a schedule, shared by create and update.
#[derive(Debug, Clone)]
pub struct ScheduleContext {
    pub name: String,
    pub days_of_week: Vec<Weekday>,
    /// Wall-clock times, read as UTC.
    pub start_time_of_day: NaiveTime,
    pub end_time_of_day: NaiveTime,
    pub slot_duration_minutes: i32,
    pub effective_from: NaiveDate,
    pub effective_until: Option<NaiveDate>,
    pub policy: PolicyOverrides,
}

impl ScheduleContext {
    fn definition(&self, defaults: BookingPolicy) -> ScheduleDefinition {
        ScheduleDefinition {
            name: self.name.clone(),
            days_of_week: self.days_of_week.clone(),
            start_time_of_day: self.start_time_of_day,
            end_time_of_day: self.end_time_of_day,
            slot_duration_minutes: self.slot_duration_minutes,
            effective_from: self.effective_from,
            effective_until: self.effective_until,
            policy: self.policy.resolve(defaults),
        }
    }
}

/// Context for expanding a schedule over an inclusive date range.
#[derive(Debug, Clone, Copy)]
pub struct GenerateAvailabilitiesContext {
    pub schedule_id: uuid::Uuid,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Totals of one maintenance pass over the active schedules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtendSchedulesResult {
    pub schedules: usize,
    pub failed: usize,
    pub generated_count: usize,
    pub skipped_count: usize,
}

fn name_conflict(name: &str) -> ServiceError {
    ServiceError::Conflict(format!("schedule '{}' already exists", name.trim()))
}

impl<S: SchedulingStore, C: Clock> SchedulingService<S, C> {
    /// ## Summary
    /// Creates an active schedule for one of the caller's profiles.
    ///
    /// ## Side Effects
    /// - Inserts the schedule
    ///
    /// ## Errors
    /// Returns `NotFound`, `AuthorizationError`, `ValidationError` for a
    /// malformed definition, or `Conflict` when the profile already has a
    /// schedule with that name (ignoring case).
    #[tracing::instrument(skip(self, auth, ctx), fields(name = %ctx.name))]
    pub async fn create_schedule<A: AuthContext + ?Sized>(
        &self,
        auth: &A,
        profile_id: uuid::Uuid,
        ctx: &ScheduleContext,
    ) -> ServiceResult<Schedule> {
        self.owned_profile(auth, profile_id).await?;
        let schedule = Schedule::create(profile_id, ctx.definition(self.default_policy()))?;

        if self
            .store
            .schedule_name_taken(profile_id, &schedule.name, None)
            .await?
        {
            tracing::warn!("Schedule name already in use");
            return Err(name_conflict(&schedule.name));
        }

        match self.store.insert_schedule(&schedule).await? {
            WriteOutcome::Applied => {
                tracing::info!(schedule_id = %schedule.id, "Schedule created");
                Ok(schedule)
            }
            WriteOutcome::Conflict => Err(name_conflict(&schedule.name)),
        }
    }

    /// ## Summary
    /// Replaces a schedule's definition. Availabilities generated earlier are
    /// left as they are.
    ///
    /// ## Errors
    /// Returns `NotFound`, `AuthorizationError`, `ValidationError`, or
    /// `Conflict` when another schedule of the profile has the new name.
    #[tracing::instrument(skip(self, auth, ctx))]
    pub async fn update_schedule<A: AuthContext + ?Sized>(
        &self,
        auth: &A,
        schedule_id: uuid::Uuid,
        ctx: &ScheduleContext,
    ) -> ServiceResult<Schedule> {
        let mut schedule = self.owned_schedule(auth, schedule_id).await?;
        schedule.update(ctx.definition(self.default_policy()))?;

        if self
            .store
            .schedule_name_taken(schedule.profile_id, &schedule.name, Some(schedule.id))
            .await?
        {
            tracing::warn!("Schedule name already in use");
            return Err(name_conflict(&schedule.name));
        }

        self.save_schedule(&schedule).await?;
        tracing::info!("Schedule updated");
        Ok(schedule)
    }

    async fn save_schedule(&self, schedule: &Schedule) -> ServiceResult<()> {
        match self.store.update_schedule(schedule).await? {
            WriteOutcome::Applied => Ok(()),
            WriteOutcome::Conflict => Err(name_conflict(&schedule.name)),
        }
    }

    /// ## Summary
    /// Stops future expansion of a schedule. Generated availabilities stay.
    ///
    /// ## Errors
    /// Returns `NotFound` or `AuthorizationError`.
    #[tracing::instrument(skip(self, auth))]
    pub async fn pause_schedule<A: AuthContext + ?Sized>(
        &self,
        auth: &A,
        schedule_id: uuid::Uuid,
    ) -> ServiceResult<Schedule> {
        let mut schedule = self.owned_schedule(auth, schedule_id).await?;
        schedule.pause();
        self.save_schedule(&schedule).await?;
        tracing::info!("Schedule paused");
        Ok(schedule)
    }

    /// ## Summary
    /// Re-enables expansion of a paused schedule.
    ///
    /// ## Errors
    /// Returns `NotFound` or `AuthorizationError`.
    #[tracing::instrument(skip(self, auth))]
    pub async fn resume_schedule<A: AuthContext + ?Sized>(
        &self,
        auth: &A,
        schedule_id: uuid::Uuid,
    ) -> ServiceResult<Schedule> {
        let mut schedule = self.owned_schedule(auth, schedule_id).await?;
        schedule.resume();
        self.save_schedule(&schedule).await?;
        tracing::info!("Schedule resumed");
        Ok(schedule)
    }

    /// ## Summary
    /// Deletes a schedule and the availabilities generated from it.
    ///
    /// ## Side Effects
    /// - Removes the schedule, its generated availabilities and their slots
    ///
    /// ## Errors
    /// Returns `NotFound`, `AuthorizationError`, or `AvailabilityHasBookings`
    /// (invalid state) if a generated availability has a booked slot.
    #[tracing::instrument(skip(self, auth))]
    pub async fn delete_schedule<A: AuthContext + ?Sized>(
        &self,
        auth: &A,
        schedule_id: uuid::Uuid,
    ) -> ServiceResult<()> {
        self.owned_schedule(auth, schedule_id).await?;

        match self.store.delete_schedule(schedule_id).await? {
            DeleteOutcome::Deleted => {
                tracing::info!("Schedule deleted");
                Ok(())
            }
            DeleteOutcome::Missing => Err(ServiceError::not_found("schedule", schedule_id)),
            DeleteOutcome::Blocked => {
                tracing::warn!("Generated availabilities still have bookings");
                Err(slotbook_core::error::CoreError::AvailabilityHasBookings.into())
            }
        }
    }

    /// ## Summary
    /// Lists a profile's schedules by name.
    ///
    /// ## Errors
    /// Returns `NotFound` or `AuthorizationError`.
    pub async fn list_schedules<A: AuthContext + ?Sized>(
        &self,
        auth: &A,
        profile_id: uuid::Uuid,
    ) -> ServiceResult<Vec<Schedule>> {
        self.owned_profile(auth, profile_id).await?;
        Ok(self.store.list_schedules(profile_id).await?)
    }

    /// ## Summary
    /// Expands a schedule into one availability per effective date in
    /// `[from, to]`.
    ///
    /// Candidates overlapping an existing availability of the host, or one
    /// stored concurrently, are skipped and counted; repeating a request
    /// therefore generates nothing new. A paused schedule yields nothing.
    ///
    /// ## Side Effects
    /// - Inserts the accepted availabilities and their slots
    ///
    /// ## Errors
    /// Returns `NotFound`, `AuthorizationError`, or `ValidationError` when
    /// `to < from`, the range exceeds the configured maximum, or `to` is the
    /// last representable date.
    #[tracing::instrument(skip(self, auth), fields(schedule_id = %ctx.schedule_id, from = %ctx.from, to = %ctx.to))]
    pub async fn generate_availabilities<A: AuthContext + ?Sized>(
        &self,
        auth: &A,
        ctx: GenerateAvailabilitiesContext,
    ) -> ServiceResult<GenerationOutcome> {
        let schedule = self.owned_schedule(auth, ctx.schedule_id).await?;
        let (range_start, range_end) = self.generation_bounds(ctx.from, ctx.to)?;
        let existing = self
            .store
            .overlapping_windows(schedule.profile_id, range_start, range_end)
            .await?;
        tracing::debug!(existing = existing.len(), "Loaded existing windows");

        let mut outcome = AvailabilityGenerator::partition(
            AvailabilityGenerator::generate_from_schedule(&schedule, ctx.from, ctx.to),
            &existing,
        )?;

        let mut lost = Vec::new();
        for availability in &outcome.accepted {
            if self.store.insert_availability(availability).await? == WriteOutcome::Conflict {
                lost.push(availability.id);
            }
        }
        for availability_id in lost {
            outcome.skip_accepted(availability_id);
        }

        tracing::info!(
            generated = outcome.generated_count,
            skipped = outcome.skipped_count,
            "Availabilities generated"
        );
        Ok(outcome)
    }

    /// Half-open instant range `[from 00:00, to + 1 day 00:00)` covered by a
    /// generation request.
    fn generation_bounds(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ServiceResult<(DateTime<Utc>, DateTime<Utc>)> {
        if to < from {
            return Err(ServiceError::ValidationError(
                "generation range must not end before it starts".to_string(),
            ));
        }
        let days = (to - from).num_days() + 1;
        if days > i64::from(self.config.max_generation_range_days) {
            return Err(ServiceError::ValidationError(format!(
                "generation range must not exceed {} days",
                self.config.max_generation_range_days
            )));
        }
        let end = to.checked_add_days(Days::new(1)).ok_or_else(|| {
            ServiceError::ValidationError("generation range ends past the last date".to_string())
        })?;
        Ok((
            from.and_time(NaiveTime::MIN).and_utc(),
            end.and_time(NaiveTime::MIN).and_utc(),
        ))
    }

    /// ## Summary
    /// Extends every active schedule from today to today plus the configured
    /// horizon, acting as each schedule's owner. A failing schedule is logged
    /// and counted; the pass continues with the next one.
    ///
    /// ## Errors
    /// Returns a database error if the active schedules cannot be listed, or
    /// `ValidationError` if the horizon runs past the last representable date.
    #[tracing::instrument(skip(self))]
    pub async fn extend_active_schedules(&self) -> ServiceResult<ExtendSchedulesResult> {
        let from = self.clock.today();
        let to = from
            .checked_add_days(Days::new(u64::from(self.config.generation_horizon_days)))
            .ok_or_else(|| {
                ServiceError::ValidationError(
                    "generation horizon ends past the last date".to_string(),
                )
            })?;
        let mut result = ExtendSchedulesResult::default();

        for schedule in self.store.list_active_schedules().await? {
            result.schedules += 1;

            let generated = match self.store.find_profile(schedule.profile_id).await? {
                Some(owner) => {
                    let ctx = GenerateAvailabilitiesContext {
                        schedule_id: schedule.id,
                        from,
                        to,
                    };
                    self.generate_availabilities(&Caller::user(owner.external_user_id), ctx)
                        .await
                }
                None => Err(ServiceError::not_found("profile", schedule.profile_id)),
            };

            match generated {
                Ok(outcome) => {
                    result.generated_count += outcome.generated_count;
                    result.skipped_count += outcome.skipped_count;
                }
                Err(err) => {
                    tracing::warn!(schedule_id = %schedule.id, error = %err, "Schedule extension failed");
                    result.failed += 1;
                }
            }
        }

        tracing::info!(
            schedules = result.schedules,
            failed = result.failed,
            generated = result.generated_count,
            skipped = result.skipped_count,
            "Active schedules extended"
        );
        Ok(result)
    }
}
