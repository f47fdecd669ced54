//! Expansion of schedules into concrete availabilities.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::error::CoreResult;
use crate::scheduling::availability::{Availability, intervals_overlap};
use crate::scheduling::schedule::Schedule;

/// Outcome of expanding a schedule against the host's existing windows.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationOutcome {
    pub generated_count: usize,
    pub skipped_count: usize,
    pub accepted: Vec<Availability>,
}

impl GenerationOutcome {
    /// Moves an accepted candidate to the skipped tally (e.g. the store lost a race).
    pub fn skip_accepted(&mut self, availability_id: uuid::Uuid) {
        let before = self.accepted.len();
        self.accepted.retain(|a| a.id != availability_id);
        let removed = before - self.accepted.len();
        self.generated_count -= removed;
        self.skipped_count += removed;
    }
}

/// Stateless expansion of schedules.
pub struct AvailabilityGenerator;

impl AvailabilityGenerator {
    /// ## Summary
    /// Lazily yields one candidate availability for every date in `[from, to]`
    /// on which the schedule is effective.
    ///
    /// Each candidate spans the schedule's daily window, carries its slot
    /// duration and booking policy, and is tagged with the schedule id. An
    /// empty range (`to < from`) yields nothing.
    pub fn generate_from_schedule(
        schedule: &Schedule,
        from: NaiveDate,
        to: NaiveDate,
    ) -> impl Iterator<Item = CoreResult<Availability>> + '_ {
        from.iter_days()
            .take_while(move |date| *date <= to)
            .filter(|date| schedule.is_effective_on(*date))
            .map(|date| {
                let (start, end) = schedule.window_on(date);
                Availability::create(
                    schedule.profile_id,
                    start,
                    end,
                    schedule.slot_duration_minutes,
                    schedule.policy,
                )
                .map(|availability| availability.with_schedule(schedule.id))
            })
    }

    /// ## Summary
    /// Keeps candidates that overlap neither an existing window nor an already
    /// accepted candidate; the rest are counted as skipped.
    ///
    /// ## Errors
    /// Propagates the first candidate construction error.
    pub fn partition(
        candidates: impl IntoIterator<Item = CoreResult<Availability>>,
        existing: &[(DateTime<Utc>, DateTime<Utc>)],
    ) -> CoreResult<GenerationOutcome> {
        let mut taken = existing.to_vec();
        let mut outcome = GenerationOutcome::default();

        for candidate in candidates {
            let candidate = candidate?;
            let overlapping = taken.iter().any(|(start, end)| {
                intervals_overlap(candidate.start_time, candidate.end_time, *start, *end)
            });

            if overlapping {
                tracing::trace!(
                    start = %candidate.start_time,
                    end = %candidate.end_time,
                    "Skipping overlapping candidate"
                );
                outcome.skipped_count += 1;
                continue;
            }

            taken.push((candidate.start_time, candidate.end_time));
            outcome.generated_count += 1;
            outcome.accepted.push(candidate);
        }

        Ok(outcome)
    }
}
