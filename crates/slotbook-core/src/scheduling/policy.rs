//! Booking-window and cancellation-deadline arithmetic.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Longest booking horizon a policy may carry. Mirrored by the CHECK
/// constraints on `schedules` and `availabilities`.
pub const MAX_ADVANCE_BOOKING_DAYS: i32 = 3650;

/// Host-defined rules carried by every availability (and by schedules, which
/// stamp them onto the availabilities they generate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingPolicy {
    /// A slot must start at least this many minutes after "now" to be booked.
    pub min_advance_booking_minutes: i32,
    /// A slot may start at most this many days after "now" to be booked.
    pub max_advance_booking_days: i32,
    /// Appointments can no longer be canceled this many minutes before the slot starts.
    pub cancellation_deadline_minutes: i32,
}

impl BookingPolicy {
    /// ## Summary
    /// Checks that the policy can admit at least one booking.
    ///
    /// ## Errors
    /// Returns `ValidationError` for negative values, a horizon outside
    /// `1..=MAX_ADVANCE_BOOKING_DAYS`, or a minimum lead time that exceeds the horizon.
    pub fn validate(&self) -> CoreResult<()> {
        if self.min_advance_booking_minutes < 0 {
            return Err(CoreError::validation(
                "minimum advance booking must not be negative",
            ));
        }
        if self.max_advance_booking_days < 1 {
            return Err(CoreError::validation(
                "maximum advance booking must be at least one day",
            ));
        }
        if self.max_advance_booking_days > MAX_ADVANCE_BOOKING_DAYS {
            return Err(CoreError::validation(format!(
                "maximum advance booking must not exceed {MAX_ADVANCE_BOOKING_DAYS} days"
            )));
        }
        if self.cancellation_deadline_minutes < 0 {
            return Err(CoreError::validation(
                "cancellation deadline must not be negative",
            ));
        }
        if i64::from(self.min_advance_booking_minutes)
            > i64::from(self.max_advance_booking_days) * MINUTES_PER_DAY
        {
            return Err(CoreError::validation(
                "minimum advance booking exceeds the booking horizon",
            ));
        }
        Ok(())
    }

    /// Earliest slot start that may be booked at `now`. Saturates at the end of time.
    #[must_use]
    pub fn earliest_bookable_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_add_signed(TimeDelta::minutes(i64::from(
            self.min_advance_booking_minutes,
        )))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Latest slot start that may be booked at `now`. Saturates at the end of time.
    #[must_use]
    pub fn latest_bookable_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        TimeDelta::try_days(i64::from(self.max_advance_booking_days))
            .and_then(|horizon| now.checked_add_signed(horizon))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// ## Summary
    /// Validates that a slot starting at `slot_start` is inside the booking window at `now`.
    ///
    /// ## Errors
    /// Returns `TooSoon` or `TooFarInFuture`.
    pub fn check_booking_window(
        &self,
        slot_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        if slot_start < self.earliest_bookable_start(now) {
            return Err(CoreError::TooSoon);
        }
        if slot_start > self.latest_bookable_start(now) {
            return Err(CoreError::TooFarInFuture);
        }
        Ok(())
    }

    #[must_use]
    pub fn is_bookable(&self, slot_start: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.check_booking_window(slot_start, now).is_ok()
    }
}

/// Last instant at which an appointment for a slot starting at `slot_start` may be canceled.
#[must_use]
pub fn cancellation_cutoff(
    slot_start: DateTime<Utc>,
    cancellation_deadline_minutes: i32,
) -> DateTime<Utc> {
    slot_start
        .checked_sub_signed(TimeDelta::minutes(i64::from(cancellation_deadline_minutes)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
