//! The smallest bookable unit and its state machine.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::types::SlotStatus;

/// A fixed-length slice of an availability window.
///
/// The status is only reachable through the transition methods so that every
/// state change goes through the rules below:
///
/// | from      | `book` | `release` | `block` | `unblock` | `cancel` |
/// |-----------|--------|-----------|---------|-----------|----------|
/// | Available | Booked | -         | Blocked | -         | Canceled |
/// | Booked    | error  | Available | error   | -         | Canceled |
/// | Blocked   | error  | -         | error   | Available | Canceled |
/// | Canceled  | error  | -         | error   | -         | Canceled |
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSlot {
    pub id: uuid::Uuid,
    pub availability_id: uuid::Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    status: SlotStatus,
}

impl TimeSlot {
    /// Creates a fresh, available slot.
    #[must_use]
    pub fn new(
        availability_id: uuid::Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::now_v7(),
            availability_id,
            start_time,
            end_time,
            status: SlotStatus::Available,
        }
    }

    /// Rebuilds a slot from stored state.
    #[must_use]
    pub const fn restore(
        id: uuid::Uuid,
        availability_id: uuid::Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        status: SlotStatus,
    ) -> Self {
        Self {
            id,
            availability_id,
            start_time,
            end_time,
            status,
        }
    }

    #[must_use]
    pub const fn status(&self) -> SlotStatus {
        self.status
    }

    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self.status, SlotStatus::Available)
    }

    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        self.end_time - self.start_time
    }

    /// ## Summary
    /// Reserves the slot for an appointment.
    ///
    /// ## Errors
    /// Returns `SlotNotAvailable` with the current status unless the slot is available.
    pub fn book(&mut self) -> CoreResult<()> {
        if self.status != SlotStatus::Available {
            return Err(CoreError::SlotNotAvailable(self.status));
        }
        self.status = SlotStatus::Booked;
        Ok(())
    }

    /// Returns a booked slot to the pool. Any other status is left untouched,
    /// so releasing twice is harmless.
    pub fn release(&mut self) {
        if self.status == SlotStatus::Booked {
            self.status = SlotStatus::Available;
        }
    }

    /// ## Summary
    /// Withdraws an available slot from booking.
    ///
    /// ## Errors
    /// Returns `CannotBlockBooked`, `AlreadyBlocked`, or `SlotNotAvailable` for a
    /// canceled slot.
    pub fn block(&mut self) -> CoreResult<()> {
        match self.status {
            SlotStatus::Available => {
                self.status = SlotStatus::Blocked;
                Ok(())
            }
            SlotStatus::Booked => Err(CoreError::CannotBlockBooked),
            SlotStatus::Blocked => Err(CoreError::AlreadyBlocked),
            SlotStatus::Canceled => Err(CoreError::SlotNotAvailable(SlotStatus::Canceled)),
        }
    }

    /// Reopens a blocked slot; no-op for any other status.
    pub fn unblock(&mut self) {
        if self.status == SlotStatus::Blocked {
            self.status = SlotStatus::Available;
        }
    }

    /// Retires the slot permanently.
    pub fn cancel(&mut self) {
        self.status = SlotStatus::Canceled;
    }
}
