use thiserror::Error;

use crate::types::SlotStatus;

/// Coarse classification every error in the workspace reports.
///
/// Callers (transport adapters, the maintenance binary) map on this instead of
/// matching individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    Conflict,
    InvalidState,
    ValidationFailed,
    Unauthenticated,
    Internal,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::Conflict => "conflict",
            Self::InvalidState => "invalid_state",
            Self::ValidationFailed => "validation_failed",
            Self::Unauthenticated => "unauthenticated",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain rule violations raised by the scheduling model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Slot is not available (status: {0})")]
    SlotNotAvailable(SlotStatus),

    #[error("Cannot block a booked slot")]
    CannotBlockBooked,

    #[error("Slot is already blocked")]
    AlreadyBlocked,

    #[error("Slot changed state concurrently")]
    SlotStateChanged,

    #[error("Host and guest belong to the same user")]
    SelfBookingNotAllowed,

    #[error("Slot starts too soon to be booked")]
    TooSoon,

    #[error("Slot starts too far in the future to be booked")]
    TooFarInFuture,

    #[error("Appointment is already canceled")]
    AlreadyCanceled,

    #[error("Appointment is already completed")]
    AlreadyCompleted,

    #[error("Cancellation deadline has passed")]
    CancellationDeadlinePassed,

    #[error("Availability overlaps an existing availability")]
    OverlappingAvailability,

    #[error("Availability has booked slots")]
    AvailabilityHasBookings,

    #[error("Invariant violation: {0}")]
    InvariantViolation(&'static str),
}

impl CoreError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ValidationError(_) | Self::TooSoon | Self::TooFarInFuture => {
                ErrorKind::ValidationFailed
            }
            Self::SelfBookingNotAllowed => ErrorKind::Forbidden,
            Self::OverlappingAvailability => ErrorKind::Conflict,
            Self::SlotNotAvailable(_)
            | Self::CannotBlockBooked
            | Self::AlreadyBlocked
            | Self::SlotStateChanged
            | Self::AlreadyCanceled
            | Self::AlreadyCompleted
            | Self::CancellationDeadlinePassed
            | Self::AvailabilityHasBookings => ErrorKind::InvalidState,
            Self::InvariantViolation(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
