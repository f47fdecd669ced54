//! Database enum types with Diesel serialization.
//!
//! This module provides type-safe enum wrappers for database CHECK constraints.
//! Each enum implements `ToSql` and `FromSql` for automatic conversion between Rust and `PostgreSQL`,
//! and converts to and from its counterpart in `slotbook_core::types`.

use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use std::fmt;
use std::io::Write;

use slotbook_core::types;

/// Scheduling profile classification.
///
/// Maps to `profiles.profile_type` CHECK constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub enum ProfileType {
    Individual,
    Business,
}

impl ToSql<Text, Pg> for ProfileType {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for ProfileType {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"individual" => Ok(Self::Individual),
            b"business" => Ok(Self::Business),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

impl ProfileType {
    /// Returns the database string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Business => "business",
        }
    }
}

impl From<ProfileType> for types::ProfileType {
    fn from(db_value: ProfileType) -> Self {
        match db_value {
            ProfileType::Individual => Self::Individual,
            ProfileType::Business => Self::Business,
        }
    }
}

impl From<types::ProfileType> for ProfileType {
    fn from(core_value: types::ProfileType) -> Self {
        match core_value {
            types::ProfileType::Individual => Self::Individual,
            types::ProfileType::Business => Self::Business,
        }
    }
}

impl fmt::Display for ProfileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time slot lifecycle state.
///
/// Maps to `time_slots.status` CHECK constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub enum SlotStatus {
    Available,
    Booked,
    Blocked,
    Canceled,
}

impl ToSql<Text, Pg> for SlotStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for SlotStatus {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"available" => Ok(Self::Available),
            b"booked" => Ok(Self::Booked),
            b"blocked" => Ok(Self::Blocked),
            b"canceled" => Ok(Self::Canceled),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

impl SlotStatus {
    /// Returns the database string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Booked => "booked",
            Self::Blocked => "blocked",
            Self::Canceled => "canceled",
        }
    }
}

impl From<SlotStatus> for types::SlotStatus {
    fn from(db_value: SlotStatus) -> Self {
        match db_value {
            SlotStatus::Available => Self::Available,
            SlotStatus::Booked => Self::Booked,
            SlotStatus::Blocked => Self::Blocked,
            SlotStatus::Canceled => Self::Canceled,
        }
    }
}

impl From<types::SlotStatus> for SlotStatus {
    fn from(core_value: types::SlotStatus) -> Self {
        match core_value {
            types::SlotStatus::Available => Self::Available,
            types::SlotStatus::Booked => Self::Booked,
            types::SlotStatus::Blocked => Self::Blocked,
            types::SlotStatus::Canceled => Self::Canceled,
        }
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Appointment lifecycle state.
///
/// Maps to `appointments.status` CHECK constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub enum AppointmentStatus {
    Scheduled,
    Canceled,
    Completed,
}

impl ToSql<Text, Pg> for AppointmentStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for AppointmentStatus {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"scheduled" => Ok(Self::Scheduled),
            b"canceled" => Ok(Self::Canceled),
            b"completed" => Ok(Self::Completed),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

impl AppointmentStatus {
    /// Returns the database string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Canceled => "canceled",
            Self::Completed => "completed",
        }
    }
}

impl From<AppointmentStatus> for types::AppointmentStatus {
    fn from(db_value: AppointmentStatus) -> Self {
        match db_value {
            AppointmentStatus::Scheduled => Self::Scheduled,
            AppointmentStatus::Canceled => Self::Canceled,
            AppointmentStatus::Completed => Self::Completed,
        }
    }
}

impl From<types::AppointmentStatus> for AppointmentStatus {
    fn from(core_value: types::AppointmentStatus) -> Self {
        match core_value {
            types::AppointmentStatus::Scheduled => Self::Scheduled,
            types::AppointmentStatus::Canceled => Self::Canceled,
            types::AppointmentStatus::Completed => Self::Completed,
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
