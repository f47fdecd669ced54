use chrono::{DateTime, Utc};
use diesel::{pg::Pg, prelude::*};

use slotbook_core::scheduling::TimeSlot;

use crate::db::{enums::SlotStatus, schema};

/// Stored time slot.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = schema::time_slots)]
#[diesel(check_for_backend(Pg))]
pub struct TimeSlotRow {
    pub id: uuid::Uuid,
    pub availability_id: uuid::Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: SlotStatus,
}

impl From<TimeSlotRow> for TimeSlot {
    fn from(row: TimeSlotRow) -> Self {
        Self::restore(
            row.id,
            row.availability_id,
            row.start_time,
            row.end_time,
            row.status.into(),
        )
    }
}

impl From<&TimeSlot> for TimeSlotRow {
    fn from(slot: &TimeSlot) -> Self {
        Self {
            id: slot.id,
            availability_id: slot.availability_id,
            start_time: slot.start_time,
            end_time: slot.end_time,
            status: slot.status().into(),
        }
    }
}
