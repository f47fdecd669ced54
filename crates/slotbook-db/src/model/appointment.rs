use chrono::{DateTime, Utc};
use diesel::{pg::Pg, prelude::*};

use slotbook_core::scheduling::{Appointment, AppointmentRecord};

use crate::db::{enums::AppointmentStatus, schema};

/// Stored appointment.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = schema::appointments)]
#[diesel(check_for_backend(Pg))]
pub struct AppointmentRow {
    pub id: uuid::Uuid,
    pub time_slot_id: uuid::Uuid,
    pub host_profile_id: uuid::Uuid,
    pub guest_profile_id: uuid::Uuid,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub canceled_by: Option<String>,
    pub cancellation_reason: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Columns written when an appointment leaves `scheduled`.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = schema::appointments)]
pub struct AppointmentTransition<'a> {
    pub status: AppointmentStatus,
    pub canceled_at: Option<DateTime<Utc>>,
    pub canceled_by: Option<&'a str>,
    pub cancellation_reason: Option<&'a str>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl<'a> From<&'a Appointment> for AppointmentTransition<'a> {
    fn from(appointment: &'a Appointment) -> Self {
        Self {
            status: appointment.status().into(),
            canceled_at: appointment.canceled_at(),
            canceled_by: appointment.canceled_by(),
            cancellation_reason: appointment.cancellation_reason(),
            completed_at: appointment.completed_at(),
        }
    }
}

impl From<AppointmentRow> for Appointment {
    fn from(row: AppointmentRow) -> Self {
        Self::restore(AppointmentRecord {
            id: row.id,
            time_slot_id: row.time_slot_id,
            host_profile_id: row.host_profile_id,
            guest_profile_id: row.guest_profile_id,
            status: row.status.into(),
            notes: row.notes,
            created_at: row.created_at,
            canceled_at: row.canceled_at,
            canceled_by: row.canceled_by,
            cancellation_reason: row.cancellation_reason,
            completed_at: row.completed_at,
        })
    }
}

impl From<&Appointment> for AppointmentRow {
    fn from(appointment: &Appointment) -> Self {
        Self {
            id: appointment.id,
            time_slot_id: appointment.time_slot_id,
            host_profile_id: appointment.host_profile_id,
            guest_profile_id: appointment.guest_profile_id,
            status: appointment.status().into(),
            notes: appointment.notes.clone(),
            created_at: appointment.created_at,
            canceled_at: appointment.canceled_at(),
            canceled_by: appointment.canceled_by().map(str::to_string),
            cancellation_reason: appointment.cancellation_reason().map(str::to_string),
            completed_at: appointment.completed_at(),
        }
    }
}
