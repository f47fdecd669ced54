//! Row types for the scheduling tables and their conversions to the domain model.

pub mod appointment;
pub mod availability;
pub mod profile;
pub mod schedule;
pub mod time_slot;

pub use appointment::AppointmentRow;
pub use availability::AvailabilityRow;
pub use profile::ProfileRow;
pub use schedule::ScheduleRow;
pub use time_slot::TimeSlotRow;
