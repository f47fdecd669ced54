//! Scheduling domain model.
//!
//! Leaves first: [`TimeSlot`] is a pure state machine, [`Availability`] owns
//! the slots generated for one window, [`Schedule`] is a weekly template
//! expanded by [`AvailabilityGenerator`], and [`Appointment`] binds a slot to a
//! host and a guest [`SchedulingProfile`]. Nothing here performs I/O; checks that
//! need sibling entities (overlap, name uniqueness) are run by the caller.

pub mod appointment;
pub mod availability;
pub mod generator;
pub mod policy;
pub mod profile;
pub mod schedule;
pub mod time_slot;

pub use appointment::{Appointment, AppointmentRecord};
pub use availability::{Availability, MIN_SLOT_DURATION_MINUTES, intervals_overlap};
pub use generator::{AvailabilityGenerator, GenerationOutcome};
pub use policy::{BookingPolicy, MAX_ADVANCE_BOOKING_DAYS};
pub use profile::SchedulingProfile;
pub use schedule::{Schedule, ScheduleDefinition};
pub use time_slot::TimeSlot;
