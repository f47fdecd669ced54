// Pure Diesel query composition for the scheduling tables.
pub mod appointment;
pub mod availability;
pub mod profile;
pub mod schedule;
pub mod text_match;
pub mod time_slot;
