//! Scheduling use cases: authorization, booking rules and the maintenance
//! pass that keeps recurring schedules expanded.

pub mod auth;
pub mod clock;
pub mod error;
pub mod scheduling;
