//! Slotbook core: configuration, error taxonomy and the scheduling domain model.

pub mod config;
pub mod error;
pub mod scheduling;
pub mod types;
