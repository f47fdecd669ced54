//! Slotbook persistence: Postgres schema and queries, plus the storage traits
//! the scheduling use cases run against.

pub mod db;
pub mod error;
pub mod model;
pub mod repository;
