//! Scenario tests grouped by aggregate.
//!
//! Every test starts at Monday 2026-03-02 08:00 UTC with the default
//! scheduling configuration: 60 minutes minimum lead time, 90 days horizon and
//! a 24 hour cancellation deadline.
//!
//! Most modules run against the in-memory store. `postgres` replays the race
//! and delete scenarios through `PgStore` and is ignored unless
//! `DATABASE_URL` is set and `--ignored` is passed.

mod availability;
mod booking;
mod postgres;
mod schedule;
mod slots;
