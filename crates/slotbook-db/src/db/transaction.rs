//! Transaction helper for multi-statement units of work.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use diesel_async::scoped_futures::ScopedFutureExt;
//! use crate::db::transaction::with_transaction;
//!
//! with_transaction(&mut conn, |tx| async move {
//!     time_slot::transition(tx, slot_id, SlotStatus::Available, SlotStatus::Booked).await?;
//!     appointment::insert(tx, &row).await?;
//!     Ok(())
//! }.scope_boxed()).await?;
//! ```
//!
//! Returning `Err` from the closure rolls the transaction back.

use diesel_async::{AsyncConnection, AsyncPgConnection, scoped_futures::ScopedBoxFuture};

use crate::error::{DbError, DbResult};

/// ## Summary
/// Runs `callback` inside a database transaction and returns its result.
///
/// ## Errors
/// Returns any error produced by the closure, or errors raised while starting
/// or committing the transaction.
pub async fn with_transaction<'a, T, F>(conn: &mut AsyncPgConnection, callback: F) -> DbResult<T>
where
    F: for<'r> FnOnce(&'r mut AsyncPgConnection) -> ScopedBoxFuture<'a, 'r, DbResult<T>>
        + Send
        + 'a,
    T: Send + 'a,
{
    conn.transaction::<T, DbError, F>(callback).await
}
