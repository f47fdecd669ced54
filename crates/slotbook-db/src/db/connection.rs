//! The bb8 pool behind `PgStore`.
//!
//! One pool is built per process, by the maintenance binary or by the
//! Postgres test suite, and handed to `PgStore::new`. Every store method
//! checks out a single connection for the length of its transaction, so the
//! pool size bounds how many use cases touch the database at once.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};

use crate::db::DbProvider;
use crate::error::DbResult;

pub type DbPool = Pool<AsyncPgConnection>;
pub type DbConnection<'pool> = PooledConnection<'pool, AsyncPgConnection>;

/// Idle connections kept warm between store calls.
const MIN_IDLE_CONNECTIONS: u32 = 2;

/// How long a store call waits for a free connection before failing.
const CHECKOUT_TIMEOUT: Duration = Duration::from_secs(10);

/// ## Summary
/// Builds the pool `PgStore` runs on, holding at most `max_size` connections
/// to `database_url`. At most two of them are kept idle. The pool connects
/// lazily beyond those, so a short maintenance run opens only what it uses.
///
/// ## Errors
/// Returns `PoolSetupError` if the initial idle connections cannot be opened.
#[tracing::instrument(skip(database_url))]
pub async fn build_pool(database_url: &str, max_size: u32) -> DbResult<DbPool> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);

    let pool = Pool::builder()
        .max_size(max_size.max(1))
        .min_idle(Some(max_size.clamp(1, MIN_IDLE_CONNECTIONS)))
        .connection_timeout(CHECKOUT_TIMEOUT)
        .test_on_check_out(false)
        .build(manager)
        .await?;

    tracing::info!(
        idle = pool.state().idle_connections,
        "Scheduling store pool ready"
    );

    Ok(pool)
}

impl DbProvider for DbPool {
    fn get_connection<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = DbResult<DbConnection<'a>>> + Send + 'a>> {
        Box::pin(async move {
            let conn = self.get().await.inspect_err(|err| {
                tracing::warn!(error = %err, "No connection available from the scheduling pool");
            })?;
            Ok(conn)
        })
    }
}
