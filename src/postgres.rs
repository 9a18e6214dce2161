//! Connection handling shared by the `PostgreSQL` adapters.
//!
//! Diesel connections are synchronous, so every repository funnels its
//! queries through [`run_blocking`], which checks a connection out of the
//! shared r2d2 pool on the blocking thread pool.

use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use thiserror::Error;

/// Connection pool handed to every `PostgreSQL` repository.
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Idempotent DDL for every control-plane table.
pub const SCHEMA_SQL: &str =
    include_str!("../migrations/2026-10-01-000000_create_control_plane/up.sql");

/// Failure while preparing the database at startup.
#[derive(Debug, Error)]
pub enum DatabaseSetupError {
    /// No connection could be established.
    #[error("failed to connect to PostgreSQL: {0}")]
    Pool(#[from] PoolError),
    /// The schema script was rejected.
    #[error("failed to apply the schema: {0}")]
    Schema(#[from] diesel::result::Error),
}

/// Builds a pool of at most `max_size` connections and applies the schema.
///
/// This blocks on network I/O; async callers should run it through
/// `spawn_blocking`.
///
/// # Errors
///
/// Returns [`DatabaseSetupError`] when the database is unreachable or the
/// schema cannot be applied.
pub fn open(database_url: &str, max_size: u32) -> Result<PgPool, DatabaseSetupError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder().max_size(max_size).build(manager)?;
    pool.get()?.batch_execute(SCHEMA_SQL)?;
    Ok(pool)
}

/// Repository errors that can wrap an opaque backend failure.
pub(crate) trait BackendFailure: Send + 'static {
    fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self;
}

/// Runs `work` against a pooled connection on the blocking thread pool.
pub(crate) async fn run_blocking<T, E, F>(pool: &PgPool, work: F) -> Result<T, E>
where
    F: FnOnce(&mut PgConnection) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: BackendFailure,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut connection = pool.get().map_err(E::backend)?;
        work(&mut connection)
    })
    .await
    .map_err(E::backend)?
}
