//! SQLite connection pool.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::DbError;

/// Type alias for the shared pool used across the whole application.
pub type DbPool = SqlitePool;

/// Pool tuning knobs.
#[derive(Debug, Clone)]
pub struct PoolOptions {
    pub max_connections: u32,
    /// How long a request waits for a connection before giving up.
    pub acquire_timeout: Duration,
    /// How long a writer waits for another writer's lock before giving up.
    pub busy_timeout: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
        }
    }
}

/// Create a new connection pool from the given `database_url`.
///
/// Foreign keys are enforced on every connection; a missing database file is
/// created when the URL carries `mode=rwc`.  The journal runs in WAL mode so
/// readers never wait on the single writer.
pub async fn create_pool(database_url: &str, options: PoolOptions) -> Result<DbPool, DbError> {
    info!("Connecting to database (max_connections={})", options.max_connections);
    let connect = SqliteConnectOptions::from_str(database_url)?
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(options.busy_timeout);
    let pool = SqlitePoolOptions::new()
        .max_connections(options.max_connections)
        .acquire_timeout(options.acquire_timeout)
        .connect_with(connect)
        .await?;
    Ok(pool)
}

/// Open a private in-memory database with all migrations applied.
///
/// The pool holds a single connection, so every caller shares the same
/// database for as long as the pool lives.
pub async fn connect_in_memory() -> Result<DbPool, DbError> {
    let url = format!(
        "sqlite:file:walkoff_{}?mode=memory&cache=shared",
        uuid::Uuid::new_v4().simple()
    );
    let connect = SqliteConnectOptions::from_str(&url)?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(connect)
        .await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

/// Run embedded SQLx migrations located in `./migrations` (relative to the
/// workspace root at build time).
pub async fn run_migrations(pool: &DbPool) -> Result<(), DbError> {
    info!("Running database migrations");
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}
