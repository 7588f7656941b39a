//! Database connection pool management
//!
//! Uses sqlx SqlitePool with explicit connection limits. Every connection
//! enforces foreign keys so enrollment rows cascade with their owners.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};

use super::migrations;

/// Default maximum connections for the pool.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Default database location, relative to the working directory.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://registrar.db";

/// How long a writer waits for the database lock before giving up.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Create a SQLite connection pool.
///
/// # Arguments
///
/// * `database_url` - SQLite connection string (`sqlite://path.db` or `sqlite::memory:`)
///
/// # Errors
///
/// Returns an error if the URL is invalid or the connection fails.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool("sqlite://registrar.db").await?;
/// ```
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    create_pool_with_options(database_url, DEFAULT_MAX_CONNECTIONS).await
}

/// Create a SQLite connection pool with custom options.
///
/// In-memory databases live inside a single connection, so they are pinned
/// to one connection that is never recycled regardless of `max_connections`.
///
/// # Arguments
///
/// * `database_url` - SQLite connection string
/// * `max_connections` - Maximum number of connections in the pool
pub async fn create_pool_with_options(
    database_url: &str,
    max_connections: u32,
) -> Result<SqlitePool, sqlx::Error> {
    let in_memory = is_memory_url(database_url);

    let mut options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(DEFAULT_BUSY_TIMEOUT);
    if !in_memory {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(max_connections.max(1))
    };

    pool_options.connect_with(options).await
}

/// Fresh in-memory database with the schema applied.
pub async fn create_memory_pool() -> Result<SqlitePool, sqlx::Error> {
    let pool = create_pool("sqlite::memory:").await?;
    migrations::run(&pool).await?;
    Ok(pool)
}

/// Begin a write transaction holding the database write lock from the start.
///
/// Checks made inside it see the state the commit applies to. Competing
/// writers wait up to the busy timeout for the lock.
pub(crate) async fn begin_write(
    pool: &SqlitePool,
) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
    pool.begin_with("BEGIN IMMEDIATE").await
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}
