//! Database connection pool and migration management.
//!
//! This module provides utilities for:
//! - Creating and managing a PostgreSQL connection pool for the key store
//! - Running database migrations automatically
//!
//! Connection establishment applies a bounded retry (3 attempts, fixed
//! 3-second delay). The retry lives here at the store boundary only; core
//! logic never retries.

use std::time::Duration;

use sqlx::{Pool, Postgres};

/// Type alias for PostgreSQL connection pool.
///
/// Instead of writing `Pool<Postgres>` everywhere, we can use `DbPool`.
pub type DbPool = Pool<Postgres>;

/// How many times to attempt the initial key store connection.
const CONNECT_ATTEMPTS: u32 = 3;

/// Fixed delay between connection attempts.
const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Create a new PostgreSQL connection pool for the key store.
///
/// A connection pool maintains multiple database connections that can be
/// reused across HTTP requests which is much more efficient than opening a
/// new connection for each request.
///
/// # Arguments
///
/// * `database_url` - PostgreSQL connection string
///
/// # Configuration
///
/// - Maximum connections: 5 (configurable via PgPoolOptions)
/// - Transient connection failures are retried up to 3 times with a fixed
///   3-second delay before the final error is surfaced
///
/// # Errors
///
/// Returns an error if, after the retries are exhausted:
/// - Database connection string is invalid
/// - Cannot connect to PostgreSQL server
/// - Database authentication fails
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    let mut attempt = 1;

    loop {
        match sqlx::postgres::PgPoolOptions::new()
            // Limit concurrent connections
            .max_connections(5)
            .connect(database_url)
            .await
        {
            Ok(pool) => return Ok(pool),
            Err(err) if attempt < CONNECT_ATTEMPTS => {
                tracing::warn!(attempt, error = %err, "key store connection failed, retrying");
                tokio::time::sleep(CONNECT_RETRY_DELAY).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Run database migrations from the `migrations/` directory.
///
/// This function executes all SQL migration files in order. Migrations are
/// tracked in a special `_sqlx_migrations` table, so each migration runs only
/// once.
///
/// # Arguments
///
/// * `pool` - Database connection pool
///
/// # Errors
///
/// Returns an error if:
/// - Migration files cannot be read
/// - SQL syntax errors in migration files
/// - Database errors during migration execution
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    // The macro reads migrations at compile time from ./migrations directory
    sqlx::migrate!("./migrations").run(pool).await
}
