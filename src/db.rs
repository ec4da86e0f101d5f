//! Database connection pool and schema bootstrap.
//!
//! This module provides utilities for:
//! - Creating and managing a PostgreSQL connection pool
//! - Making sure the `items` table exists

use sqlx::{
    Pool, Postgres,
    postgres::{PgConnectOptions, PgPoolOptions},
};
use std::{str::FromStr, time::Duration};

/// Type alias for PostgreSQL connection pool.
pub type DbPool = Pool<Postgres>;

/// Create a new PostgreSQL connection pool.
///
/// A connection pool maintains multiple database connections that can be reused across HTTP requests which is much more efficient than opening a new connection for each request.
///
/// # Arguments
///
/// * `database_url` - PostgreSQL connection string
/// * `max_connections` - Upper bound on pooled connections
/// * `timeout` - Bound on waiting for a free connection, also sent to the
///   server as `statement_timeout` so no query holds a connection forever
///
/// # Errors
///
/// Returns an error if:
/// - Database connection string is invalid
/// - Cannot connect to PostgreSQL server
/// - Database authentication fails
pub async fn create_pool(
    database_url: &str,
    max_connections: u32,
    timeout: Duration,
) -> Result<DbPool, sqlx::Error> {
    let options = PgConnectOptions::from_str(database_url)?
        .options([("statement_timeout", format!("{}ms", timeout.as_millis()))]);

    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(timeout)
        .connect_with(options)
        .await
}

/// Create the `items` table if it is not there yet.
///
/// This is a single idempotent statement, not a migration runner. Schema
/// changes beyond this are managed outside the service.
pub async fn ensure_schema(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS items (
            id SERIAL PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
