//! Database operations for the admin API.
//!
//! # Schemas
//!
//! - `shop` - Catalog, orders and leads, shared with the storefront.
//!   The admin is the only writer of catalog rows.
//! - `admin` - `session` table for tower-sessions.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p ruchna-cli -- migrate admin
//! ```

pub mod leads;
pub mod orders;
pub mod products;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use leads::LeadRepository;
pub use orders::{OrderRepository, StatusChange};
pub use products::ProductRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate slug or SKU).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Turn unique and foreign-key violations into `Conflict`.
    pub(crate) fn from_write(err: sqlx::Error) -> Self {
        if let Some(db) = err.as_database_error()
            && (db.is_unique_violation() || db.is_foreign_key_violation())
        {
            return Self::Conflict(
                db.constraint()
                    .map_or_else(|| db.message().to_string(), ToString::to_string),
            );
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
