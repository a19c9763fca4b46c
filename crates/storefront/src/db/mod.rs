//! Database operations for the storefront.
//!
//! # Schema: `shop`
//!
//! - `product`, `product_variant`, `product_variant_image`, `product_variant_addon` - Catalog
//! - `order`, `order_item` - Orders with price snapshots
//! - `preorder_lead` - Contact captures for unavailable items
//!
//! The storefront reads the catalog and writes orders and leads. Catalog
//! writes belong to the admin.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p ruchna-cli -- migrate storefront
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
pub use orders::{OrderRepository, PaymentUpdate};
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

    /// Constraint violation (e.g., duplicate order number).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Whether an error is a unique-constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
