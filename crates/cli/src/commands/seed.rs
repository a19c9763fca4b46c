//! Seed the catalog from a YAML file.
//!
//! The file holds a `products` list in the same shape the admin API accepts:
//!
//! ```yaml
//! products:
//!   - name: Сумка Ярина
//!     product_type: bag
//!     base_price: 1850
//!     variants:
//!       - color: Чорний
//!         color_hex: "#111111"
//!         images:
//!           - url: https://res.cloudinary.com/ruchna/image/upload/yaryna-black.jpg
//! ```
//!
//! Products whose slug already exists are skipped, so a file can be loaded
//! more than once.

use std::path::Path;

use secrecy::ExposeSecret;
use serde::Deserialize;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use validator::Validate;

use ruchna_admin::db::{ProductRepository, RepositoryError};
use ruchna_admin::error::flatten_validation_errors;
use ruchna_admin::models::ProductInput;
use ruchna_core::slug::slugify;

use super::database_url;

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Seed file could not be read.
    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    /// Seed file is not valid YAML for a catalog.
    #[error("Invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// One or more products failed validation.
    #[error("{0} invalid products in seed file")]
    Invalid(usize),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Insert failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Deserialize)]
pub struct CatalogSeed {
    pub products: Vec<ProductInput>,
}

/// Parse a seed file and pair every product with its slug.
///
/// Problems are logged per product and counted.
fn prepare(content: &str) -> Result<Vec<(String, ProductInput)>, SeedError> {
    let seed: CatalogSeed = serde_yaml::from_str(content)?;

    let mut invalid = 0;
    let mut ready = Vec::with_capacity(seed.products.len());

    for (index, product) in seed.products.into_iter().enumerate() {
        let mut problems = product
            .validate()
            .map(|()| Default::default())
            .unwrap_or_else(|e| flatten_validation_errors(&e));
        problems.extend(product.cross_field_problems());

        let slug = product
            .slug
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map_or_else(|| slugify(&product.name), ToString::to_string);
        if slug.is_empty() {
            problems
                .entry("slug".to_string())
                .or_default()
                .push("could not derive a slug from the name".to_string());
        }

        if problems.is_empty() {
            ready.push((slug, product));
        } else {
            invalid += 1;
            for (field, messages) in problems {
                tracing::error!(product = index, name = %product.name, %field, "{}", messages.join("; "));
            }
        }
    }

    if invalid > 0 {
        return Err(SeedError::Invalid(invalid));
    }
    Ok(ready)
}

/// Insert products from `path`.
///
/// # Errors
///
/// Returns an error if the file is unreadable or invalid, or an insert fails
/// for a reason other than an existing slug.
pub async fn catalog(path: &Path) -> Result<(), SeedError> {
    tracing::info!(path = %path.display(), "Loading catalog seed");
    let content = tokio::fs::read_to_string(path).await?;
    let products = prepare(&content)?;
    tracing::info!(products = products.len(), "Seed file validated");

    let url = database_url("ADMIN_DATABASE_URL")
        .ok_or(SeedError::MissingEnvVar("ADMIN_DATABASE_URL"))?;
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(url.expose_secret())
        .await?;
    let repo = ProductRepository::new(&pool);

    let mut inserted = 0;
    let mut skipped = 0;
    for (slug, product) in &products {
        match repo.create(slug, product).await {
            Ok(id) => {
                inserted += 1;
                tracing::info!(product_id = %id, %slug, "Inserted product");
            }
            Err(RepositoryError::Conflict(what)) => {
                skipped += 1;
                tracing::warn!(%slug, %what, "Skipped existing product");
            }
            Err(e) => return Err(e.into()),
        }
    }

    tracing::info!(inserted, skipped, "Catalog seeding complete");
    Ok(())
}
