//! Cached catalog of active products.
//!
//! Listing and facet requests filter an in-memory snapshot instead of
//! querying per request. The snapshot lives for 60 seconds, so admin edits
//! show up within a minute.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::{debug, instrument};

use ruchna_core::catalog::CatalogProduct;
use ruchna_core::{ProductId, VariantId};

use crate::db::{ProductRepository, RepositoryError};
use crate::models::catalog_products;

const CACHE_TTL: Duration = Duration::from_secs(60);

/// Read-through cache over the active catalog.
#[derive(Clone)]
pub struct CatalogCache {
    pool: PgPool,
    cache: Cache<(), Arc<Vec<CatalogProduct>>>,
}

impl CatalogCache {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            cache: Cache::builder()
                .max_capacity(1)
                .time_to_live(CACHE_TTL)
                .build(),
        }
    }

    /// All active products, from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if loading the catalog fails.
    pub async fn products(&self) -> Result<Arc<Vec<CatalogProduct>>, RepositoryError> {
        if let Some(hit) = self.cache.get(&()).await {
            return Ok(hit);
        }

        let catalog = self.load().await?;
        self.cache.insert((), Arc::clone(&catalog)).await;
        Ok(catalog)
    }

    #[instrument(skip(self))]
    async fn load(&self) -> Result<Arc<Vec<CatalogProduct>>, RepositoryError> {
        let repo = ProductRepository::new(&self.pool);

        let products = repo.list_active().await?;
        let product_ids: Vec<ProductId> = products.iter().map(|p| p.id).collect();
        let variants = repo.variants_for(&product_ids).await?;
        let variant_ids: Vec<VariantId> = variants.iter().map(|v| v.id).collect();
        let first_images = repo.first_images(&variant_ids).await?;

        let catalog = catalog_products(products, &variants, &first_images);
        debug!(products = catalog.len(), "Catalog snapshot loaded");
        Ok(Arc::new(catalog))
    }
}
