//! Catalog reads.

use std::collections::HashMap;

use sqlx::PgPool;

use ruchna_core::{ProductId, VariantId};

use super::RepositoryError;
use crate::models::{AddonLink, PricedVariant, Product, Variant, VariantImage};

const PRODUCT_COLUMNS: &str = "id, slug, name, description, product_type, product_group, \
     base_price, discount_percent, discount_uah, in_stock, popularity, is_active, \
     created_at, updated_at";

/// Repository for catalog queries.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All active products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product WHERE is_active ORDER BY id"
        );
        let rows = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// An active product by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product WHERE slug = $1 AND is_active"
        );
        let row = sqlx::query_as::<_, Product>(&sql)
            .bind(slug)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Variants of the given products, in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn variants_for(
        &self,
        product_ids: &[ProductId],
    ) -> Result<Vec<Variant>, RepositoryError> {
        let ids: Vec<i32> = product_ids.iter().map(ProductId::as_i32).collect();
        let rows = sqlx::query_as::<_, Variant>(
            r"
            SELECT id, product_id, color, color_hex, sku, price, in_stock, sort_order
            FROM shop.product_variant
            WHERE product_id = ANY($1)
            ORDER BY product_id, sort_order, id
            ",
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Images of the given variants, in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn images_for(
        &self,
        variant_ids: &[VariantId],
    ) -> Result<Vec<VariantImage>, RepositoryError> {
        let ids: Vec<i32> = variant_ids.iter().map(VariantId::as_i32).collect();
        let rows = sqlx::query_as::<_, VariantImage>(
            r"
            SELECT id, variant_id, url, public_id, sort_order
            FROM shop.product_variant_image
            WHERE variant_id = ANY($1)
            ORDER BY variant_id, sort_order, id
            ",
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// First image URL of each of the given variants.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn first_images(
        &self,
        variant_ids: &[VariantId],
    ) -> Result<HashMap<VariantId, String>, RepositoryError> {
        let ids: Vec<i32> = variant_ids.iter().map(VariantId::as_i32).collect();
        let rows: Vec<(VariantId, String)> = sqlx::query_as(
            r"
            SELECT DISTINCT ON (variant_id) variant_id, url
            FROM shop.product_variant_image
            WHERE variant_id = ANY($1)
            ORDER BY variant_id, sort_order, id
            ",
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().collect())
    }

    /// Addon suggestions for the given variants, limited to active products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn addons_for(
        &self,
        variant_ids: &[VariantId],
    ) -> Result<Vec<AddonLink>, RepositoryError> {
        let ids: Vec<i32> = variant_ids.iter().map(VariantId::as_i32).collect();
        let rows = sqlx::query_as::<_, AddonLink>(
            r"
            SELECT a.variant_id,
                   a.addon_variant_id,
                   p.slug AS product_slug,
                   p.name AS product_name,
                   v.color,
                   v.price AS variant_price,
                   p.base_price,
                   p.discount_percent,
                   p.discount_uah,
                   (p.in_stock AND v.in_stock) AS in_stock,
                   (SELECT i.url FROM shop.product_variant_image i
                     WHERE i.variant_id = v.id
                     ORDER BY i.sort_order, i.id LIMIT 1) AS image_url
            FROM shop.product_variant_addon a
            JOIN shop.product_variant v ON v.id = a.addon_variant_id
            JOIN shop.product p ON p.id = v.product_id
            WHERE a.variant_id = ANY($1) AND p.is_active
            ORDER BY a.variant_id, a.sort_order
            ",
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Variants joined with their products, keyed by variant ID.
    ///
    /// Unknown IDs are simply absent from the map.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn priced_variants(
        &self,
        variant_ids: &[VariantId],
    ) -> Result<HashMap<VariantId, PricedVariant>, RepositoryError> {
        let ids: Vec<i32> = variant_ids.iter().map(VariantId::as_i32).collect();
        let rows = sqlx::query_as::<_, PricedVariant>(
            r"
            SELECT v.id AS variant_id,
                   p.id AS product_id,
                   p.slug AS product_slug,
                   p.name AS product_name,
                   p.is_active AS product_active,
                   p.in_stock AS product_in_stock,
                   v.color,
                   v.sku,
                   v.price AS variant_price,
                   v.in_stock AS variant_in_stock,
                   p.base_price,
                   p.discount_percent,
                   p.discount_uah
            FROM shop.product_variant v
            JOIN shop.product p ON p.id = v.product_id
            WHERE v.id = ANY($1)
            ",
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(|r| (r.variant_id, r)).collect())
    }
}
