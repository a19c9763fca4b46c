//! Catalog writes.
//!
//! Product create and update run in one transaction each, with an extended
//! statement timeout since a product can carry dozens of variants, images
//! and addon links.

use std::collections::HashSet;

use sqlx::{PgPool, Postgres, Transaction};

use ruchna_core::{ProductId, VariantId};

use super::RepositoryError;
use crate::models::{
    AdminProduct, Product, ProductInput, ProductSummary, Variant, VariantImage, VariantInput,
};

const PRODUCT_COLUMNS: &str = r"
    id, slug, name, description, product_type, product_group, base_price,
    discount_percent, discount_uah, in_stock, popularity, is_active, created_at, updated_at
";

/// Repository for catalog management.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every product, inactive ones included, most recently edited first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<ProductSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductSummary>(
            r"
            SELECT p.id, p.slug, p.name, p.product_type, p.base_price, p.in_stock,
                   p.is_active, p.popularity, p.updated_at,
                   count(v.id) AS variant_count
            FROM shop.product p
            LEFT JOIN shop.product_variant v ON v.product_id = p.id
            GROUP BY p.id
            ORDER BY p.updated_at DESC, p.id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// A product with variants, images and addon links.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<AdminProduct>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM shop.product WHERE id = $1");
        let Some(product) = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
        else {
            return Ok(None);
        };

        let variants = sqlx::query_as::<_, Variant>(
            r"
            SELECT id, product_id, color, color_hex, sku, price, in_stock, sort_order
            FROM shop.product_variant
            WHERE product_id = $1
            ORDER BY sort_order, id
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        let images = sqlx::query_as::<_, VariantImage>(
            r"
            SELECT i.id, i.variant_id, i.url, i.public_id, i.sort_order
            FROM shop.product_variant_image i
            JOIN shop.product_variant v ON v.id = i.variant_id
            WHERE v.product_id = $1
            ORDER BY i.variant_id, i.sort_order, i.id
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        let addons: Vec<(VariantId, VariantId)> = sqlx::query_as(
            r"
            SELECT a.variant_id, a.addon_variant_id
            FROM shop.product_variant_addon a
            JOIN shop.product_variant v ON v.id = a.variant_id
            WHERE v.product_id = $1
            ORDER BY a.variant_id, a.sort_order
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some(AdminProduct::assemble(
            product, variants, images, addons,
        )))
    }

    /// Insert a product with its variants.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on a duplicate slug or SKU, or an
    /// addon pointing at a missing variant.
    pub async fn create(
        &self,
        slug: &str,
        input: &ProductInput,
    ) -> Result<ProductId, RepositoryError> {
        let mut tx = begin_long(self.pool).await?;

        let id: ProductId = sqlx::query_scalar(
            r"
            INSERT INTO shop.product (
                slug, name, description, product_type, product_group, base_price,
                discount_percent, discount_uah, in_stock, popularity, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
            ",
        )
        .bind(slug)
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.product_type.trim())
        .bind(input.product_group.as_deref().map(str::trim))
        .bind(input.base_price)
        .bind(input.discount_percent)
        .bind(input.discount_uah)
        .bind(input.in_stock)
        .bind(input.popularity)
        .bind(input.is_active)
        .fetch_one(&mut *tx)
        .await
        .map_err(RepositoryError::from_write)?;

        for (position, variant) in input.variants.iter().enumerate() {
            save_variant(&mut tx, id, position, variant).await?;
        }

        tx.commit().await?;
        Ok(id)
    }

    /// Replace a product's fields and reconcile its variants with `input`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist,
    /// `RepositoryError::Conflict` if a variant id belongs to another product
    /// or a unique constraint is hit.
    pub async fn update(
        &self,
        id: ProductId,
        slug: &str,
        input: &ProductInput,
    ) -> Result<(), RepositoryError> {
        let mut tx = begin_long(self.pool).await?;

        let updated: Option<ProductId> = sqlx::query_scalar(
            r"
            UPDATE shop.product
            SET slug = $2, name = $3, description = $4, product_type = $5,
                product_group = $6, base_price = $7, discount_percent = $8,
                discount_uah = $9, in_stock = $10, popularity = $11, is_active = $12,
                updated_at = now()
            WHERE id = $1
            RETURNING id
            ",
        )
        .bind(id)
        .bind(slug)
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.product_type.trim())
        .bind(input.product_group.as_deref().map(str::trim))
        .bind(input.base_price)
        .bind(input.discount_percent)
        .bind(input.discount_uah)
        .bind(input.in_stock)
        .bind(input.popularity)
        .bind(input.is_active)
        .fetch_optional(&mut *tx)
        .await
        .map_err(RepositoryError::from_write)?;

        if updated.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let existing: HashSet<VariantId> = sqlx::query_scalar::<_, VariantId>(
            "SELECT id FROM shop.product_variant WHERE product_id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .collect();

        let keep = kept_variants(&existing, &input.variants)?;
        let removed: Vec<i32> = existing
            .difference(&keep)
            .map(VariantId::as_i32)
            .collect();

        if !removed.is_empty() {
            sqlx::query("DELETE FROM shop.product_variant WHERE id = ANY($1)")
                .bind(&removed)
                .execute(&mut *tx)
                .await
                .map_err(RepositoryError::from_write)?;
            tracing::debug!(product_id = %id, removed = removed.len(), "Deleted variants");
        }

        for (position, variant) in input.variants.iter().enumerate() {
            save_variant(&mut tx, id, position, variant).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Delete a product; variants, images and addon links cascade.
    ///
    /// Order lines keep their snapshot and lose only the foreign key.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Start a transaction whose statements may run for up to 30 seconds.
async fn begin_long(pool: &PgPool) -> Result<Transaction<'static, Postgres>, RepositoryError> {
    let mut tx = pool.begin().await?;
    sqlx::query("SET LOCAL statement_timeout = '30s'")
        .execute(&mut *tx)
        .await?;
    Ok(tx)
}

/// Ids the payload keeps; every one must already belong to the product.
fn kept_variants(
    existing: &HashSet<VariantId>,
    variants: &[VariantInput],
) -> Result<HashSet<VariantId>, RepositoryError> {
    let mut keep = HashSet::new();
    for id in variants.iter().filter_map(|v| v.id) {
        if !existing.contains(&id) {
            return Err(RepositoryError::Conflict(format!(
                "variant {id} does not belong to this product"
            )));
        }
        keep.insert(id);
    }
    Ok(keep)
}

/// Upsert one variant, then replace its images and addon links.
async fn save_variant(
    tx: &mut Transaction<'static, Postgres>,
    product_id: ProductId,
    position: usize,
    variant: &VariantInput,
) -> Result<VariantId, RepositoryError> {
    let sort_order = i32::try_from(position).unwrap_or(i32::MAX);
    let color = variant.color.trim();
    let sku = variant.sku.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let variant_id: VariantId = match variant.id {
        Some(id) => sqlx::query_scalar(
            r"
            UPDATE shop.product_variant
            SET color = $3, color_hex = $4, sku = $5, price = $6, in_stock = $7, sort_order = $8
            WHERE id = $1 AND product_id = $2
            RETURNING id
            ",
        )
        .bind(id)
        .bind(product_id)
        .bind(color)
        .bind(variant.color_hex.as_deref())
        .bind(sku)
        .bind(variant.price)
        .bind(variant.in_stock)
        .bind(sort_order)
        .fetch_optional(&mut **tx)
        .await
        .map_err(RepositoryError::from_write)?
        .ok_or(RepositoryError::NotFound)?,
        None => sqlx::query_scalar(
            r"
            INSERT INTO shop.product_variant (product_id, color, color_hex, sku, price, in_stock, sort_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            ",
        )
        .bind(product_id)
        .bind(color)
        .bind(variant.color_hex.as_deref())
        .bind(sku)
        .bind(variant.price)
        .bind(variant.in_stock)
        .bind(sort_order)
        .fetch_one(&mut **tx)
        .await
        .map_err(RepositoryError::from_write)?,
    };

    sqlx::query("DELETE FROM shop.product_variant_image WHERE variant_id = $1")
        .bind(variant_id)
        .execute(&mut **tx)
        .await?;
    for (index, image) in variant.images.iter().enumerate() {
        sqlx::query(
            r"
            INSERT INTO shop.product_variant_image (variant_id, url, public_id, sort_order)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(variant_id)
        .bind(image.url.trim())
        .bind(image.public_id.as_deref())
        .bind(i32::try_from(index).unwrap_or(i32::MAX))
        .execute(&mut **tx)
        .await?;
    }

    sqlx::query("DELETE FROM shop.product_variant_addon WHERE variant_id = $1")
        .bind(variant_id)
        .execute(&mut **tx)
        .await?;
    for (index, addon) in variant.addons.iter().enumerate() {
        sqlx::query(
            r"
            INSERT INTO shop.product_variant_addon (variant_id, addon_variant_id, sort_order)
            VALUES ($1, $2, $3)
            ON CONFLICT (variant_id, addon_variant_id) DO NOTHING
            ",
        )
        .bind(variant_id)
        .bind(addon.addon_variant_id)
        .bind(i32::try_from(index).unwrap_or(i32::MAX))
        .execute(&mut **tx)
        .await
        .map_err(RepositoryError::from_write)?;
    }

    Ok(variant_id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn variant(id: Option<i32>) -> VariantInput {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "color": "Чорний",
        }))
        .unwrap()
    }

    #[test]
    fn test_kept_variants() {
        let existing: HashSet<VariantId> = [1, 2, 3].into_iter().map(VariantId::new).collect();

        let keep = kept_variants(&existing, &[variant(Some(1)), variant(None), variant(Some(3))])
            .unwrap();
        assert_eq!(keep.len(), 2);
        assert!(!keep.contains(&VariantId::new(2)));

        let foreign = kept_variants(&existing, &[variant(Some(99))]);
        assert!(matches!(foreign, Err(RepositoryError::Conflict(ref m)) if m.contains("99")));

        assert!(kept_variants(&existing, &[]).unwrap().is_empty());
    }
}
