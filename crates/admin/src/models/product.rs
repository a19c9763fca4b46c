//! Catalog rows, the admin product view and the product edit payload.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

use ruchna_core::catalog::same_label;
use ruchna_core::discount::resolve_percent;
use ruchna_core::{ProductId, VariantId, VariantImageId};

use crate::error::FieldErrors;

/// A row of `shop.product`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub product_type: String,
    pub product_group: Option<String>,
    pub base_price: Decimal,
    pub discount_percent: Option<Decimal>,
    pub discount_uah: Option<Decimal>,
    pub in_stock: bool,
    pub popularity: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row of `shop.product_variant`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Variant {
    pub id: VariantId,
    #[serde(skip)]
    pub product_id: ProductId,
    pub color: String,
    pub color_hex: Option<String>,
    pub sku: Option<String>,
    pub price: Option<Decimal>,
    pub in_stock: bool,
    pub sort_order: i32,
}

/// A row of `shop.product_variant_image`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VariantImage {
    pub id: VariantImageId,
    #[serde(skip)]
    pub variant_id: VariantId,
    pub url: String,
    pub public_id: Option<String>,
    pub sort_order: i32,
}

/// Product list row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub slug: String,
    pub name: String,
    pub product_type: String,
    pub base_price: Decimal,
    pub in_stock: bool,
    pub is_active: bool,
    pub popularity: i32,
    pub variant_count: i64,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Views
// =============================================================================

/// Product with everything the edit form needs.
#[derive(Debug, Clone, Serialize)]
pub struct AdminProduct {
    #[serde(flatten)]
    pub product: Product,
    /// Canonical percent the storefront applies.
    pub effective_discount_percent: u8,
    pub variants: Vec<AdminVariant>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminVariant {
    #[serde(flatten)]
    pub variant: Variant,
    pub images: Vec<VariantImage>,
    pub addon_variant_ids: Vec<VariantId>,
}

impl AdminProduct {
    /// Group variant images and addon links under their variants.
    #[must_use]
    pub fn assemble(
        product: Product,
        variants: Vec<Variant>,
        images: Vec<VariantImage>,
        addons: Vec<(VariantId, VariantId)>,
    ) -> Self {
        let mut images_by_variant: HashMap<VariantId, Vec<VariantImage>> = HashMap::new();
        for image in images {
            images_by_variant
                .entry(image.variant_id)
                .or_default()
                .push(image);
        }

        let mut addons_by_variant: HashMap<VariantId, Vec<VariantId>> = HashMap::new();
        for (variant_id, addon_id) in addons {
            addons_by_variant.entry(variant_id).or_default().push(addon_id);
        }

        let variants = variants
            .into_iter()
            .map(|variant| AdminVariant {
                images: images_by_variant.remove(&variant.id).unwrap_or_default(),
                addon_variant_ids: addons_by_variant.remove(&variant.id).unwrap_or_default(),
                variant,
            })
            .collect();

        Self {
            effective_discount_percent: resolve_percent(
                product.base_price,
                product.discount_percent,
                product.discount_uah,
            ),
            product,
            variants,
        }
    }
}

// =============================================================================
// Input
// =============================================================================

const fn default_true() -> bool {
    true
}

/// Create or full-update payload for a product and its variants.
///
/// On update, variants with an `id` are updated in place, variants without
/// one are inserted, and stored variants missing from the list are deleted.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProductInput {
    /// Generated from the name when omitted.
    #[validate(length(max = 80, message = "slug is too long"), custom(function = "slug_chars"))]
    pub slug: Option<String>,
    #[validate(length(min = 1, max = 200, message = "name must be 1 to 200 characters"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 10000, message = "description is too long"))]
    pub description: String,
    #[validate(length(min = 1, max = 100, message = "type is required"))]
    pub product_type: String,
    #[validate(length(max = 100))]
    pub product_group: Option<String>,
    #[validate(custom(function = "non_negative"))]
    pub base_price: Decimal,
    #[validate(custom(function = "percent"))]
    pub discount_percent: Option<Decimal>,
    #[validate(custom(function = "non_negative"))]
    pub discount_uah: Option<Decimal>,
    #[serde(default = "default_true")]
    pub in_stock: bool,
    #[serde(default)]
    pub popularity: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    #[validate(length(max = 50, message = "at most 50 variants"), nested)]
    pub variants: Vec<VariantInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VariantInput {
    /// Existing variant to update; `None` inserts a new one.
    pub id: Option<VariantId>,
    #[validate(length(min = 1, max = 100, message = "color is required"))]
    pub color: String,
    #[validate(custom(function = "hex_color"))]
    pub color_hex: Option<String>,
    #[validate(length(min = 1, max = 64, message = "sku must be 1 to 64 characters"))]
    pub sku: Option<String>,
    #[validate(custom(function = "non_negative"))]
    pub price: Option<Decimal>,
    #[serde(default = "default_true")]
    pub in_stock: bool,
    #[serde(default)]
    #[validate(length(max = 30, message = "at most 30 images"), nested)]
    pub images: Vec<ImageInput>,
    #[serde(default)]
    #[validate(length(max = 20, message = "at most 20 addons"), nested)]
    pub addons: Vec<AddonInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ImageInput {
    #[validate(url(message = "must be an absolute URL"))]
    pub url: String,
    #[validate(length(max = 255))]
    pub public_id: Option<String>,
}

/// Cross-sell link to another variant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct AddonInput {
    pub addon_variant_id: VariantId,
}

impl ProductInput {
    /// Checks that span several variants.
    ///
    /// Duplicate variant ids, duplicate colors (Unicode case-insensitive) and
    /// a variant listed as its own addon.
    #[must_use]
    pub fn cross_field_problems(&self) -> FieldErrors {
        let mut problems = FieldErrors::new();
        let mut seen_ids = HashSet::new();
        let mut seen_colors: Vec<&str> = Vec::new();

        for (index, variant) in self.variants.iter().enumerate() {
            if let Some(id) = variant.id
                && !seen_ids.insert(id)
            {
                problems
                    .entry(format!("variants[{index}].id"))
                    .or_default()
                    .push("variant listed twice".to_string());
            }

            let color = variant.color.trim();
            if seen_colors.iter().any(|c| same_label(c, color)) {
                problems
                    .entry(format!("variants[{index}].color"))
                    .or_default()
                    .push("duplicate color".to_string());
            }
            seen_colors.push(color);

            if let Some(id) = variant.id
                && variant.addons.iter().any(|a| a.addon_variant_id == id)
            {
                problems
                    .entry(format!("variants[{index}].addons"))
                    .or_default()
                    .push("a variant cannot be its own addon".to_string());
            }
        }

        problems
    }
}

fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("range").with_message("must not be negative".into()));
    }
    Ok(())
}

fn percent(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO || *value > Decimal::ONE_HUNDRED {
        return Err(ValidationError::new("range").with_message("must be between 0 and 100".into()));
    }
    Ok(())
}

fn hex_color(value: &str) -> Result<(), ValidationError> {
    let digits = value.strip_prefix('#').unwrap_or("");
    if matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(ValidationError::new("color_hex").with_message("must look like #a1b2c3".into()))
    }
}

fn slug_chars(value: &str) -> Result<(), ValidationError> {
    let ok = !value.is_empty()
        && !value.starts_with('-')
        && !value.ends_with('-')
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if ok {
        Ok(())
    } else {
        Err(ValidationError::new("slug")
            .with_message("use lowercase latin letters, digits and dashes".into()))
    }
}
