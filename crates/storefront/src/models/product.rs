//! Catalog rows and the views built from them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use ruchna_core::catalog::{CatalogProduct, same_label};
use ruchna_core::discount::{apply_discount, resolve_percent};
use ruchna_core::{ProductId, VariantId, VariantImageId};

/// A row of `shop.product`.
#[derive(Debug, Clone, FromRow)]
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

impl Product {
    /// Canonical discount percent for this product.
    #[must_use]
    pub fn discount(&self) -> u8 {
        resolve_percent(self.base_price, self.discount_percent, self.discount_uah)
    }
}

/// A row of `shop.product_variant`.
#[derive(Debug, Clone, FromRow)]
pub struct Variant {
    pub id: VariantId,
    pub product_id: ProductId,
    pub color: String,
    pub color_hex: Option<String>,
    pub sku: Option<String>,
    /// Overrides the product base price when set.
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
    #[serde(skip)]
    pub public_id: Option<String>,
    #[serde(skip)]
    pub sort_order: i32,
}

/// An addon link joined with the addon's variant and product.
#[derive(Debug, Clone, FromRow)]
pub struct AddonLink {
    pub variant_id: VariantId,
    pub addon_variant_id: VariantId,
    pub product_slug: String,
    pub product_name: String,
    pub color: String,
    pub variant_price: Option<Decimal>,
    pub base_price: Decimal,
    pub discount_percent: Option<Decimal>,
    pub discount_uah: Option<Decimal>,
    pub in_stock: bool,
    pub image_url: Option<String>,
}

/// A variant joined with its product, as needed to price a cart line.
#[derive(Debug, Clone, FromRow)]
pub struct PricedVariant {
    pub variant_id: VariantId,
    pub product_id: ProductId,
    pub product_slug: String,
    pub product_name: String,
    pub product_active: bool,
    pub product_in_stock: bool,
    pub color: String,
    pub sku: Option<String>,
    pub variant_price: Option<Decimal>,
    pub variant_in_stock: bool,
    pub base_price: Decimal,
    pub discount_percent: Option<Decimal>,
    pub discount_uah: Option<Decimal>,
}

impl PricedVariant {
    /// Undiscounted unit price: the variant override or the product base price.
    #[must_use]
    pub fn base_unit_price(&self) -> Decimal {
        self.variant_price.unwrap_or(self.base_price)
    }

    /// Discount percent, resolved against the product base price.
    #[must_use]
    pub fn discount(&self) -> u8 {
        resolve_percent(self.base_price, self.discount_percent, self.discount_uah)
    }

    /// Whether the line can be sold right now.
    #[must_use]
    pub const fn available(&self) -> bool {
        self.product_active && self.product_in_stock && self.variant_in_stock
    }
}

// =============================================================================
// Views
// =============================================================================

/// Full product page payload.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    pub id: ProductId,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub product_type: String,
    pub product_group: Option<String>,
    pub base_price: Decimal,
    pub discount_percent: u8,
    pub price: Decimal,
    pub in_stock: bool,
    pub variants: Vec<VariantDetail>,
}

/// One color option on the product page.
#[derive(Debug, Clone, Serialize)]
pub struct VariantDetail {
    pub id: VariantId,
    pub color: String,
    pub color_hex: Option<String>,
    pub sku: Option<String>,
    pub base_price: Decimal,
    pub price: Decimal,
    pub in_stock: bool,
    pub images: Vec<VariantImage>,
    pub addons: Vec<AddonView>,
}

/// A cross-sell suggestion attached to a variant.
#[derive(Debug, Clone, Serialize)]
pub struct AddonView {
    pub variant_id: VariantId,
    pub product_slug: String,
    pub product_name: String,
    pub color: String,
    pub price: Decimal,
    pub in_stock: bool,
    pub image_url: Option<String>,
}

impl From<AddonLink> for AddonView {
    fn from(link: AddonLink) -> Self {
        let discount = resolve_percent(link.base_price, link.discount_percent, link.discount_uah);
        Self {
            variant_id: link.addon_variant_id,
            price: apply_discount(link.variant_price.unwrap_or(link.base_price), discount),
            product_slug: link.product_slug,
            product_name: link.product_name,
            color: link.color,
            in_stock: link.in_stock,
            image_url: link.image_url,
        }
    }
}

/// Product-level stock: the product flag, and at least one variant in stock
/// when the product has variants.
fn product_in_stock(product: &Product, variants: &[&Variant]) -> bool {
    product.in_stock && (variants.is_empty() || variants.iter().any(|v| v.in_stock))
}

/// Lowest undiscounted price a variant sells at, or the base price when
/// the product has no variants.
fn starting_price(product: &Product, variants: &[&Variant]) -> Decimal {
    variants
        .iter()
        .map(|v| v.price.unwrap_or(product.base_price))
        .min()
        .unwrap_or(product.base_price)
}

impl ProductDetail {
    /// Assemble the product page from its rows.
    ///
    /// Images and addons are expected in display order.
    #[must_use]
    pub fn assemble(
        product: Product,
        variants: Vec<Variant>,
        images: Vec<VariantImage>,
        addons: Vec<AddonLink>,
    ) -> Self {
        let discount = product.discount();

        let mut images_by_variant: HashMap<VariantId, Vec<VariantImage>> = HashMap::new();
        for image in images {
            images_by_variant.entry(image.variant_id).or_default().push(image);
        }

        let mut addons_by_variant: HashMap<VariantId, Vec<AddonView>> = HashMap::new();
        for addon in addons {
            addons_by_variant
                .entry(addon.variant_id)
                .or_default()
                .push(addon.into());
        }

        let variant_refs: Vec<&Variant> = variants.iter().collect();
        let in_stock = product_in_stock(&product, &variant_refs);
        let lowest = starting_price(&product, &variant_refs);

        let variants = variants
            .into_iter()
            .map(|v| {
                let base_price = v.price.unwrap_or(product.base_price);
                VariantDetail {
                    images: images_by_variant.remove(&v.id).unwrap_or_default(),
                    addons: addons_by_variant.remove(&v.id).unwrap_or_default(),
                    id: v.id,
                    color: v.color,
                    color_hex: v.color_hex,
                    sku: v.sku,
                    base_price,
                    price: apply_discount(base_price, discount),
                    in_stock: product.in_stock && v.in_stock,
                }
            })
            .collect();

        Self {
            id: product.id,
            slug: product.slug,
            name: product.name,
            description: product.description,
            product_type: product.product_type,
            product_group: product.product_group,
            price: apply_discount(lowest, discount),
            base_price: lowest,
            discount_percent: discount,
            in_stock,
            variants,
        }
    }
}

/// Build listing entries from active products and their variants.
///
/// `first_images` maps a variant to its first image URL.
#[must_use]
pub fn catalog_products(
    products: Vec<Product>,
    variants: &[Variant],
    first_images: &HashMap<VariantId, String>,
) -> Vec<CatalogProduct> {
    let mut by_product: HashMap<ProductId, Vec<&Variant>> = HashMap::new();
    for variant in variants {
        by_product.entry(variant.product_id).or_default().push(variant);
    }

    products
        .into_iter()
        .map(|product| {
            let own = by_product.remove(&product.id).unwrap_or_default();
            let discount = product.discount();

            let mut colors: Vec<String> = Vec::new();
            for variant in &own {
                if !colors.iter().any(|c| same_label(c, &variant.color)) {
                    colors.push(variant.color.clone());
                }
            }

            let image_url = own.iter().find_map(|v| first_images.get(&v.id).cloned());
            let lowest = starting_price(&product, &own);

            CatalogProduct {
                id: product.id,
                in_stock: product_in_stock(&product, &own),
                price: apply_discount(lowest, discount),
                base_price: lowest,
                discount_percent: discount,
                slug: product.slug,
                name: product.name,
                product_type: product.product_type,
                product_group: product.product_group,
                popularity: product.popularity,
                colors,
                image_url,
                created_at: product.created_at,
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ruchna_core::catalog::CatalogFilter;

    use super::*;

    fn product() -> Product {
        Product {
            id: ProductId::new(1),
            slug: "tote".to_string(),
            name: "Tote".to_string(),
            description: String::new(),
            product_type: "bag".to_string(),
            product_group: None,
            base_price: Decimal::from(1000),
            discount_percent: None,
            discount_uah: Some(Decimal::from(200)),
            in_stock: true,
            popularity: 5,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn variant(id: i32, color: &str, price: Option<i64>, in_stock: bool) -> Variant {
        Variant {
            id: VariantId::new(id),
            product_id: ProductId::new(1),
            color: color.to_string(),
            color_hex: None,
            sku: None,
            price: price.map(Decimal::from),
            in_stock,
            sort_order: id,
        }
    }

    #[test]
    fn test_assemble_prices_variants_with_product_discount() {
        let detail = ProductDetail::assemble(
            product(),
            vec![
                variant(10, "Black", None, true),
                variant(11, "Olive", Some(1200), false),
            ],
            vec![VariantImage {
                id: VariantImageId::new(1),
                variant_id: VariantId::new(11),
                url: "https://img/olive.jpg".to_string(),
                public_id: None,
                sort_order: 0,
            }],
            Vec::new(),
        );

        // 200 UAH legacy amount on 1000 UAH = 20%.
        assert_eq!(detail.discount_percent, 20);
        assert_eq!(detail.price, Decimal::from(800));
        assert!(detail.in_stock);

        let olive = &detail.variants[1];
        assert_eq!(olive.base_price, Decimal::from(1200));
        assert_eq!(olive.price, Decimal::from(960));
        assert!(!olive.in_stock);
        assert_eq!(olive.images.len(), 1);
        assert!(detail.variants[0].images.is_empty());
    }

    #[test]
    fn test_catalog_products_stock_colors_and_image() {
        let variants = vec![
            variant(10, "Black", None, false),
            variant(11, "black", None, false),
            variant(12, "Sand", None, false),
        ];
        let images = HashMap::from([(VariantId::new(12), "https://img/sand.jpg".to_string())]);

        let listed = catalog_products(vec![product()], &variants, &images);
        let entry = &listed[0];

        assert!(!entry.in_stock, "no variant in stock");
        assert_eq!(entry.colors, ["Black", "Sand"]);
        assert_eq!(entry.image_url.as_deref(), Some("https://img/sand.jpg"));
        assert_eq!(entry.price, Decimal::from(800));
    }

    #[test]
    fn test_listing_price_follows_variant_overrides() {
        let mut cheap = product();
        cheap.base_price = Decimal::from(500);
        cheap.discount_uah = None;

        let pricier = vec![variant(10, "Black", Some(900), true)];
        let listed = catalog_products(vec![cheap.clone()], &pricier, &HashMap::new());
        assert_eq!(listed[0].base_price, Decimal::from(900));
        assert_eq!(listed[0].price, Decimal::from(900));

        let filter = CatalogFilter {
            max_price: Some(Decimal::from(600)),
            ..CatalogFilter::default()
        };
        assert!(filter.apply(&listed).is_empty());

        let mixed = vec![
            variant(10, "Black", Some(900), true),
            variant(11, "Sand", Some(700), true),
        ];
        let listed = catalog_products(vec![cheap.clone()], &mixed, &HashMap::new());
        assert_eq!(listed[0].price, Decimal::from(700));

        let listed = catalog_products(vec![cheap], &[], &HashMap::new());
        assert_eq!(listed[0].price, Decimal::from(500));
    }
}
