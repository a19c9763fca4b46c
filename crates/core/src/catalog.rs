//! In-memory catalog filtering and sorting.
//!
//! The storefront keeps the active catalog in a short-lived cache and runs
//! every listing request through [`CatalogFilter::apply`]. The catalog is a
//! few hundred products at most, so a linear scan beats a round trip.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// A product as seen by the listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: ProductId,
    pub slug: String,
    pub name: String,
    pub product_type: String,
    pub product_group: Option<String>,
    /// Price after discount.
    pub price: Decimal,
    pub base_price: Decimal,
    pub discount_percent: u8,
    pub in_stock: bool,
    pub popularity: i32,
    /// Distinct colors across the product's variants.
    pub colors: Vec<String>,
    /// First image of the first variant, if any.
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Listing sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Popular,
    Cheap,
    #[serde(rename = "exp")]
    Expensive,
    New,
}

impl SortKey {
    /// Parse a query-string value; anything unrecognized sorts by popularity.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "cheap" => Self::Cheap,
            "exp" => Self::Expensive,
            "new" => Self::New,
            _ => Self::Popular,
        }
    }
}

impl<'de> Deserialize<'de> for SortKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Criteria for a listing request. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CatalogFilter {
    pub q: Option<String>,
    pub in_stock: bool,
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    pub color: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: SortKey,
}

impl CatalogFilter {
    /// Return the matching products in the requested order.
    #[must_use]
    pub fn apply(&self, products: &[CatalogProduct]) -> Vec<CatalogProduct> {
        let query = non_blank(self.q.as_deref()).map(str::to_lowercase);
        let product_type = non_blank(self.product_type.as_deref());
        let color = non_blank(self.color.as_deref());

        let (min, max) = match (self.min_price, self.max_price) {
            (Some(lo), Some(hi)) if lo > hi => (Some(hi), Some(lo)),
            bounds => bounds,
        };

        let mut matched: Vec<CatalogProduct> = products
            .iter()
            .filter(|p| query.as_deref().is_none_or(|q| matches_text(p, q)))
            .filter(|p| !self.in_stock || p.in_stock)
            .filter(|p| product_type.is_none_or(|t| same_label(&p.product_type, t)))
            .filter(|p| color.is_none_or(|c| p.colors.iter().any(|pc| same_label(pc, c))))
            .filter(|p| min.is_none_or(|lo| p.price >= lo))
            .filter(|p| max.is_none_or(|hi| p.price <= hi))
            .cloned()
            .collect();

        sort_products(&mut matched, self.sort);
        matched
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn matches_text(product: &CatalogProduct, query: &str) -> bool {
    [
        Some(product.name.as_str()),
        Some(product.slug.as_str()),
        Some(product.product_type.as_str()),
        product.product_group.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(query))
}

/// Case-insensitive label equality (Unicode aware, so Cyrillic colors match).
#[must_use]
pub fn same_label(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Sort in place by `key`; ties are broken by name.
pub fn sort_products(products: &mut [CatalogProduct], key: SortKey) {
    match key {
        SortKey::Popular => products.sort_by(|a, b| {
            b.popularity
                .cmp(&a.popularity)
                .then_with(|| a.name.cmp(&b.name))
        }),
        SortKey::Cheap => {
            products.sort_by(|a, b| a.price.cmp(&b.price).then_with(|| a.name.cmp(&b.name)));
        }
        SortKey::Expensive => {
            products.sort_by(|a, b| b.price.cmp(&a.price).then_with(|| a.name.cmp(&b.name)));
        }
        SortKey::New => products.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.name.cmp(&b.name))
        }),
    }
}

/// Values available to the filter UI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogFacets {
    pub types: Vec<String>,
    pub colors: Vec<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

impl CatalogFacets {
    /// Collect distinct types and colors (sorted) and the price span.
    #[must_use]
    pub fn collect(products: &[CatalogProduct]) -> Self {
        let types: BTreeSet<&str> = products.iter().map(|p| p.product_type.as_str()).collect();
        let colors: BTreeSet<&str> = products
            .iter()
            .flat_map(|p| p.colors.iter().map(String::as_str))
            .collect();

        Self {
            types: types.into_iter().map(str::to_owned).collect(),
            colors: colors.into_iter().map(str::to_owned).collect(),
            min_price: products.iter().map(|p| p.price).min(),
            max_price: products.iter().map(|p| p.price).max(),
        }
    }
}
