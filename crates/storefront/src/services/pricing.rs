//! Cart pricing.
//!
//! Turns `(variant, quantity)` lines into priced snapshots using the live
//! catalog. The same quote backs `POST /api/cart/quote` and order creation,
//! so what the customer saw is what gets stored.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ruchna_core::discount::apply_discount;
use ruchna_core::{CURRENCY, ProductId, VariantId, uah};

use crate::models::PricedVariant;

/// A requested cart line.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct CartLine {
    pub variant_id: VariantId,
    pub quantity: i32,
}

/// A priced line, as snapshotted into `shop.order_item`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotedLine {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub product_name: String,
    pub product_slug: String,
    pub variant_color: String,
    pub sku: Option<String>,
    pub base_unit_price: Decimal,
    pub discount_percent: u8,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

/// Priced cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub lines: Vec<QuotedLine>,
    /// Sum of undiscounted line prices.
    pub subtotal: Decimal,
    pub discount_total: Decimal,
    pub total: Decimal,
    pub currency: &'static str,
}

/// Per-line problems, keyed like validation errors (`items[2].variant_id`).
pub type LineIssues = BTreeMap<String, Vec<String>>;

/// Price `lines` against `variants`.
///
/// # Errors
///
/// Returns every unknown or unavailable line at once so the client can
/// flag all of them.
pub fn quote(
    lines: &[CartLine],
    variants: &HashMap<VariantId, PricedVariant>,
) -> Result<Quote, LineIssues> {
    let mut issues = LineIssues::new();
    let mut quoted = Vec::with_capacity(lines.len());

    for (index, line) in lines.iter().enumerate() {
        let key = format!("items[{index}].variant_id");

        let Some(variant) = variants.get(&line.variant_id) else {
            issues
                .entry(key)
                .or_default()
                .push(format!("variant {} does not exist", line.variant_id));
            continue;
        };

        if !variant.available() {
            issues.entry(key).or_default().push(format!(
                "{} ({}) is out of stock",
                variant.product_name, variant.color
            ));
            continue;
        }

        let base_unit_price = variant.base_unit_price();
        let discount_percent = variant.discount();
        let unit_price = apply_discount(base_unit_price, discount_percent);

        quoted.push(QuotedLine {
            product_id: variant.product_id,
            variant_id: variant.variant_id,
            product_name: variant.product_name.clone(),
            product_slug: variant.product_slug.clone(),
            variant_color: variant.color.clone(),
            sku: variant.sku.clone(),
            base_unit_price,
            discount_percent,
            unit_price,
            quantity: line.quantity,
            line_total: uah(unit_price * Decimal::from(line.quantity)),
        });
    }

    if !issues.is_empty() {
        return Err(issues);
    }

    let subtotal = uah(quoted
        .iter()
        .map(|l| l.base_unit_price * Decimal::from(l.quantity))
        .sum());
    let total: Decimal = quoted.iter().map(|l| l.line_total).sum();

    Ok(Quote {
        lines: quoted,
        subtotal,
        discount_total: subtotal - total,
        total,
        currency: CURRENCY,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn priced(id: i32, base: i64, variant_price: Option<i64>, discount: Option<i64>) -> PricedVariant {
        PricedVariant {
            variant_id: VariantId::new(id),
            product_id: ProductId::new(id * 10),
            product_slug: format!("product-{id}"),
            product_name: format!("Product {id}"),
            product_active: true,
            product_in_stock: true,
            color: "Black".to_string(),
            sku: Some(format!("SKU-{id}")),
            variant_price: variant_price.map(Decimal::from),
            variant_in_stock: true,
            base_price: Decimal::from(base),
            discount_percent: discount.map(Decimal::from),
            discount_uah: None,
        }
    }

    fn catalog(variants: Vec<PricedVariant>) -> HashMap<VariantId, PricedVariant> {
        variants.into_iter().map(|v| (v.variant_id, v)).collect()
    }

    fn line(id: i32, quantity: i32) -> CartLine {
        CartLine {
            variant_id: VariantId::new(id),
            quantity,
        }
    }

    #[test]
    fn test_quote_totals() {
        let variants = catalog(vec![
            priced(1, 1000, None, Some(10)),
            priced(2, 500, Some(650), None),
        ]);

        let quote = quote(&[line(1, 2), line(2, 1)], &variants).unwrap();

        assert_eq!(quote.lines.len(), 2);
        assert_eq!(quote.lines[0].unit_price, Decimal::from(900));
        assert_eq!(quote.lines[0].line_total, Decimal::from(1800));
        assert_eq!(quote.lines[1].base_unit_price, Decimal::from(650));
        assert_eq!(quote.subtotal, Decimal::from(2650));
        assert_eq!(quote.total, Decimal::from(2450));
        assert_eq!(quote.discount_total, Decimal::from(200));
        assert_eq!(quote.currency, "UAH");
    }

    #[test]
    fn test_quote_reports_every_bad_line() {
        let mut sold_out = priced(2, 500, None, None);
        sold_out.variant_in_stock = false;
        let mut hidden = priced(3, 500, None, None);
        hidden.product_active = false;
        let variants = catalog(vec![priced(1, 1000, None, None), sold_out, hidden]);

        let issues = quote(&[line(1, 1), line(2, 1), line(3, 1), line(99, 1)], &variants)
            .unwrap_err();

        assert_eq!(
            issues.keys().map(String::as_str).collect::<Vec<_>>(),
            [
                "items[1].variant_id",
                "items[2].variant_id",
                "items[3].variant_id"
            ]
        );
        assert!(issues["items[3].variant_id"][0].contains("does not exist"));
        assert!(issues["items[1].variant_id"][0].contains("out of stock"));
    }
}
