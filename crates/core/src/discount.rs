//! Discount resolution.
//!
//! Products carry either an explicit `discount_percent` or, for rows created
//! before that column existed, a `discount_uah` value. The legacy column was
//! used inconsistently: small values were percents typed into the wrong
//! field, larger ones were fixed hryvnia amounts. [`resolve_percent`] folds
//! both into one canonical percent.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal::prelude::ToPrimitive;

use crate::types::money::uah;

/// Resolve the canonical discount percent in `0..=100`.
///
/// ```
/// use ruchna_core::discount::resolve_percent;
/// use rust_decimal::Decimal;
///
/// let price = Decimal::from(1000);
/// assert_eq!(resolve_percent(price, Some(Decimal::new(125, 1)), None), 13);
/// assert_eq!(resolve_percent(price, None, Some(Decimal::from(15))), 15);
/// assert_eq!(resolve_percent(price, None, Some(Decimal::from(250))), 25);
/// ```
#[must_use]
pub fn resolve_percent(
    base_price: Decimal,
    discount_percent: Option<Decimal>,
    legacy_discount_uah: Option<Decimal>,
) -> u8 {
    if let Some(percent) = discount_percent {
        return clamp_percent(percent);
    }

    let Some(value) = legacy_discount_uah else {
        return 0;
    };

    if value <= Decimal::ZERO || base_price <= Decimal::ZERO {
        return 0;
    }

    if value <= Decimal::ONE_HUNDRED && value < base_price {
        return clamp_percent(value);
    }

    clamp_percent(value / base_price * Decimal::ONE_HUNDRED)
}

/// Price after a percent discount, rounded to kopecks.
#[must_use]
pub fn apply_discount(price: Decimal, percent: u8) -> Decimal {
    let percent = Decimal::from(percent.min(100));
    uah(price * (Decimal::ONE_HUNDRED - percent) / Decimal::ONE_HUNDRED)
}

fn clamp_percent(value: Decimal) -> u8 {
    let rounded = value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
    rounded.to_u8().unwrap_or(0)
}
