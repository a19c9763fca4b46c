//! Money helpers.
//!
//! All prices are hryvnia amounts held as [`Decimal`]. Payment providers
//! want either a plain decimal string (LiqPay, WayForPay) or an integer
//! amount in kopecks (Fondy).

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// ISO 4217 code of the only currency the shop sells in.
pub const CURRENCY: &str = "UAH";

/// Round an amount to whole kopecks, midpoint away from zero.
///
/// ```
/// use ruchna_core::uah;
/// use rust_decimal::Decimal;
///
/// assert_eq!(uah(Decimal::new(12_345, 3)), Decimal::new(1235, 2));
/// ```
#[must_use]
pub fn uah(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert an amount to kopecks.
///
/// Returns `None` if the amount does not fit in an `i64`.
#[must_use]
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    (uah(amount) * Decimal::ONE_HUNDRED).to_i64()
}

/// Render an amount the way it is placed into signed provider payloads.
///
/// Trailing zeros are dropped so `1500.00` renders as `1500` and `99.50`
/// as `99.5`, matching what the provider echoes back in JSON numbers.
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    uah(amount).normalize().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uah_rounds_midpoint_away_from_zero() {
        assert_eq!(uah(Decimal::new(10_005, 3)), Decimal::new(1001, 2));
        assert_eq!(uah(Decimal::new(10_004, 3)), Decimal::new(1000, 2));
        assert_eq!(uah(Decimal::new(-10_005, 3)), Decimal::new(-1001, 2));
    }

    #[test]
    fn test_to_minor_units() {
        assert_eq!(to_minor_units(Decimal::new(154_736, 2)), Some(154_736));
        assert_eq!(to_minor_units(Decimal::from(1500)), Some(150_000));
        assert_eq!(to_minor_units(Decimal::new(1, 3)), Some(0));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(Decimal::new(150_000, 2)), "1500");
        assert_eq!(format_amount(Decimal::new(9950, 2)), "99.5");
        assert_eq!(format_amount(Decimal::new(154_736, 2)), "1547.36");
    }
}
