//! Cart pricing route.
//!
//! The browser keeps the cart itself; this endpoint prices it against the
//! live catalog so the drawer and checkout show server-side totals.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use validator::Validate;

use ruchna_core::VariantId;

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::routes::input::Problems;
use crate::services::pricing::{self, CartLine, Quote};
use crate::state::AppState;

/// One requested line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct LineInput {
    pub variant_id: VariantId,
    #[validate(range(min = 1, max = 99, message = "quantity must be between 1 and 99"))]
    pub quantity: i32,
}

impl From<LineInput> for CartLine {
    fn from(line: LineInput) -> Self {
        Self {
            variant_id: line.variant_id,
            quantity: line.quantity,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct QuoteRequest {
    #[validate(
        length(min = 1, max = 50, message = "cart must have 1 to 50 lines"),
        nested
    )]
    pub items: Vec<LineInput>,
}

/// Price `lines` against the live catalog.
///
/// # Errors
///
/// Returns `AppError::Validation` listing every unknown or sold-out line.
pub async fn price_lines(state: &AppState, lines: &[LineInput]) -> Result<Quote> {
    let ids: Vec<VariantId> = lines.iter().map(|l| l.variant_id).collect();
    let variants = ProductRepository::new(state.pool())
        .priced_variants(&ids)
        .await?;

    let lines: Vec<CartLine> = lines.iter().copied().map(CartLine::from).collect();
    pricing::quote(&lines, &variants)
        .map_err(|issues| AppError::validation("Some items are unavailable", issues))
}

/// `POST /api/cart/quote`
#[instrument(skip(state, payload))]
pub async fn quote(
    State(state): State<AppState>,
    payload: std::result::Result<Json<QuoteRequest>, JsonRejection>,
) -> Result<Json<Quote>> {
    let Json(request) = payload?;
    Problems::of(&request).finish("Invalid cart")?;

    let quote = price_lines(&state, &request.items).await?;
    Ok(Json(quote))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::flatten_validation_errors;

    fn request(lines: usize, quantity: i32) -> QuoteRequest {
        QuoteRequest {
            items: (1..=lines)
                .map(|i| LineInput {
                    variant_id: VariantId::new(i32::try_from(i).unwrap()),
                    quantity,
                })
                .collect(),
        }
    }

    #[test]
    fn test_line_count_bounds() {
        assert!(request(1, 1).validate().is_ok());
        assert!(request(50, 99).validate().is_ok());

        for lines in [0, 51] {
            let details = flatten_validation_errors(&request(lines, 1).validate().unwrap_err());
            assert_eq!(
                details.get("items").unwrap(),
                &vec!["cart must have 1 to 50 lines".to_string()]
            );
        }
    }

    #[test]
    fn test_quantity_reported_per_line() {
        let details = flatten_validation_errors(&request(2, 100).validate().unwrap_err());
        assert!(details.contains_key("items[0].quantity"));
        assert!(details.contains_key("items[1].quantity"));
    }
}
