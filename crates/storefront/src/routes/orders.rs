//! Order route handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;
use validator::Validate;

use ruchna_core::{Email, PaymentMethod, PaymentProvider};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::models::{NewOrder, OrderSummary};
use crate::routes::cart::{LineInput, price_lines};
use crate::routes::input::{Problems, non_blank, trimmed_name};
use crate::services::telegram;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CustomerInput {
    #[validate(custom(function = "trimmed_name"))]
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
}

/// Nova Poshta destination as picked in the checkout form.
#[derive(Debug, Deserialize, Validate)]
pub struct ShippingInput {
    #[validate(length(min = 1, max = 64, message = "city is required"))]
    pub city_ref: String,
    #[validate(length(min = 1, max = 200, message = "city is required"))]
    pub city_name: String,
    #[validate(length(min = 1, max = 64, message = "warehouse is required"))]
    pub warehouse_ref: String,
    #[validate(length(min = 1, max = 300, message = "warehouse is required"))]
    pub warehouse_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(nested)]
    pub customer: CustomerInput,
    #[validate(nested)]
    pub shipping: ShippingInput,
    #[validate(
        length(min = 1, max = 50, message = "order must have 1 to 50 lines"),
        nested
    )]
    pub items: Vec<LineInput>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[validate(length(max = 1000, message = "comment is too long"))]
    pub comment: Option<String>,
}

/// `POST /api/orders`
///
/// Prices the cart, snapshots it into a new order and tells the staff chat.
#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderSummary>)> {
    let Json(request) = payload?;

    let mut problems = Problems::of(&request);
    let phone = problems.phone("customer.phone", &request.customer.phone);
    let email = problems.email("customer.email", request.customer.email.as_deref());
    if let Some(provider) = request.payment_method.provider()
        && !provider_configured(&state, provider)
    {
        problems.add("payment_method", format!("{provider} is not available"));
    }
    problems.finish("Invalid order")?;
    let phone = phone.ok_or_else(|| AppError::Internal("phone missing after validation".into()))?;

    let quote = price_lines(&state, &request.items).await?;

    let new_order = NewOrder {
        customer_name: request.customer.name.trim().to_string(),
        customer_phone: phone.to_string(),
        customer_email: email.map(Email::into_inner),
        np_city_ref: request.shipping.city_ref.trim().to_string(),
        np_city_name: request.shipping.city_name.trim().to_string(),
        np_warehouse_ref: request.shipping.warehouse_ref.trim().to_string(),
        np_warehouse_name: request.shipping.warehouse_name.trim().to_string(),
        payment_method: request.payment_method,
        comment: non_blank(request.comment),
    };

    let repo = OrderRepository::new(state.pool());
    let order = repo.create(&new_order, &quote).await?;
    tracing::info!(
        order_number = %order.order_number,
        total = %order.total,
        lines = quote.lines.len(),
        "Order created"
    );

    let text = telegram::order_created_message(&order, &quote);
    state.notify(move |bot| async move { bot.send_message(&text).await });

    let items = repo.items(order.id).await?;
    Ok((StatusCode::CREATED, Json(OrderSummary::new(order, items))))
}

/// `GET /api/orders/{order_number}`
///
/// Public summary for the checkout result page. Knowing the order number is
/// enough, so no customer contact details are included.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> Result<Json<OrderSummary>> {
    let repo = OrderRepository::new(state.pool());
    let order = repo
        .get_by_number(order_number.trim())
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;
    let items = repo.items(order.id).await?;

    Ok(Json(OrderSummary::new(order, items)))
}

fn provider_configured(state: &AppState, provider: PaymentProvider) -> bool {
    match provider {
        PaymentProvider::LiqPay => state.liqpay().is_ok(),
        PaymentProvider::WayForPay => state.wayforpay().is_ok(),
        PaymentProvider::Fondy => state.fondy().is_ok(),
    }
}
