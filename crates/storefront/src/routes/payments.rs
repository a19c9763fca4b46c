//! Payment route handlers.
//!
//! Sessions are created for pending orders only. Provider callbacks are the
//! single place where an order's payment status changes; browser returns
//! just redirect back to the site.
//!
//! Callbacks answer `200 ok` to anything they cannot authenticate or parse,
//! so providers stop retrying garbage. Database failures still surface as
//! 500 so a genuine callback is redelivered.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State, rejection::JsonRejection},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use ruchna_core::{OrderStatus, PaymentProvider, uah};

use crate::db::{OrderRepository, PaymentUpdate};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::Order;
use crate::services::payments::{
    CheckoutLine, CheckoutOrder, CheckoutSession, CheckoutUrls, PaymentError, PaymentSignal,
};
use crate::services::telegram;
use crate::state::AppState;

/// Body of the acknowledgement for callbacks that change nothing.
const OK: &str = "ok";

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub order_number: String,
}

#[derive(Debug, Deserialize)]
pub struct ReturnQuery {
    pub order: Option<String>,
}

/// `POST /api/payments/{provider}/session`
#[instrument(skip(state, payload))]
pub async fn create_session(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    payload: std::result::Result<Json<SessionRequest>, JsonRejection>,
) -> Result<Json<CheckoutSession>> {
    let provider: PaymentProvider = provider
        .parse()
        .map_err(|_| AppError::NotFound("Payment provider".to_string()))?;
    let Json(request) = payload?;

    let repo = OrderRepository::new(state.pool());
    let order = repo
        .get_by_number(request.order_number.trim())
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

    if order.status != OrderStatus::Pending {
        return Err(AppError::BadRequest(format!(
            "Order {} is not awaiting payment",
            order.order_number
        )));
    }

    let items = repo.items(order.id).await?;
    let checkout = CheckoutOrder {
        order_number: order.order_number.clone(),
        total: order.total,
        created_at: order.created_at,
        lines: items
            .into_iter()
            .map(|item| CheckoutLine {
                name: format!("{} ({})", item.product_name, item.variant_color),
                quantity: item.quantity,
                unit_price: item.unit_price,
            })
            .collect(),
    };
    let urls = checkout_urls(&state.config().base_url, provider, &order.order_number);

    let session = match provider {
        PaymentProvider::LiqPay => state.liqpay()?.checkout(&checkout, &urls)?,
        PaymentProvider::WayForPay => state.wayforpay()?.checkout(&checkout, &urls)?,
        PaymentProvider::Fondy => state.fondy()?.checkout(&checkout, &urls).await?,
    };

    repo.set_payment_method(order.id, provider.into()).await?;
    tracing::info!(order_number = %order.order_number, %provider, "Payment session created");

    Ok(Json(session))
}

/// `POST /api/payments/liqpay/callback`
#[instrument(skip_all)]
pub async fn liqpay_callback(State(state): State<AppState>, body: Bytes) -> Result<&'static str> {
    let verified = state
        .liqpay()
        .and_then(|client| client.verify_callback(&body));
    if let Some(signal) = accept(PaymentProvider::LiqPay, verified) {
        apply(&state, PaymentProvider::LiqPay, signal).await?;
    }
    Ok(OK)
}

/// `POST /api/payments/wayforpay/callback`
///
/// Verified callbacks get the signed `accept` reply; without it WayForPay
/// keeps retrying.
#[instrument(skip_all)]
pub async fn wayforpay_callback(State(state): State<AppState>, body: Bytes) -> Result<Response> {
    let Ok(client) = state.wayforpay() else {
        tracing::warn!("WayForPay callback received but WayForPay is not configured");
        return Ok(OK.into_response());
    };

    let Some(signal) = accept(PaymentProvider::WayForPay, client.verify_callback(&body)) else {
        return Ok(OK.into_response());
    };

    let order_reference = signal.order_number.clone();
    apply(&state, PaymentProvider::WayForPay, signal).await?;

    let ack = client.acknowledge(&order_reference, chrono::Utc::now().timestamp())?;
    Ok(Json(ack).into_response())
}

/// `POST /api/payments/fondy/callback`
#[instrument(skip_all)]
pub async fn fondy_callback(State(state): State<AppState>, body: Bytes) -> Result<&'static str> {
    let verified = state
        .fondy()
        .and_then(|client| client.verify_callback(&body));
    if let Some(signal) = accept(PaymentProvider::Fondy, verified) {
        apply(&state, PaymentProvider::Fondy, signal).await?;
    }
    Ok(OK)
}

/// `GET|POST /api/payments/{provider}/return`
///
/// Sends the browser to the site's result page. Never touches the order.
pub async fn return_to_site(
    State(state): State<AppState>,
    Path(_provider): Path<String>,
    Query(query): Query<ReturnQuery>,
) -> Redirect {
    let order = query.order.unwrap_or_default();
    let encoded: String = url::form_urlencoded::byte_serialize(order.trim().as_bytes()).collect();
    Redirect::to(&format!(
        "{}/checkout/result?order={encoded}",
        state.config().site_url
    ))
}

/// Callback and return URLs for one order.
#[must_use]
pub fn checkout_urls(base_url: &str, provider: PaymentProvider, order_number: &str) -> CheckoutUrls {
    let encoded: String = url::form_urlencoded::byte_serialize(order_number.as_bytes()).collect();
    CheckoutUrls {
        callback_url: format!("{base_url}/api/payments/{provider}/callback"),
        return_url: format!("{base_url}/api/payments/{provider}/return?order={encoded}"),
    }
}

/// Log and drop callbacks that fail verification.
fn accept(
    provider: PaymentProvider,
    verified: std::result::Result<PaymentSignal, PaymentError>,
) -> Option<PaymentSignal> {
    match verified {
        Ok(signal) => {
            add_breadcrumb(
                "payment",
                "Verified callback",
                Some(&[
                    ("provider", provider.as_str()),
                    ("order_number", signal.order_number.as_str()),
                ]),
            );
            Some(signal)
        }
        Err(e) => {
            tracing::warn!(%provider, error = %e, "Rejected payment callback");
            None
        }
    }
}

/// Whether a callback's amount and currency match the order snapshot.
#[must_use]
pub fn matches_order(signal: &PaymentSignal, order: &Order) -> bool {
    uah(signal.amount) == uah(order.total) && signal.currency.eq_ignore_ascii_case(&order.currency)
}

async fn apply(state: &AppState, provider: PaymentProvider, signal: PaymentSignal) -> Result<()> {
    let repo = OrderRepository::new(state.pool());

    let Some(order) = repo.get_by_number(&signal.order_number).await? else {
        tracing::warn!(%provider, order_number = %signal.order_number, "Callback for unknown order");
        return Ok(());
    };

    if !matches_order(&signal, &order) {
        tracing::warn!(
            %provider,
            order_number = %order.order_number,
            expected = %order.total,
            received = %signal.amount,
            currency = %signal.currency,
            "Callback amount does not match order, ignoring"
        );
        return Ok(());
    }

    let update = repo
        .apply_payment_signal(
            &order.order_number,
            signal.status,
            signal.reference.as_deref(),
            &signal.payload,
        )
        .await?;

    match update {
        PaymentUpdate::Updated(status) => {
            tracing::info!(%provider, order_number = %order.order_number, %status, "Order payment status updated");
            if status == OrderStatus::Paid {
                let text = telegram::order_paid_message(&order, provider);
                state.notify(move |bot| async move { bot.send_message(&text).await });
            }
        }
        PaymentUpdate::Unchanged(status) => {
            tracing::info!(
                %provider,
                order_number = %order.order_number,
                %status,
                signal = %signal.status,
                "Callback left order unchanged"
            );
        }
    }
    Ok(())
}
