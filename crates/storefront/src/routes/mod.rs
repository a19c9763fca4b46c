//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! # Catalog
//! GET  /api/products                      - Filtered, sorted product listing
//! GET  /api/products/facets               - Filter facets
//! GET  /api/products/{slug}               - Product page payload
//!
//! # Checkout
//! POST /api/cart/quote                    - Price a browser-held cart
//! POST /api/orders                        - Place an order
//! GET  /api/orders/{order_number}         - Public order summary
//! POST /api/preorders                     - Leave a preorder lead
//!
//! # Payments
//! POST /api/payments/{provider}/session   - Start a hosted checkout
//! POST /api/payments/liqpay/callback      - LiqPay server callback
//! POST /api/payments/wayforpay/callback   - WayForPay server callback
//! POST /api/payments/fondy/callback       - Fondy server callback
//! GET|POST /api/payments/{provider}/return - Browser return redirect
//!
//! # Delivery
//! GET  /api/nova-poshta/cities            - Settlement search
//! GET  /api/nova-poshta/warehouses        - Branches of a settlement
//! ```
//!
//! Writes are behind the strict checkout limiter, reads behind the general
//! one. Provider callbacks and returns are not rate limited.

pub mod cart;
pub mod input;
pub mod nova_poshta;
pub mod orders;
pub mod payments;
pub mod preorders;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{api_rate_limiter, checkout_rate_limiter};
use crate::state::AppState;

/// Create the catalog and lookup routes router.
pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/products/facets", get(products::facets))
        .route("/products/{slug}", get(products::show))
        .route("/cart/quote", post(cart::quote))
        .route("/orders/{order_number}", get(orders::show))
        .route("/nova-poshta/cities", get(nova_poshta::cities))
        .route("/nova-poshta/warehouses", get(nova_poshta::warehouses))
        .layer(api_rate_limiter())
}

/// Create the routes router for actions that write orders or leads.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", post(orders::create))
        .route("/preorders", post(preorders::create))
        .route(
            "/payments/{provider}/session",
            post(payments::create_session),
        )
        .layer(checkout_rate_limiter())
}

/// Create the payment provider routes router.
pub fn provider_routes() -> Router<AppState> {
    Router::new()
        .route("/liqpay/callback", post(payments::liqpay_callback))
        .route("/wayforpay/callback", post(payments::wayforpay_callback))
        .route("/fondy/callback", post(payments::fondy_callback))
        .route(
            "/{provider}/return",
            get(payments::return_to_site).post(payments::return_to_site),
        )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new().nest(
        "/api",
        Router::new()
            .merge(read_routes())
            .merge(checkout_routes())
            .nest("/payments", provider_routes()),
    )
}
