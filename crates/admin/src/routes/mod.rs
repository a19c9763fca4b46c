//! HTTP route handlers for the admin API.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST   /api/admin/login               - Exchange the admin password for a session
//! POST   /api/admin/logout              - End the session
//! GET    /api/admin/session             - Whether the session is logged in
//!
//! # Catalog
//! GET    /api/admin/products            - All products, inactive included
//! POST   /api/admin/products            - Create a product with variants
//! GET    /api/admin/products/{id}       - Product with variants, images, addons
//! PUT    /api/admin/products/{id}       - Replace a product and reconcile variants
//! DELETE /api/admin/products/{id}       - Delete a product
//! POST   /api/admin/uploads             - Upload an image to Cloudinary
//!
//! # Orders
//! GET    /api/admin/orders              - Paginated orders, optional status filter
//! GET    /api/admin/orders/{id}         - Order with lines and payment payload
//! PATCH  /api/admin/orders/{id}/status  - Manual status change
//!
//! # Leads
//! GET    /api/admin/preorders           - Paginated preorder leads
//! ```
//!
//! Everything except login and the session probe requires `RequireAdminAuth`.

pub mod auth;
pub mod orders;
pub mod preorders;
pub mod products;
pub mod uploads;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
};

use crate::middleware::login_rate_limiter;
use crate::state::AppState;

/// Largest accepted image upload.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            post(auth::login).layer(login_rate_limiter()),
        )
        .route("/logout", post(auth::logout))
        .route("/session", get(auth::session))
}

/// Create the catalog management routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index).post(products::create))
        .route(
            "/products/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::destroy),
        )
        .route(
            "/uploads",
            post(uploads::create).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024)),
        )
}

/// Create the order and lead routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(orders::index))
        .route("/orders/{id}", get(orders::show))
        .route("/orders/{id}/status", patch(orders::update_status))
        .route("/preorders", get(preorders::index))
}

/// Create all routes for admin.
pub fn routes() -> Router<AppState> {
    Router::new().nest(
        "/api/admin",
        Router::new()
            .merge(auth_routes())
            .merge(catalog_routes())
            .merge(order_routes()),
    )
}
