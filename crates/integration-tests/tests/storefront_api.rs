//! Storefront API tests that never reach the database.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode, header};
use serde_json::json;

use ruchna_integration_tests::{lazy_pool, request, send, storefront};

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health() {
    let app = storefront(lazy_pool());
    let response = send(&app, request(Method::GET, "/health", None)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "ok");
    assert_eq!(
        response.headers.get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert!(response.headers.contains_key("x-request-id"));
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_order_validation_reports_every_field() {
    let app = storefront(lazy_pool());
    let body = json!({
        "customer": {"name": " ", "phone": "12345", "email": "not-an-email"},
        "shipping": {"city_ref": "", "city_name": "", "warehouse_ref": "", "warehouse_name": ""},
        "items": [],
        "payment_method": "liqpay"
    });
    let response = send(&app, request(Method::POST, "/api/orders", Some(&body))).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let details = &response.body["details"];
    for field in [
        "customer.name",
        "customer.phone",
        "customer.email",
        "shipping.city_ref",
        "items",
        "payment_method",
    ] {
        assert!(details.get(field).is_some(), "missing problem for {field}");
    }
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = storefront(lazy_pool());
    let response = send(
        &app,
        axum::http::Request::builder()
            .method(Method::POST)
            .uri("/api/orders")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", "203.0.113.11")
            .body(axum::body::Body::from("{\"customer\":"))
            .unwrap(),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["error"].is_string());
}

#[tokio::test]
async fn test_cart_quote_rejects_bad_lines() {
    let app = storefront(lazy_pool());

    let empty = json!({"items": []});
    let response = send(&app, request(Method::POST, "/api/cart/quote", Some(&empty))).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let zero = json!({"items": [{"variant_id": 1, "quantity": 0}]});
    let response = send(&app, request(Method::POST, "/api/cart/quote", Some(&zero))).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["details"]["items[0].quantity"].is_array());
}

#[tokio::test]
async fn test_preorder_requires_valid_phone() {
    let app = storefront(lazy_pool());
    let body = json!({"name": "Олена", "phone": "call me"});
    let response = send(&app, request(Method::POST, "/api/preorders", Some(&body))).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["details"]["phone"].is_array());
}

#[tokio::test]
async fn test_nova_poshta_lookups_need_input() {
    let app = storefront(lazy_pool());

    let response = send(
        &app,
        request(Method::GET, "/api/nova-poshta/cities?q=%D0%9A", None),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["details"]["q"].is_array());

    let response = send(
        &app,
        request(Method::GET, "/api/nova-poshta/warehouses", None),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Payments
// =============================================================================

#[tokio::test]
async fn test_unknown_provider_session_is_not_found() {
    let app = storefront(lazy_pool());
    let body = json!({"order_number": "RC-260301-ABC123"});
    let response = send(
        &app,
        request(Method::POST, "/api/payments/paypal/session", Some(&body)),
    )
    .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_callbacks_acknowledge_garbage() {
    let app = storefront(lazy_pool());

    for provider in ["liqpay", "wayforpay", "fondy"] {
        let response = send(
            &app,
            axum::http::Request::builder()
                .method(Method::POST)
                .uri(format!("/api/payments/{provider}/callback"))
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(axum::body::Body::from("data=garbage&signature=nope"))
                .unwrap(),
        )
        .await;

        assert_eq!(response.status, StatusCode::OK, "{provider}");
        assert_eq!(response.body, "ok", "{provider}");
    }
}

#[tokio::test]
async fn test_return_redirects_to_site() {
    let app = storefront(lazy_pool());
    let response = send(
        &app,
        request(
            Method::GET,
            "/api/payments/liqpay/return?order=RC-260301-ABC123",
            None,
        ),
    )
    .await;

    assert!(response.status.is_redirection());
    assert_eq!(
        response.headers.get(header::LOCATION).unwrap(),
        "http://localhost:5173/checkout/result?order=RC-260301-ABC123"
    );
}
