//! Admin API tests that never reach the database.
//!
//! Requests without a session cookie never load a session record, so the
//! lazy pool stays unconnected.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::json;

use ruchna_integration_tests::{admin, lazy_pool, request, send};

#[tokio::test]
async fn test_health() {
    let app = admin(lazy_pool());
    let response = send(&app, request(Method::GET, "/health", None)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "ok");
}

#[tokio::test]
async fn test_protected_routes_require_login() {
    let app = admin(lazy_pool());
    let product = json!({"name": "Шопер", "product_type": "bag", "base_price": 900});
    let status = json!({"status": "fulfilled"});

    let cases = [
        (Method::GET, "/api/admin/products", None),
        (Method::POST, "/api/admin/products", Some(&product)),
        (Method::GET, "/api/admin/products/1", None),
        (Method::PUT, "/api/admin/products/1", Some(&product)),
        (Method::DELETE, "/api/admin/products/1", None),
        (Method::GET, "/api/admin/orders", None),
        (Method::GET, "/api/admin/orders/1", None),
        (Method::PATCH, "/api/admin/orders/1/status", Some(&status)),
        (Method::GET, "/api/admin/preorders", None),
        (Method::POST, "/api/admin/uploads", None),
    ];

    for (method, uri, body) in cases {
        let response = send(&app, request(method.clone(), uri, body)).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(response.body["error"], "Login required", "{method} {uri}");
    }
}

#[tokio::test]
async fn test_session_probe_without_cookie() {
    let app = admin(lazy_pool());
    let response = send(&app, request(Method::GET, "/api/admin/session", None)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({"authenticated": false}));
}

#[tokio::test]
async fn test_wrong_password_is_rejected() {
    let app = admin(lazy_pool());
    let body = json!({"password": "definitely-not-it"});
    let response = send(&app, request(Method::POST, "/api/admin/login", Some(&body))).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "Invalid password");
    assert!(response.cookie().is_none());
}

#[tokio::test]
async fn test_login_is_rate_limited() {
    let app = admin(lazy_pool());
    let body = json!({"password": "guess"});

    let mut limited = false;
    for _ in 0..10 {
        let response =
            send(&app, request(Method::POST, "/api/admin/login", Some(&body))).await;
        if response.status == StatusCode::TOO_MANY_REQUESTS {
            limited = true;
            break;
        }
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }
    assert!(limited, "login limiter never tripped");
}
