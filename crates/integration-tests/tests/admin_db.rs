//! Database-backed admin flows.
//!
//! Require a migrated database at `DATABASE_URL`; run with `--ignored`.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode, header};
use serde_json::{Value, json};

use ruchna_admin::db::{OrderRepository, ProductRepository, StatusChange};
use ruchna_core::{OrderId, OrderStatus};
use ruchna_integration_tests::{ADMIN_PASSWORD, TestResponse, admin, live_pool, request, send};

/// Unique enough for repeated runs against one database.
fn unique(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .subsec_nanos();
    format!("{prefix}-{nanos}")
}

async fn call(
    app: &axum::Router,
    cookie: &str,
    method: Method,
    uri: &str,
    body: Option<&Value>,
) -> TestResponse {
    let mut req = request(method, uri, body);
    req.headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    send(app, req).await
}

async fn login(app: &axum::Router) -> String {
    let body = json!({"password": ADMIN_PASSWORD});
    let response = send(app, request(Method::POST, "/api/admin/login", Some(&body))).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({"authenticated": true}));
    response.cookie().unwrap()
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database"]
async fn test_login_session_logout() {
    let app = admin(live_pool().await);
    let cookie = login(&app).await;

    let response = call(&app, &cookie, Method::GET, "/api/admin/session", None).await;
    assert_eq!(response.body, json!({"authenticated": true}));

    let response = call(&app, &cookie, Method::GET, "/api/admin/orders", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["items"].is_array());

    let response = call(&app, &cookie, Method::POST, "/api/admin/logout", None).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = call(&app, &cookie, Method::GET, "/api/admin/orders", None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database"]
async fn test_product_lifecycle() {
    let app = admin(live_pool().await);
    let cookie = login(&app).await;
    let slug = unique("test-bag");

    let created = call(
        &app,
        &cookie,
        Method::POST,
        "/api/admin/products",
        Some(&json!({
            "slug": slug,
            "name": "Тестова сумка",
            "product_type": "bag",
            "base_price": "1200.00",
            "discount_percent": 10,
            "variants": [
                {"color": "Чорний", "sku": unique("SKU-B"), "images": [{"url": "https://res.cloudinary.com/r/b.jpg"}]},
                {"color": "Бежевий", "sku": unique("SKU-Z")}
            ]
        })),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["effective_discount_percent"], 10);
    let id = created.body["id"].as_i64().unwrap();
    let variants = created.body["variants"].as_array().unwrap();
    assert_eq!(variants.len(), 2);
    assert_eq!(variants[0]["images"].as_array().unwrap().len(), 1);
    let black = variants[0]["id"].as_i64().unwrap();
    let beige = variants[1]["id"].as_i64().unwrap();

    // Same slug again conflicts
    let duplicate = call(
        &app,
        &cookie,
        Method::POST,
        "/api/admin/products",
        Some(&json!({"slug": slug, "name": "Копія", "product_type": "bag", "base_price": 1})),
    )
    .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    // Keep black with a beige addon, drop beige, add red
    let updated = call(
        &app,
        &cookie,
        Method::PUT,
        &format!("/api/admin/products/{id}"),
        Some(&json!({
            "slug": slug,
            "name": "Тестова сумка",
            "product_type": "bag",
            "base_price": "1200.00",
            "variants": [
                {"color": "Червоний"},
                {"id": black, "color": "Чорний"}
            ]
        })),
    )
    .await;
    assert_eq!(updated.status, StatusCode::OK);
    let variants = updated.body["variants"].as_array().unwrap();
    assert_eq!(variants.len(), 2);
    assert_eq!(variants[0]["color"], "Червоний");
    assert_eq!(variants[1]["id"].as_i64().unwrap(), black);
    assert!(variants[1]["images"].as_array().unwrap().is_empty());
    assert!(variants.iter().all(|v| v["id"].as_i64() != Some(beige)));

    // A variant id from nowhere conflicts
    let foreign = call(
        &app,
        &cookie,
        Method::PUT,
        &format!("/api/admin/products/{id}"),
        Some(&json!({
            "slug": slug,
            "name": "Тестова сумка",
            "product_type": "bag",
            "base_price": 1200,
            "variants": [{"id": beige, "color": "Бежевий"}]
        })),
    )
    .await;
    assert_eq!(foreign.status, StatusCode::CONFLICT);

    let deleted = call(
        &app,
        &cookie,
        Method::DELETE,
        &format!("/api/admin/products/{id}"),
        None,
    )
    .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let gone = call(
        &app,
        &cookie,
        Method::GET,
        &format!("/api/admin/products/{id}"),
        None,
    )
    .await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database"]
async fn test_manual_status_cannot_unsettle_paid_order() {
    let pool = live_pool().await;

    let id: OrderId = sqlx::query_scalar(
        r#"
        INSERT INTO shop."order" (
            order_number, status, customer_name, customer_phone,
            np_city_ref, np_city_name, np_warehouse_ref, np_warehouse_name,
            payment_method, subtotal, discount_total, total, currency
        )
        VALUES ($1, 'paid', 'Олена', '+380501234567', 'c', 'Київ', 'w', 'Відділення №1',
                'liqpay', 100, 0, 100, 'UAH')
        RETURNING id
        "#,
    )
    .bind(unique("RC-TEST"))
    .fetch_one(&pool)
    .await
    .unwrap();

    let repo = OrderRepository::new(&pool);
    let refused = repo.set_status(id, OrderStatus::Pending).await.unwrap();
    assert!(matches!(refused, StatusChange::Refused(OrderStatus::Paid)));

    let fulfilled = repo.set_status(id, OrderStatus::Fulfilled).await.unwrap();
    let StatusChange::Updated(order) = fulfilled else {
        panic!("expected update");
    };
    assert_eq!(order.status, OrderStatus::Fulfilled);

    sqlx::query(r#"DELETE FROM shop."order" WHERE id = $1"#)
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database"]
async fn test_product_list_includes_inactive() {
    let pool = live_pool().await;
    let repo = ProductRepository::new(&pool);
    let input = serde_json::from_value(json!({
        "name": "Прихований гаманець",
        "product_type": "wallet",
        "base_price": 300,
        "is_active": false
    }))
    .unwrap();

    let slug = unique("hidden-wallet");
    let id = repo.create(&slug, &input).await.unwrap();
    let listed = repo.list().await.unwrap();
    assert!(listed.iter().any(|p| p.id == id && !p.is_active));

    repo.delete(id).await.unwrap();
}
