//! Database-backed checkout flow.
//!
//! Requires a migrated database at `DATABASE_URL`; run with `--ignored`.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use rust_decimal::Decimal;
use serde_json::{Value, json};

use ruchna_admin::db::ProductRepository;
use ruchna_admin::models::ProductInput;
use ruchna_integration_tests::{live_pool, request, send, storefront};

fn decimal(value: &Value) -> Decimal {
    value.as_str().unwrap().parse().unwrap()
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database"]
async fn test_cash_on_delivery_checkout() {
    let pool = live_pool().await;
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .subsec_nanos();
    let slug = format!("checkout-bag-{nanos}");

    let input: ProductInput = serde_json::from_value(json!({
        "name": "Сумка для тесту",
        "product_type": "bag",
        "base_price": "1200.00",
        "discount_percent": 10,
        "variants": [{"color": "Чорний"}]
    }))
    .unwrap();
    let products = ProductRepository::new(&pool);
    let product_id = products.create(&slug, &input).await.unwrap();
    let variant_id = products.get(product_id).await.unwrap().unwrap().variants[0]
        .variant
        .id;

    let app = storefront(pool.clone());

    let quote = send(
        &app,
        request(
            Method::POST,
            "/api/cart/quote",
            Some(&json!({"items": [{"variant_id": variant_id, "quantity": 2}]})),
        ),
    )
    .await;
    assert_eq!(quote.status, StatusCode::OK);
    assert_eq!(decimal(&quote.body["total"]), Decimal::new(2160, 0));

    let created = send(
        &app,
        request(
            Method::POST,
            "/api/orders",
            Some(&json!({
                "customer": {"name": "Олена Коваль", "phone": "050 123 45 67"},
                "shipping": {
                    "city_ref": "8d5a980d-391c-11dd-90d9-001a92567626",
                    "city_name": "Київ",
                    "warehouse_ref": "1ec09d88-e1c2-11e3-8c4a-0050568002cf",
                    "warehouse_name": "Відділення №1"
                },
                "items": [{"variant_id": variant_id, "quantity": 2}]
            })),
        ),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["status"], "PENDING");
    assert_eq!(created.body["payment_method"], "cash_on_delivery");
    assert_eq!(decimal(&created.body["total"]), Decimal::new(2160, 0));
    assert!(created.body.get("customer_phone").is_none());
    let order_number = created.body["order_number"].as_str().unwrap().to_string();
    assert!(order_number.starts_with("RC-"));

    let shown = send(
        &app,
        request(Method::GET, &format!("/api/orders/{order_number}"), None),
    )
    .await;
    assert_eq!(shown.status, StatusCode::OK);
    assert_eq!(shown.body["items"][0]["quantity"], 2);

    // Order lines keep their snapshot after the product goes away
    products.delete(product_id).await.unwrap();
    let shown = send(
        &app,
        request(Method::GET, &format!("/api/orders/{order_number}"), None),
    )
    .await;
    assert_eq!(shown.body["items"][0]["product_slug"], slug);
}
