//! Orders as seen by staff.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use ruchna_core::{OrderId, OrderItemId, OrderStatus, PaymentMethod, ProductId, VariantId};

/// A full row of `shop."order"`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub status: OrderStatus,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub np_city_ref: String,
    pub np_city_name: String,
    pub np_warehouse_ref: String,
    pub np_warehouse_name: String,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<String>,
    /// Last verified provider callback, verbatim.
    pub payment_payload: Option<serde_json::Value>,
    pub paid_at: Option<DateTime<Utc>>,
    pub subtotal: Decimal,
    pub discount_total: Decimal,
    pub total: Decimal,
    pub currency: String,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row of `shop.order_item`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    #[serde(skip)]
    pub order_id: OrderId,
    pub product_id: Option<ProductId>,
    pub variant_id: Option<VariantId>,
    pub product_name: String,
    pub product_slug: String,
    pub variant_color: String,
    pub sku: Option<String>,
    pub base_unit_price: Decimal,
    pub discount_percent: i16,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

/// Order list row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderListItem {
    pub id: OrderId,
    pub order_number: String,
    pub status: OrderStatus,
    pub customer_name: String,
    pub customer_phone: String,
    pub payment_method: PaymentMethod,
    pub total: Decimal,
    pub currency: String,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Order detail payload.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}
