//! Order rows and public views.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use ruchna_core::{OrderId, OrderItemId, OrderStatus, PaymentMethod, ProductId, VariantId};

/// A row of `shop."order"`.
#[derive(Debug, Clone, FromRow)]
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
#[derive(Debug, Clone, FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
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

/// Customer and delivery details captured at checkout.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub np_city_ref: String,
    pub np_city_name: String,
    pub np_warehouse_ref: String,
    pub np_warehouse_name: String,
    pub payment_method: PaymentMethod,
    pub comment: Option<String>,
}

/// Order summary safe to show to anyone holding the order number.
///
/// Carries no customer contact details.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub items: Vec<OrderSummaryItem>,
    pub subtotal: Decimal,
    pub discount_total: Decimal,
    pub total: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderSummaryItem {
    pub product_name: String,
    pub product_slug: String,
    pub variant_color: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

impl OrderSummary {
    #[must_use]
    pub fn new(order: Order, items: Vec<OrderItem>) -> Self {
        Self {
            order_number: order.order_number,
            status: order.status,
            payment_method: order.payment_method,
            items: items
                .into_iter()
                .map(|item| OrderSummaryItem {
                    product_name: item.product_name,
                    product_slug: item.product_slug,
                    variant_color: item.variant_color,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    line_total: item.line_total,
                })
                .collect(),
            subtotal: order.subtotal,
            discount_total: order.discount_total,
            total: order.total,
            currency: order.currency,
            created_at: order.created_at,
        }
    }
}
