//! Order listing and manual status changes.

use sqlx::PgPool;

use ruchna_core::{OrderId, OrderStatus};

use super::RepositoryError;
use crate::models::{Order, OrderDetail, OrderItem, OrderListItem, Page, Pagination};

const ORDER_COLUMNS: &str = r"
    id, order_number, status, customer_name, customer_phone, customer_email,
    np_city_ref, np_city_name, np_warehouse_ref, np_warehouse_name,
    payment_method, payment_reference, payment_payload, paid_at,
    subtotal, discount_total, total, currency, comment, created_at, updated_at
";

/// Outcome of a manual status change.
#[derive(Debug, Clone)]
pub enum StatusChange {
    /// The order now has the requested status.
    Updated(Order),
    /// The move is not allowed from the order's current status.
    Refused(OrderStatus),
}

/// Repository for orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Orders, newest first, optionally with one status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        status: Option<OrderStatus>,
        pagination: Pagination,
    ) -> Result<Page<OrderListItem>, RepositoryError> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT count(*) FROM shop."order"
            WHERE $1::shop.order_status IS NULL OR status = $1
            "#,
        )
        .bind(status)
        .fetch_one(self.pool)
        .await?;

        let items = sqlx::query_as::<_, OrderListItem>(
            r#"
            SELECT o.id, o.order_number, o.status, o.customer_name, o.customer_phone,
                   o.payment_method, o.total, o.currency, o.created_at,
                   (SELECT count(*) FROM shop.order_item i WHERE i.order_id = o.id) AS item_count
            FROM shop."order" o
            WHERE $1::shop.order_status IS NULL OR o.status = $1
            ORDER BY o.created_at DESC, o.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(status)
        .bind(i64::from(pagination.per_page()))
        .bind(pagination.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(Page::new(items, total, pagination))
    }

    /// An order with its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<OrderDetail>, RepositoryError> {
        let sql = format!(r#"SELECT {ORDER_COLUMNS} FROM shop."order" WHERE id = $1"#);
        let Some(order) = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
        else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItem>(
            r"
            SELECT id, order_id, product_id, variant_id, product_name, product_slug,
                   variant_color, sku, base_unit_price, discount_percent, unit_price,
                   quantity, line_total
            FROM shop.order_item
            WHERE order_id = $1
            ORDER BY id
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some(OrderDetail { order, items }))
    }

    /// Move an order to `next` if a human is allowed to.
    ///
    /// The current status is locked for the check so a payment callback
    /// landing at the same moment cannot be overwritten.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn set_status(
        &self,
        id: OrderId,
        next: OrderStatus,
    ) -> Result<StatusChange, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: OrderStatus =
            sqlx::query_scalar(r#"SELECT status FROM shop."order" WHERE id = $1 FOR UPDATE"#)
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(RepositoryError::NotFound)?;

        if !current.can_set_manually(next) {
            return Ok(StatusChange::Refused(current));
        }

        let sql = format!(
            r#"
            UPDATE shop."order"
            SET status = $2,
                paid_at = CASE
                    WHEN $2 = 'paid'::shop.order_status THEN COALESCE(paid_at, now())
                    ELSE paid_at
                END,
                updated_at = now()
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "#
        );
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .bind(next)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(StatusChange::Updated(order))
    }
}
