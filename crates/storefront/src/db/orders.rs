//! Order persistence.

use rand::Rng;
use sqlx::PgPool;

use ruchna_core::{CURRENCY, OrderId, OrderStatus, PaymentMethod};

use super::{RepositoryError, is_unique_violation};
use crate::models::{NewOrder, Order, OrderItem};
use crate::services::pricing::Quote;

const ORDER_COLUMNS: &str = "id, order_number, status, customer_name, customer_phone, \
     customer_email, np_city_ref, np_city_name, np_warehouse_ref, np_warehouse_name, \
     payment_method, payment_reference, paid_at, subtotal, discount_total, total, currency, \
     comment, created_at, updated_at";

/// How many fresh order numbers to try before giving up.
const ORDER_NUMBER_ATTEMPTS: usize = 3;

/// Outcome of applying a provider's payment signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentUpdate {
    /// The status changed to the contained value.
    Updated(OrderStatus),
    /// The order was already settled or the signal changed nothing.
    Unchanged(OrderStatus),
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order and its line snapshots in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if no unique order number could be
    /// allocated, `RepositoryError::Database` for other failures.
    pub async fn create(&self, order: &NewOrder, quote: &Quote) -> Result<Order, RepositoryError> {
        for _ in 0..ORDER_NUMBER_ATTEMPTS {
            let number = generate_order_number(chrono::Utc::now().date_naive());
            match self.insert(&number, order, quote).await {
                Err(RepositoryError::Database(e)) if is_unique_violation(&e) => {
                    tracing::warn!(order_number = %number, "Order number collision, retrying");
                }
                result => return result,
            }
        }
        Err(RepositoryError::Conflict(
            "could not allocate a unique order number".to_string(),
        ))
    }

    async fn insert(
        &self,
        number: &str,
        order: &NewOrder,
        quote: &Quote,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            INSERT INTO shop."order" (
                order_number, customer_name, customer_phone, customer_email,
                np_city_ref, np_city_name, np_warehouse_ref, np_warehouse_name,
                payment_method, subtotal, discount_total, total, currency, comment
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {ORDER_COLUMNS}
            "#
        );
        let created = sqlx::query_as::<_, Order>(&sql)
            .bind(number)
            .bind(&order.customer_name)
            .bind(&order.customer_phone)
            .bind(order.customer_email.as_deref())
            .bind(&order.np_city_ref)
            .bind(&order.np_city_name)
            .bind(&order.np_warehouse_ref)
            .bind(&order.np_warehouse_name)
            .bind(order.payment_method)
            .bind(quote.subtotal)
            .bind(quote.discount_total)
            .bind(quote.total)
            .bind(CURRENCY)
            .bind(order.comment.as_deref())
            .fetch_one(&mut *tx)
            .await?;

        for line in &quote.lines {
            sqlx::query(
                r"
                INSERT INTO shop.order_item (
                    order_id, product_id, variant_id, product_name, product_slug,
                    variant_color, sku, base_unit_price, discount_percent, unit_price,
                    quantity, line_total
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                ",
            )
            .bind(created.id)
            .bind(line.product_id)
            .bind(line.variant_id)
            .bind(&line.product_name)
            .bind(&line.product_slug)
            .bind(&line.variant_color)
            .bind(line.sku.as_deref())
            .bind(line.base_unit_price)
            .bind(i16::from(line.discount_percent))
            .bind(line.unit_price)
            .bind(line.quantity)
            .bind(line.line_total)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(created)
    }

    /// Get an order by its public number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_number(&self, order_number: &str) -> Result<Option<Order>, RepositoryError> {
        let sql = format!(r#"SELECT {ORDER_COLUMNS} FROM shop."order" WHERE order_number = $1"#);
        let row = sqlx::query_as::<_, Order>(&sql)
            .bind(order_number)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Line items of an order, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderItem>(
            r"
            SELECT id, order_id, product_id, variant_id, product_name, product_slug,
                   variant_color, sku, base_unit_price, discount_percent, unit_price,
                   quantity, line_total
            FROM shop.order_item
            WHERE order_id = $1
            ORDER BY id
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Record the payment method chosen for a still-pending order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order is missing or no
    /// longer pending.
    pub async fn set_payment_method(
        &self,
        order_id: OrderId,
        method: PaymentMethod,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE shop."order"
            SET payment_method = $2, updated_at = now()
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(order_id)
        .bind(method)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Apply a verified provider signal to an order.
    ///
    /// The pure mapping decides the target status; the `UPDATE` is guarded so
    /// a callback racing another one can never move a settled order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn apply_payment_signal(
        &self,
        order_number: &str,
        signal: OrderStatus,
        reference: Option<&str>,
        payload: &serde_json::Value,
    ) -> Result<PaymentUpdate, RepositoryError> {
        let order = self
            .get_by_number(order_number)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let next = order.status.apply_payment_signal(signal);
        if next == order.status {
            return Ok(PaymentUpdate::Unchanged(order.status));
        }

        let updated: Option<OrderStatus> = sqlx::query_scalar(
            r#"
            UPDATE shop."order"
            SET status = $2,
                payment_reference = COALESCE($3, payment_reference),
                payment_payload = $4,
                paid_at = CASE WHEN $2 = 'paid'::shop.order_status THEN now() ELSE paid_at END,
                updated_at = now()
            WHERE id = $1 AND status NOT IN ('paid', 'fulfilled')
            RETURNING status
            "#,
        )
        .bind(order.id)
        .bind(next)
        .bind(reference)
        .bind(payload)
        .fetch_optional(self.pool)
        .await?;

        match updated {
            Some(status) => Ok(PaymentUpdate::Updated(status)),
            None => {
                let current = self
                    .get_by_number(order_number)
                    .await?
                    .map_or(order.status, |o| o.status);
                Ok(PaymentUpdate::Unchanged(current))
            }
        }
    }
}

/// Public order number: `RC-YYMMDD-XXXXXX` with six random hex digits.
pub fn generate_order_number(date: chrono::NaiveDate) -> String {
    let suffix: u32 = rand::rng().random_range(0..0x0100_0000);
    format!("RC-{}-{suffix:06X}", date.format("%y%m%d"))
}
