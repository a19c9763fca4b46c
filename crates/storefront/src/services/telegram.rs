//! Telegram Bot API notifications.
//!
//! The shop's staff chat receives a message for every new order, every
//! confirmed payment and every preorder lead.

use std::fmt::Write as _;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use ruchna_core::{PaymentProvider, format_amount};

use crate::config::TelegramConfig;
use crate::models::{Order, PreorderLead};
use crate::services::pricing::Quote;

/// Telegram Bot API base URL.
const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Errors that can occur when sending Telegram messages.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Bot API answered `ok: false`.
    #[error("API error: {0}")]
    Api(String),
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

/// Bot client bound to the staff chat.
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    bot_token: SecretString,
    chat_id: String,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("bot_token", &"[REDACTED]")
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    #[must_use]
    pub fn new(config: &TelegramConfig, client: Client) -> Self {
        Self {
            client,
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
        }
    }

    /// Send an HTML-formatted message to the staff chat.
    ///
    /// # Errors
    ///
    /// Returns `TelegramError` if the request fails or the bot is refused.
    #[instrument(skip(self, text))]
    pub async fn send_message(&self, text: &str) -> Result<(), TelegramError> {
        let url = format!(
            "{TELEGRAM_API_BASE}/bot{}/sendMessage",
            self.bot_token.expose_secret()
        );

        let response: ApiResponse = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "chat_id": self.chat_id,
                "text": text,
                "parse_mode": "HTML",
                "disable_web_page_preview": true,
            }))
            .send()
            .await?
            .json()
            .await?;

        if !response.ok {
            return Err(TelegramError::Api(
                response
                    .description
                    .unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        debug!("Telegram message sent");
        Ok(())
    }
}

/// Escape text for Telegram's HTML parse mode.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Message for a freshly placed order.
#[must_use]
pub fn order_created_message(order: &Order, quote: &Quote) -> String {
    let mut text = format!(
        "🛍 <b>Нове замовлення {}</b>\n\n{}\n{}\n",
        escape_html(&order.order_number),
        escape_html(&order.customer_name),
        escape_html(&order.customer_phone),
    );
    if let Some(email) = &order.customer_email {
        let _ = writeln!(text, "{}", escape_html(email));
    }
    let _ = writeln!(
        text,
        "📦 {}, {}\n",
        escape_html(&order.np_city_name),
        escape_html(&order.np_warehouse_name)
    );

    for line in &quote.lines {
        let _ = writeln!(
            text,
            "• {} ({}) × {} = {} ₴",
            escape_html(&line.product_name),
            escape_html(&line.variant_color),
            line.quantity,
            format_amount(line.line_total)
        );
    }

    let _ = write!(
        text,
        "\n<b>Разом: {} ₴</b>\nОплата: {}",
        format_amount(order.total),
        order.payment_method
    );
    if let Some(comment) = &order.comment {
        let _ = write!(text, "\n💬 {}", escape_html(comment));
    }
    text
}

/// Message for a payment confirmed by a provider callback.
#[must_use]
pub fn order_paid_message(order: &Order, provider: PaymentProvider) -> String {
    format!(
        "✅ <b>Оплачено {}</b>\n{} ₴ через {}",
        escape_html(&order.order_number),
        format_amount(order.total),
        provider
    )
}

/// Message for a new preorder lead.
#[must_use]
pub fn lead_message(lead: &PreorderLead) -> String {
    let mut text = format!(
        "📝 <b>Передзамовлення</b>\n{}\n{}",
        escape_html(&lead.name),
        escape_html(&lead.phone)
    );
    for value in [&lead.email, &lead.product_slug, &lead.variant_color, &lead.comment]
        .into_iter()
        .flatten()
    {
        let _ = write!(text, "\n{}", escape_html(value));
    }
    text
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use ruchna_core::{OrderId, OrderStatus, PaymentMethod, PreorderLeadId};

    use super::*;

    fn order() -> Order {
        Order {
            id: OrderId::new(1),
            order_number: "RC-260307-00A1B2".to_string(),
            status: OrderStatus::Pending,
            customer_name: "Олена <Коваль>".to_string(),
            customer_phone: "+380501234567".to_string(),
            customer_email: None,
            np_city_ref: "city".to_string(),
            np_city_name: "Київ".to_string(),
            np_warehouse_ref: "wh".to_string(),
            np_warehouse_name: "Відділення №1".to_string(),
            payment_method: PaymentMethod::LiqPay,
            payment_reference: None,
            paid_at: None,
            subtotal: Decimal::from(1000),
            discount_total: Decimal::ZERO,
            total: Decimal::new(99_950, 2),
            currency: "UAH".to_string(),
            comment: Some("Подарунок & листівка".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a < b & c > d"), "a &lt; b &amp; c &gt; d");
        assert_eq!(escape_html("Київ"), "Київ");
    }

    #[test]
    fn test_order_created_message_escapes_customer_input() {
        let quote = Quote {
            lines: Vec::new(),
            subtotal: Decimal::from(1000),
            discount_total: Decimal::ZERO,
            total: Decimal::new(99_950, 2),
            currency: "UAH",
        };
        let text = order_created_message(&order(), &quote);

        assert!(text.contains("RC-260307-00A1B2"));
        assert!(text.contains("Олена &lt;Коваль&gt;"));
        assert!(text.contains("Разом: 999.5 ₴"));
        assert!(text.contains("Подарунок &amp; листівка"));
    }

    #[test]
    fn test_order_paid_message() {
        let text = order_paid_message(&order(), PaymentProvider::WayForPay);
        assert!(text.contains("Оплачено RC-260307-00A1B2"));
        assert!(text.contains("wayforpay"));
    }

    #[test]
    fn test_lead_message_skips_missing_fields() {
        let lead = PreorderLead {
            id: PreorderLeadId::new(1),
            name: "Ірина".to_string(),
            phone: "+380671112233".to_string(),
            email: None,
            product_slug: Some("sumka-loza".to_string()),
            variant_color: None,
            comment: None,
            created_at: Utc::now(),
        };
        assert_eq!(
            lead_message(&lead),
            "📝 <b>Передзамовлення</b>\nІрина\n+380671112233\nsumka-loza"
        );
    }
}
