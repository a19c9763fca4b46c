//! Payment gateway integrations.
//!
//! Each provider gets a small client that knows how to
//! - build the data a browser needs to start checkout, and
//! - authenticate a server callback and reduce it to a [`PaymentSignal`].
//!
//! Providers never see our prices directly: checkout data is built from the
//! order snapshot, and every callback's amount is checked against that same
//! snapshot before it can change an order.

pub mod fondy;
pub mod liqpay;
pub mod wayforpay;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use ruchna_core::{OrderStatus, PaymentProvider};

pub use fondy::Fondy;
pub use liqpay::LiqPay;
pub use wayforpay::WayForPay;

/// Errors that can occur when talking to a payment provider.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with an error.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Callback signature did not match.
    #[error("invalid signature")]
    InvalidSignature,

    /// Callback could not be decoded.
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// Provider credentials are not configured.
    #[error("{0} is not configured")]
    NotConfigured(PaymentProvider),
}

/// What a provider needs to know about an order to start checkout.
#[derive(Debug, Clone)]
pub struct CheckoutOrder {
    pub order_number: String,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<CheckoutLine>,
}

#[derive(Debug, Clone)]
pub struct CheckoutLine {
    pub name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl CheckoutOrder {
    /// One-line description shown on the provider's payment page.
    #[must_use]
    pub fn description(&self) -> String {
        format!("Замовлення {} (Ruchna)", self.order_number)
    }
}

/// Callback and return URLs for one checkout.
#[derive(Debug, Clone)]
pub struct CheckoutUrls {
    /// Where the provider posts the server-to-server callback.
    pub callback_url: String,
    /// Where the provider sends the customer's browser afterwards.
    pub return_url: String,
}

/// Checkout data handed to the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum CheckoutSession {
    /// POST `data` and `signature` as a form to `checkout_url`.
    LiqPay {
        checkout_url: String,
        data: String,
        signature: String,
    },
    /// POST `fields` as a form to `checkout_url`.
    WayForPay {
        checkout_url: String,
        fields: wayforpay::PurchaseFields,
    },
    /// Redirect the browser to `checkout_url`.
    Fondy { checkout_url: String },
}

/// An authenticated payment notification.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentSignal {
    pub order_number: String,
    pub status: OrderStatus,
    pub amount: Decimal,
    pub currency: String,
    /// Provider-side transaction identifier.
    pub reference: Option<String>,
    /// Decoded callback, stored on the order for support.
    pub payload: serde_json::Value,
}

/// Constant-time string comparison to prevent timing attacks.
pub(crate) fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

/// Text of a JSON scalar as a provider would have signed it.
///
/// Strings are taken verbatim, numbers in their JSON spelling, `null` and
/// missing values as the empty string.
pub(crate) fn json_text(value: Option<&serde_json::Value>) -> String {
    match value {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(constant_time_compare("", ""));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "abcd"));
    }

    #[test]
    fn test_json_text() {
        let value = serde_json::json!({"s": "x", "n": 1547.36, "i": 1100, "z": null});
        assert_eq!(json_text(value.get("s")), "x");
        assert_eq!(json_text(value.get("n")), "1547.36");
        assert_eq!(json_text(value.get("i")), "1100");
        assert_eq!(json_text(value.get("z")), "");
        assert_eq!(json_text(value.get("missing")), "");
    }

    #[test]
    fn test_checkout_session_is_tagged_by_provider() {
        let session = CheckoutSession::Fondy {
            checkout_url: "https://pay.fondy.eu/merchants/abc".to_string(),
        };
        let json = serde_json::to_value(&session).unwrap_or_default();
        assert_eq!(json["provider"], "fondy");
        assert_eq!(json["checkout_url"], "https://pay.fondy.eu/merchants/abc");
    }
}
