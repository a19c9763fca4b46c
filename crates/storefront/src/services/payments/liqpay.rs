//! LiqPay (PrivatBank) checkout and callbacks.
//!
//! Both directions use the same envelope: `data` is base64 of a JSON object
//! and `signature` is `base64(sha1(private_key + data + private_key))`.

use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use tracing::instrument;

use ruchna_core::{CURRENCY, OrderStatus, uah};

use super::{
    CheckoutOrder, CheckoutSession, CheckoutUrls, PaymentError, PaymentSignal,
    constant_time_compare, json_text,
};
use crate::config::LiqPayConfig;

/// LiqPay hosted checkout endpoint.
pub const CHECKOUT_URL: &str = "https://www.liqpay.ua/api/3/checkout";

const API_VERSION: u8 = 3;

/// LiqPay merchant client.
#[derive(Clone)]
pub struct LiqPay {
    public_key: String,
    private_key: SecretString,
}

#[derive(Debug, Serialize)]
struct CheckoutParams<'a> {
    version: u8,
    public_key: &'a str,
    action: &'static str,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    currency: &'static str,
    description: String,
    order_id: &'a str,
    result_url: &'a str,
    server_url: &'a str,
    language: &'static str,
}

#[derive(Debug, Deserialize)]
struct CallbackData {
    status: String,
    order_id: String,
    currency: String,
}

impl LiqPay {
    #[must_use]
    pub fn new(config: &LiqPayConfig) -> Self {
        Self {
            public_key: config.public_key.clone(),
            private_key: config.private_key.clone(),
        }
    }

    /// Sign a base64 `data` envelope.
    #[must_use]
    pub fn sign(&self, data: &str) -> String {
        let key = self.private_key.expose_secret();
        let mut hasher = Sha1::new();
        hasher.update(key.as_bytes());
        hasher.update(data.as_bytes());
        hasher.update(key.as_bytes());
        BASE64.encode(hasher.finalize())
    }

    /// Build the signed form for the hosted checkout page.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Malformed` if the parameters cannot be encoded.
    pub fn checkout(
        &self,
        order: &CheckoutOrder,
        urls: &CheckoutUrls,
    ) -> Result<CheckoutSession, PaymentError> {
        let params = CheckoutParams {
            version: API_VERSION,
            public_key: &self.public_key,
            action: "pay",
            amount: uah(order.total),
            currency: CURRENCY,
            description: order.description(),
            order_id: &order.order_number,
            result_url: &urls.return_url,
            server_url: &urls.callback_url,
            language: "uk",
        };

        let json = serde_json::to_vec(&params).map_err(|e| PaymentError::Malformed(e.to_string()))?;
        let data = BASE64.encode(json);
        let signature = self.sign(&data);

        Ok(CheckoutSession::LiqPay {
            checkout_url: CHECKOUT_URL.to_string(),
            data,
            signature,
        })
    }

    /// Authenticate a form-encoded `data=…&signature=…` callback body.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::InvalidSignature` when the signature does not
    /// match and `PaymentError::Malformed` when the body cannot be decoded.
    #[instrument(skip_all)]
    pub fn verify_callback(&self, body: &[u8]) -> Result<PaymentSignal, PaymentError> {
        let mut data = None;
        let mut signature = None;
        for (key, value) in url::form_urlencoded::parse(body) {
            match key.as_ref() {
                "data" => data = Some(value.into_owned()),
                "signature" => signature = Some(value.into_owned()),
                _ => {}
            }
        }

        let data = data.ok_or_else(|| PaymentError::Malformed("missing data".to_string()))?;
        let signature =
            signature.ok_or_else(|| PaymentError::Malformed("missing signature".to_string()))?;

        if !constant_time_compare(&self.sign(&data), &signature) {
            return Err(PaymentError::InvalidSignature);
        }

        let decoded = BASE64
            .decode(data.as_bytes())
            .map_err(|e| PaymentError::Malformed(format!("data is not base64: {e}")))?;
        let payload: serde_json::Value = serde_json::from_slice(&decoded)
            .map_err(|e| PaymentError::Malformed(format!("data is not JSON: {e}")))?;
        let fields: CallbackData = serde_json::from_value(payload.clone())
            .map_err(|e| PaymentError::Malformed(e.to_string()))?;

        // Parsed from the JSON text so `1547.36` never passes through f64
        let amount = Decimal::from_str(&json_text(payload.get("amount")))
            .map_err(|e| PaymentError::Malformed(format!("invalid amount: {e}")))?;
        let reference = Some(json_text(payload.get("payment_id"))).filter(|s| !s.is_empty());

        Ok(PaymentSignal {
            status: OrderStatus::from_liqpay(&fields.status),
            order_number: fields.order_id,
            amount,
            currency: fields.currency,
            reference,
            payload,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    const SAMPLE_DATA: &str = "eyJzdGF0dXMiOiJzdWNjZXNzIiwib3JkZXJfaWQiOiJSQy0yNjAzMDctMDBBMUIyIiwiYW1vdW50IjoxNTQ3LjM2LCJjdXJyZW5jeSI6IlVBSCIsInBheW1lbnRfaWQiOjIzNDU2NzgsInRyYW5zYWN0aW9uX2lkIjoyMzQ1Njc4fQ==";
    const SAMPLE_SIGNATURE: &str = "/zXUxajk2YgPCn2oaSGZbxaw3XA=";

    fn client() -> LiqPay {
        LiqPay::new(&LiqPayConfig {
            public_key: "sandbox_i0000001".to_string(),
            private_key: SecretString::from("sandbox_priv_9kQ2xZ"),
        })
    }

    fn form(data: &str, signature: &str) -> Vec<u8> {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("data", data)
            .append_pair("signature", signature)
            .finish()
            .into_bytes()
    }

    #[test]
    fn test_sign_known_vector() {
        assert_eq!(client().sign("abc"), "2Nk0uPwf0WI+WN+lWuKJkutvm2w=");
        assert_eq!(client().sign(SAMPLE_DATA), SAMPLE_SIGNATURE);
    }

    #[test]
    fn test_verify_callback() {
        let signal = client()
            .verify_callback(&form(SAMPLE_DATA, SAMPLE_SIGNATURE))
            .unwrap();

        assert_eq!(signal.order_number, "RC-260307-00A1B2");
        assert_eq!(signal.status, OrderStatus::Paid);
        assert_eq!(signal.amount, Decimal::new(154_736, 2));
        assert_eq!(signal.currency, "UAH");
        assert_eq!(signal.reference.as_deref(), Some("2345678"));
    }

    #[test]
    fn test_verify_callback_rejects_tampering() {
        let forged = client().verify_callback(&form(SAMPLE_DATA, "AAAAAAAAAAAAAAAAAAAAAAAAAAA="));
        assert!(matches!(forged, Err(PaymentError::InvalidSignature)));

        let missing = client().verify_callback(b"data=abc");
        assert!(matches!(missing, Err(PaymentError::Malformed(_))));

        let garbage = client().verify_callback(b"\xff\xfe");
        assert!(matches!(garbage, Err(PaymentError::Malformed(_))));
    }

    #[test]
    fn test_checkout_round_trips_through_own_verification() {
        let order = CheckoutOrder {
            order_number: "RC-260307-00A1B2".to_string(),
            total: Decimal::new(99_950, 2),
            created_at: Utc::now(),
            lines: Vec::new(),
        };
        let urls = CheckoutUrls {
            callback_url: "https://api.ruchna.ua/api/payments/liqpay/callback".to_string(),
            return_url: "https://api.ruchna.ua/api/payments/liqpay/return?order=RC-260307-00A1B2"
                .to_string(),
        };

        let CheckoutSession::LiqPay {
            checkout_url,
            data,
            signature,
        } = client().checkout(&order, &urls).unwrap()
        else {
            panic!("expected a LiqPay session");
        };

        assert_eq!(checkout_url, CHECKOUT_URL);
        assert_eq!(signature, client().sign(&data));

        let params: serde_json::Value =
            serde_json::from_slice(&BASE64.decode(data.as_bytes()).unwrap()).unwrap();
        assert_eq!(params["version"], 3);
        assert_eq!(params["action"], "pay");
        assert_eq!(params["amount"], 999.5);
        assert_eq!(params["currency"], "UAH");
        assert_eq!(params["public_key"], "sandbox_i0000001");
        assert_eq!(params["server_url"], urls.callback_url.as_str());
    }
}
