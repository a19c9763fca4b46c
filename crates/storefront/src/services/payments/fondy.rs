//! Fondy checkout API and server callbacks.
//!
//! Fondy signs the `|`-joined values of every non-empty parameter, ordered
//! by key and prefixed with the merchant password, with SHA-1. Amounts
//! travel in kopecks.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use sha1::{Digest, Sha1};
use tracing::instrument;

use ruchna_core::{CURRENCY, OrderStatus, to_minor_units};

use super::{
    CheckoutOrder, CheckoutSession, CheckoutUrls, PaymentError, PaymentSignal,
    constant_time_compare, json_text,
};
use crate::config::FondyConfig;

/// Fondy checkout URL endpoint.
pub const API_URL: &str = "https://pay.fondy.eu/api/checkout/url/";

/// Parameters that are never part of the signed set.
const UNSIGNED: [&str; 2] = ["signature", "response_signature_string"];

/// Fondy merchant client.
#[derive(Clone)]
pub struct Fondy {
    client: reqwest::Client,
    merchant_id: String,
    payment_key: SecretString,
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    response: ApiResponse,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    response_status: String,
    checkout_url: Option<String>,
    error_message: Option<String>,
    error_code: Option<Value>,
}

/// Signature over `params` with the merchant `password`.
#[must_use]
pub fn signature(password: &str, params: &BTreeMap<String, String>) -> String {
    let mut parts = vec![password];
    parts.extend(
        params
            .iter()
            .filter(|(key, value)| !value.is_empty() && !UNSIGNED.contains(&key.as_str()))
            .map(|(_, value)| value.as_str()),
    );

    hex::encode(Sha1::digest(parts.join("|").as_bytes()))
}

impl Fondy {
    #[must_use]
    pub fn new(config: &FondyConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            merchant_id: config.merchant_id.clone(),
            payment_key: config.payment_key.clone(),
        }
    }

    /// Ask Fondy for a hosted checkout URL.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Http` if the request fails and
    /// `PaymentError::Api` if Fondy refuses the order.
    #[instrument(skip(self, order, urls), fields(order_number = %order.order_number))]
    pub async fn checkout(
        &self,
        order: &CheckoutOrder,
        urls: &CheckoutUrls,
    ) -> Result<CheckoutSession, PaymentError> {
        let amount = to_minor_units(order.total)
            .ok_or_else(|| PaymentError::Malformed(format!("amount out of range: {}", order.total)))?;

        let mut params = BTreeMap::from([
            ("order_id".to_string(), order.order_number.clone()),
            ("merchant_id".to_string(), self.merchant_id.clone()),
            ("order_desc".to_string(), order.description()),
            ("amount".to_string(), amount.to_string()),
            ("currency".to_string(), CURRENCY.to_string()),
            ("response_url".to_string(), urls.return_url.clone()),
            ("server_callback_url".to_string(), urls.callback_url.clone()),
            ("lang".to_string(), "uk".to_string()),
        ]);
        let signature = signature(self.payment_key.expose_secret(), &params);
        params.insert("signature".to_string(), signature);

        let response = self
            .client
            .post(API_URL)
            .json(&serde_json::json!({ "request": params }))
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: ApiEnvelope = response
            .json()
            .await
            .map_err(|e| PaymentError::Malformed(e.to_string()))?;
        checkout_url(envelope.response, status.as_u16())
            .map(|checkout_url| CheckoutSession::Fondy { checkout_url })
    }

    /// Authenticate a server callback (JSON or form encoded).
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::InvalidSignature` on a signature or merchant
    /// mismatch and `PaymentError::Malformed` when required fields are
    /// missing.
    #[instrument(skip_all)]
    pub fn verify_callback(&self, body: &[u8]) -> Result<PaymentSignal, PaymentError> {
        let payload = parse_body(body)?;
        let params: BTreeMap<String, String> = payload
            .as_object()
            .map(|object| {
                object
                    .iter()
                    .map(|(key, value)| (key.clone(), json_text(Some(value))))
                    .collect()
            })
            .unwrap_or_default();

        let provided = params.get("signature").map_or("", String::as_str);
        let expected = signature(self.payment_key.expose_secret(), &params);
        if !constant_time_compare(&expected, provided) {
            return Err(PaymentError::InvalidSignature);
        }
        if params.get("merchant_id") != Some(&self.merchant_id) {
            return Err(PaymentError::InvalidSignature);
        }

        let field = |name: &str| {
            params
                .get(name)
                .filter(|v| !v.is_empty())
                .cloned()
                .ok_or_else(|| PaymentError::Malformed(format!("missing {name}")))
        };

        let order_number = field("order_id")?;
        let kopecks: i64 = field("amount")?
            .parse()
            .map_err(|e| PaymentError::Malformed(format!("invalid amount: {e}")))?;
        let currency = field("currency")?;
        let status = OrderStatus::from_fondy(&field("order_status")?);
        let reference = params.get("payment_id").filter(|v| !v.is_empty()).cloned();

        Ok(PaymentSignal {
            order_number,
            status,
            amount: Decimal::new(kopecks, 2),
            currency,
            reference,
            payload,
        })
    }
}

fn checkout_url(response: ApiResponse, status: u16) -> Result<String, PaymentError> {
    match response.checkout_url {
        Some(url) if response.response_status == "success" => Ok(url),
        _ => Err(PaymentError::Api {
            status,
            message: format!(
                "{} (code {})",
                response
                    .error_message
                    .unwrap_or_else(|| response.response_status.clone()),
                json_text(response.error_code.as_ref()),
            ),
        }),
    }
}

fn parse_body(body: &[u8]) -> Result<Value, PaymentError> {
    if let Ok(value) = serde_json::from_slice::<Value>(body) {
        // Some integrations wrap the callback like API responses.
        return match value {
            Value::Object(mut object) => match object.remove("response") {
                Some(inner @ Value::Object(_)) => Ok(inner),
                Some(other) => {
                    object.insert("response".to_string(), other);
                    Ok(Value::Object(object))
                }
                None => Ok(Value::Object(object)),
            },
            _ => Err(PaymentError::Malformed("callback is not an object".to_string())),
        };
    }

    let object: serde_json::Map<String, Value> = url::form_urlencoded::parse(body)
        .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
        .collect();
    if object.is_empty() {
        return Err(PaymentError::Malformed("empty callback".to_string()));
    }
    Ok(Value::Object(object))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn client() -> Fondy {
        Fondy::new(
            &FondyConfig {
                merchant_id: "1396424".to_string(),
                payment_key: SecretString::from("test"),
            },
            reqwest::Client::new(),
        )
    }

    fn callback() -> Value {
        json!({
            "order_id": "RC-260307-00A1B2",
            "merchant_id": "1396424",
            "amount": "154736",
            "currency": "UAH",
            "order_status": "approved",
            "payment_id": "805243692",
            "masked_card": "444455XXXXXX6666",
            "rrn": "",
            "response_signature_string": "**********|154736|UAH|...",
            "signature": "79540a02daacfbf5ed94c0b8515e404370337023"
        })
    }

    #[test]
    fn test_signature_known_vector() {
        let params = BTreeMap::from([
            ("order_id".to_string(), "RC-260307-00A1B2".to_string()),
            ("merchant_id".to_string(), "1396424".to_string()),
            ("order_desc".to_string(), "Order".to_string()),
            ("amount".to_string(), "154736".to_string()),
            ("currency".to_string(), "UAH".to_string()),
        ]);
        assert_eq!(
            signature("test", &params),
            "fc1f57031b9e9eeea51c1399fd0bfae31ad1d872"
        );
    }

    #[test]
    fn test_verify_json_callback() {
        let body = serde_json::to_vec(&callback()).unwrap();
        let signal = client().verify_callback(&body).unwrap();

        assert_eq!(signal.order_number, "RC-260307-00A1B2");
        assert_eq!(signal.status, OrderStatus::Paid);
        assert_eq!(signal.amount, Decimal::new(154_736, 2));
        assert_eq!(signal.currency, "UAH");
        assert_eq!(signal.reference.as_deref(), Some("805243692"));
    }

    #[test]
    fn test_verify_form_callback() {
        let mut form = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in callback().as_object().unwrap() {
            form.append_pair(key, value.as_str().unwrap());
        }
        let body = form.finish();

        assert!(client().verify_callback(body.as_bytes()).is_ok());
    }

    #[test]
    fn test_verify_callback_rejects_tampering() {
        let mut tampered = callback();
        tampered["amount"] = json!("100");
        let body = serde_json::to_vec(&tampered).unwrap();
        assert!(matches!(
            client().verify_callback(&body),
            Err(PaymentError::InvalidSignature)
        ));

        let other_merchant = Fondy::new(
            &FondyConfig {
                merchant_id: "1700000".to_string(),
                payment_key: SecretString::from("test"),
            },
            reqwest::Client::new(),
        );
        let body = serde_json::to_vec(&callback()).unwrap();
        assert!(matches!(
            other_merchant.verify_callback(&body),
            Err(PaymentError::InvalidSignature)
        ));
    }

    #[test]
    fn test_checkout_url_from_response() {
        let ok: ApiEnvelope = serde_json::from_value(json!({
            "response": {
                "response_status": "success",
                "checkout_url": "https://pay.fondy.eu/merchants/5ad6b888f4becb0c33d543d54e57d86c/default/index.html?token=abc"
            }
        }))
        .unwrap();
        assert!(checkout_url(ok.response, 200).unwrap().contains("token=abc"));

        let failed: ApiEnvelope = serde_json::from_value(json!({
            "response": {
                "response_status": "failure",
                "error_message": "Invalid merchant_id",
                "error_code": 1011
            }
        }))
        .unwrap();
        let err = checkout_url(failed.response, 200).unwrap_err();
        assert!(err.to_string().contains("Invalid merchant_id (code 1011)"));
    }
}
