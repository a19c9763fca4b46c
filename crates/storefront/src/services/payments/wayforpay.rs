//! WayForPay purchase form and service callbacks.
//!
//! Signatures are `hex(HMAC-MD5(secret_key, fields.join(";")))` over a fixed,
//! per-message list of fields.

use std::str::FromStr;

use hmac::{Hmac, Mac};
use md5::Md5;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use ruchna_core::{CURRENCY, OrderStatus, format_amount};

use super::{
    CheckoutOrder, CheckoutSession, CheckoutUrls, PaymentError, PaymentSignal,
    constant_time_compare, json_text,
};
use crate::config::WayForPayConfig;

type HmacMd5 = Hmac<Md5>;

/// WayForPay hosted purchase page.
pub const CHECKOUT_URL: &str = "https://secure.wayforpay.com/pay";

/// Callback fields covered by `merchantSignature`, in signing order.
const CALLBACK_FIELDS: [&str; 8] = [
    "merchantAccount",
    "orderReference",
    "amount",
    "currency",
    "authCode",
    "cardPan",
    "transactionStatus",
    "reasonCode",
];

/// Fields the browser posts to the purchase page.
///
/// Product arrays are sent as repeated `productName[]` style inputs by the
/// front-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseFields {
    pub merchant_account: String,
    pub merchant_auth_type: String,
    pub merchant_domain_name: String,
    pub merchant_signature: String,
    pub merchant_transaction_secure_type: String,
    pub order_reference: String,
    pub order_date: i64,
    pub amount: String,
    pub currency: String,
    pub product_name: Vec<String>,
    pub product_count: Vec<String>,
    pub product_price: Vec<String>,
    pub return_url: String,
    pub service_url: String,
    pub language: String,
}

/// Reply WayForPay expects from the service URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Acknowledgement {
    pub order_reference: String,
    pub status: String,
    pub time: i64,
    pub signature: String,
}

/// WayForPay merchant client.
#[derive(Clone)]
pub struct WayForPay {
    merchant_account: String,
    merchant_domain: String,
    secret_key: SecretString,
}

impl WayForPay {
    #[must_use]
    pub fn new(config: &WayForPayConfig) -> Self {
        Self {
            merchant_account: config.merchant_account.clone(),
            merchant_domain: config.merchant_domain.clone(),
            secret_key: config.secret_key.clone(),
        }
    }

    /// Sign `parts` joined by `;`.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Malformed` if the key is rejected by HMAC.
    pub fn sign<S: AsRef<str>>(&self, parts: &[S]) -> Result<String, PaymentError> {
        let message = parts
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(";");

        let mut mac = HmacMd5::new_from_slice(self.secret_key.expose_secret().as_bytes())
            .map_err(|e| PaymentError::Malformed(e.to_string()))?;
        mac.update(message.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Build the signed purchase form.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Malformed` if signing fails.
    pub fn checkout(
        &self,
        order: &CheckoutOrder,
        urls: &CheckoutUrls,
    ) -> Result<CheckoutSession, PaymentError> {
        let (product_name, product_count, product_price) = if order.lines.is_empty() {
            (
                vec![order.description()],
                vec!["1".to_string()],
                vec![format_amount(order.total)],
            )
        } else {
            (
                order.lines.iter().map(|l| l.name.clone()).collect(),
                order.lines.iter().map(|l| l.quantity.to_string()).collect(),
                order
                    .lines
                    .iter()
                    .map(|l| format_amount(l.unit_price))
                    .collect(),
            )
        };

        let order_date = order.created_at.timestamp();
        let amount = format_amount(order.total);

        let mut parts = vec![
            self.merchant_account.clone(),
            self.merchant_domain.clone(),
            order.order_number.clone(),
            order_date.to_string(),
            amount.clone(),
            CURRENCY.to_string(),
        ];
        parts.extend(product_name.iter().cloned());
        parts.extend(product_count.iter().cloned());
        parts.extend(product_price.iter().cloned());
        let merchant_signature = self.sign(&parts)?;

        Ok(CheckoutSession::WayForPay {
            checkout_url: CHECKOUT_URL.to_string(),
            fields: PurchaseFields {
                merchant_account: self.merchant_account.clone(),
                merchant_auth_type: "SimpleSignature".to_string(),
                merchant_domain_name: self.merchant_domain.clone(),
                merchant_signature,
                merchant_transaction_secure_type: "AUTO".to_string(),
                order_reference: order.order_number.clone(),
                order_date,
                amount,
                currency: CURRENCY.to_string(),
                product_name,
                product_count,
                product_price,
                return_url: urls.return_url.clone(),
                service_url: urls.callback_url.clone(),
                language: "UA".to_string(),
            },
        })
    }

    /// Authenticate a service-URL callback.
    ///
    /// WayForPay posts JSON, but some account setups deliver the same JSON
    /// as the single key of a form body; both are accepted.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::InvalidSignature` on a signature or merchant
    /// mismatch and `PaymentError::Malformed` when the body is not JSON.
    #[instrument(skip_all)]
    pub fn verify_callback(&self, body: &[u8]) -> Result<PaymentSignal, PaymentError> {
        let payload = parse_body(body)?;

        let parts: Vec<String> = CALLBACK_FIELDS
            .iter()
            .map(|field| json_text(payload.get(*field)))
            .collect();
        let expected = self.sign(&parts)?;
        let provided = json_text(payload.get("merchantSignature"));

        if !constant_time_compare(&expected, &provided) {
            return Err(PaymentError::InvalidSignature);
        }
        if json_text(payload.get("merchantAccount")) != self.merchant_account {
            return Err(PaymentError::InvalidSignature);
        }

        let order_number = json_text(payload.get("orderReference"));
        if order_number.is_empty() {
            return Err(PaymentError::Malformed("missing orderReference".to_string()));
        }
        let amount = Decimal::from_str(&json_text(payload.get("amount")))
            .map_err(|e| PaymentError::Malformed(format!("invalid amount: {e}")))?;

        let reference = ["authCode", "rrn"]
            .iter()
            .map(|field| json_text(payload.get(*field)))
            .find(|s| !s.is_empty());

        Ok(PaymentSignal {
            status: OrderStatus::from_wayforpay(&json_text(payload.get("transactionStatus"))),
            order_number,
            amount,
            currency: json_text(payload.get("currency")),
            reference,
            payload,
        })
    }

    /// Signed `accept` reply for a processed callback.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Malformed` if signing fails.
    pub fn acknowledge(
        &self,
        order_reference: &str,
        time: i64,
    ) -> Result<Acknowledgement, PaymentError> {
        let status = "accept";
        let signature = self.sign(&[order_reference, status, &time.to_string()])?;
        Ok(Acknowledgement {
            order_reference: order_reference.to_string(),
            status: status.to_string(),
            time,
            signature,
        })
    }
}

fn parse_body(body: &[u8]) -> Result<Value, PaymentError> {
    if let Ok(value @ Value::Object(_)) = serde_json::from_slice::<Value>(body) {
        return Ok(value);
    }

    url::form_urlencoded::parse(body)
        .find_map(|(key, value)| {
            let candidate = if value.is_empty() { key } else { value };
            match serde_json::from_str::<Value>(&candidate) {
                Ok(v @ Value::Object(_)) => Some(v),
                _ => None,
            }
        })
        .ok_or_else(|| PaymentError::Malformed("callback body is not JSON".to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::super::CheckoutLine;
    use super::*;

    fn client() -> WayForPay {
        WayForPay::new(&WayForPayConfig {
            merchant_account: "test_merch_n1".to_string(),
            secret_key: SecretString::from("flk3409refn54t54t*FNJRET"),
            merchant_domain: "www.market.ua".to_string(),
        })
    }

    fn callback() -> Value {
        json!({
            "merchantAccount": "test_merch_n1",
            "orderReference": "RC-260307-00A1B2",
            "merchantSignature": "a7e456dcecff83899d42f1fd713855e8",
            "amount": 1547.36,
            "currency": "UAH",
            "authCode": "541963",
            "email": "client@mail.ua",
            "phone": "380501234567",
            "createdDate": 1_415_379_863,
            "processingDate": 1_415_379_863,
            "cardPan": "41****8217",
            "cardType": "Visa",
            "issuerBankCountry": "980",
            "issuerBankName": "Privatbank",
            "transactionStatus": "Approved",
            "reason": "1100",
            "reasonCode": 1100,
            "fee": 0,
            "paymentSystem": "card"
        })
    }

    #[test]
    fn test_purchase_signature_known_vector() {
        let parts = [
            "test_merch_n1",
            "www.market.ua",
            "DH1557",
            "1415379863",
            "1547.36",
            "UAH",
            "Процессор Intel Core i5-4670 3.4GHz",
            "Память Kingston DDR3-1600 4096MB PC3-12800",
            "1",
            "1",
            "1000",
            "547.36",
        ];
        assert_eq!(
            client().sign(&parts).unwrap(),
            "fffde76ca3e7ad63a9d332a69d085280"
        );
    }

    #[test]
    fn test_verify_callback() {
        let body = serde_json::to_vec(&callback()).unwrap();
        let signal = client().verify_callback(&body).unwrap();

        assert_eq!(signal.order_number, "RC-260307-00A1B2");
        assert_eq!(signal.status, OrderStatus::Paid);
        assert_eq!(signal.amount, Decimal::new(154_736, 2));
        assert_eq!(signal.reference.as_deref(), Some("541963"));
    }

    #[test]
    fn test_verify_callback_as_form_key() {
        let json = serde_json::to_string(&callback()).unwrap();
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_key_only(&json)
            .finish();

        assert!(client().verify_callback(body.as_bytes()).is_ok());
    }

    #[test]
    fn test_verify_callback_rejects_tampering() {
        let mut tampered = callback();
        tampered["transactionStatus"] = json!("Declined");
        let body = serde_json::to_vec(&tampered).unwrap();
        assert!(matches!(
            client().verify_callback(&body),
            Err(PaymentError::InvalidSignature)
        ));

        assert!(matches!(
            client().verify_callback(b"not json"),
            Err(PaymentError::Malformed(_))
        ));
    }

    #[test]
    fn test_acknowledge_known_vector() {
        let ack = client()
            .acknowledge("RC-260307-00A1B2", 1_415_379_863)
            .unwrap();

        assert_eq!(ack.status, "accept");
        assert_eq!(ack.signature, "8cead6898246a238bad4ef22c056b3b0");

        let json = serde_json::to_value(&ack).unwrap();
        assert_eq!(json["orderReference"], "RC-260307-00A1B2");
        assert_eq!(json["time"], 1_415_379_863);
    }

    #[test]
    fn test_checkout_fields() {
        let order = CheckoutOrder {
            order_number: "RC-260307-00A1B2".to_string(),
            total: Decimal::from(1700),
            created_at: Utc.timestamp_opt(1_772_841_600, 0).unwrap(),
            lines: vec![
                CheckoutLine {
                    name: "Сумка Лоза".to_string(),
                    quantity: 2,
                    unit_price: Decimal::from(600),
                },
                CheckoutLine {
                    name: "Ремінець".to_string(),
                    quantity: 1,
                    unit_price: Decimal::new(50_000, 2),
                },
            ],
        };
        let urls = CheckoutUrls {
            callback_url: "https://api.ruchna.ua/api/payments/wayforpay/callback".to_string(),
            return_url: "https://api.ruchna.ua/api/payments/wayforpay/return".to_string(),
        };

        let CheckoutSession::WayForPay { fields, .. } = client().checkout(&order, &urls).unwrap()
        else {
            panic!("expected a WayForPay session");
        };

        assert_eq!(fields.amount, "1700");
        assert_eq!(fields.order_date, 1_772_841_600);
        assert_eq!(fields.product_count, ["2", "1"]);
        assert_eq!(fields.product_price, ["600", "500"]);

        let expected = client()
            .sign(&[
                "test_merch_n1",
                "www.market.ua",
                "RC-260307-00A1B2",
                "1772841600",
                "1700",
                "UAH",
                "Сумка Лоза",
                "Ремінець",
                "2",
                "1",
                "600",
                "500",
            ])
            .unwrap();
        assert_eq!(fields.merchant_signature, expected);
    }
}
