//! Order status, payment providers, and the provider-status mapping.
//!
//! Every provider reports its own vocabulary of transaction states. They are
//! folded into [`OrderStatus`] here so the callback handlers only decide
//! whether a signal is authentic, never what it means.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle status of an order.
///
/// Stored in PostgreSQL as the `shop.order_status` enum with lowercase labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.order_status", rename_all = "lowercase")
)]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Cancelled,
    Fulfilled,
}

impl OrderStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Paid,
        Self::Failed,
        Self::Cancelled,
        Self::Fulfilled,
    ];

    /// Wire representation (`PENDING`, `PAID`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
            Self::Fulfilled => "FULFILLED",
        }
    }

    /// Whether money has been received for the order.
    #[must_use]
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Paid | Self::Fulfilled)
    }

    /// Map a LiqPay `status` field.
    #[must_use]
    pub fn from_liqpay(status: &str) -> Self {
        match status {
            "success" | "sandbox" => Self::Paid,
            "failure" | "error" => Self::Failed,
            "reversed" => Self::Cancelled,
            _ => Self::Pending,
        }
    }

    /// Map a WayForPay `transactionStatus` field.
    #[must_use]
    pub fn from_wayforpay(status: &str) -> Self {
        match status {
            "Approved" => Self::Paid,
            "Declined" | "Expired" => Self::Failed,
            "Refunded" | "Voided" | "RefundInProcessing" => Self::Cancelled,
            _ => Self::Pending,
        }
    }

    /// Map a Fondy `order_status` field.
    #[must_use]
    pub fn from_fondy(status: &str) -> Self {
        match status {
            "approved" => Self::Paid,
            "declined" | "expired" => Self::Failed,
            "reversed" => Self::Cancelled,
            _ => Self::Pending,
        }
    }

    /// Fold a provider signal into the current status.
    ///
    /// A settled order keeps its status no matter what arrives afterwards, so
    /// replayed or out-of-order callbacks can never downgrade a paid order.
    #[must_use]
    pub const fn apply_payment_signal(self, signal: Self) -> Self {
        if self.is_settled() { self } else { signal }
    }

    /// Whether an admin may move the order from `self` to `next` by hand.
    #[must_use]
    pub const fn can_set_manually(self, next: Self) -> bool {
        !(self.is_settled() && matches!(next, Self::Pending | Self::Failed))
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known status or provider.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl FromStr for OrderStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseEnumError {
                kind: "order status",
                value: s.to_owned(),
            })
    }
}

/// Online payment gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    LiqPay,
    WayForPay,
    Fondy,
}

impl PaymentProvider {
    /// Path segment and wire name (`liqpay`, `wayforpay`, `fondy`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LiqPay => "liqpay",
            Self::WayForPay => "wayforpay",
            Self::Fondy => "fondy",
        }
    }
}

impl fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentProvider {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "liqpay" => Ok(Self::LiqPay),
            "wayforpay" => Ok(Self::WayForPay),
            "fondy" => Ok(Self::Fondy),
            _ => Err(ParseEnumError {
                kind: "payment provider",
                value: s.to_owned(),
            }),
        }
    }
}

/// How the customer pays for an order.
///
/// Stored as the `shop.payment_method` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.payment_method", rename_all = "snake_case")
)]
pub enum PaymentMethod {
    #[serde(rename = "liqpay")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "liqpay"))]
    LiqPay,
    #[serde(rename = "wayforpay")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "wayforpay"))]
    WayForPay,
    Fondy,
    #[default]
    CashOnDelivery,
}

impl PaymentMethod {
    /// The gateway behind this method, if it is an online one.
    #[must_use]
    pub const fn provider(self) -> Option<PaymentProvider> {
        match self {
            Self::LiqPay => Some(PaymentProvider::LiqPay),
            Self::WayForPay => Some(PaymentProvider::WayForPay),
            Self::Fondy => Some(PaymentProvider::Fondy),
            Self::CashOnDelivery => None,
        }
    }

    /// Wire and database spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LiqPay => "liqpay",
            Self::WayForPay => "wayforpay",
            Self::Fondy => "fondy",
            Self::CashOnDelivery => "cash_on_delivery",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<PaymentProvider> for PaymentMethod {
    fn from(provider: PaymentProvider) -> Self {
        match provider {
            PaymentProvider::LiqPay => Self::LiqPay,
            PaymentProvider::WayForPay => Self::WayForPay,
            PaymentProvider::Fondy => Self::Fondy,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_liqpay_mapping() {
        assert_eq!(OrderStatus::from_liqpay("success"), OrderStatus::Paid);
        assert_eq!(OrderStatus::from_liqpay("sandbox"), OrderStatus::Paid);
        assert_eq!(OrderStatus::from_liqpay("failure"), OrderStatus::Failed);
        assert_eq!(OrderStatus::from_liqpay("error"), OrderStatus::Failed);
        assert_eq!(OrderStatus::from_liqpay("reversed"), OrderStatus::Cancelled);
        assert_eq!(OrderStatus::from_liqpay("wait_accept"), OrderStatus::Pending);
        assert_eq!(OrderStatus::from_liqpay("3ds_verify"), OrderStatus::Pending);
    }

    #[test]
    fn test_wayforpay_mapping_is_case_sensitive() {
        assert_eq!(OrderStatus::from_wayforpay("Approved"), OrderStatus::Paid);
        assert_eq!(OrderStatus::from_wayforpay("Expired"), OrderStatus::Failed);
        assert_eq!(
            OrderStatus::from_wayforpay("RefundInProcessing"),
            OrderStatus::Cancelled
        );
        assert_eq!(OrderStatus::from_wayforpay("InProcessing"), OrderStatus::Pending);
        assert_eq!(OrderStatus::from_wayforpay("approved"), OrderStatus::Pending);
    }

    #[test]
    fn test_fondy_mapping() {
        assert_eq!(OrderStatus::from_fondy("approved"), OrderStatus::Paid);
        assert_eq!(OrderStatus::from_fondy("declined"), OrderStatus::Failed);
        assert_eq!(OrderStatus::from_fondy("reversed"), OrderStatus::Cancelled);
        assert_eq!(OrderStatus::from_fondy("processing"), OrderStatus::Pending);
    }

    #[test]
    fn test_paid_is_never_downgraded() {
        for signal in OrderStatus::ALL {
            assert_eq!(
                OrderStatus::Paid.apply_payment_signal(signal),
                OrderStatus::Paid
            );
            assert_eq!(
                OrderStatus::Fulfilled.apply_payment_signal(signal),
                OrderStatus::Fulfilled
            );
        }
        assert_eq!(
            OrderStatus::Pending.apply_payment_signal(OrderStatus::Paid),
            OrderStatus::Paid
        );
        assert_eq!(
            OrderStatus::Failed.apply_payment_signal(OrderStatus::Paid),
            OrderStatus::Paid
        );
    }

    #[test]
    fn test_apply_is_idempotent() {
        for current in OrderStatus::ALL {
            for signal in OrderStatus::ALL {
                let once = current.apply_payment_signal(signal);
                assert_eq!(once.apply_payment_signal(signal), once);
            }
        }
    }

    #[test]
    fn test_manual_transitions() {
        assert!(!OrderStatus::Paid.can_set_manually(OrderStatus::Pending));
        assert!(!OrderStatus::Fulfilled.can_set_manually(OrderStatus::Failed));
        assert!(OrderStatus::Paid.can_set_manually(OrderStatus::Fulfilled));
        assert!(OrderStatus::Paid.can_set_manually(OrderStatus::Cancelled));
        assert!(OrderStatus::Failed.can_set_manually(OrderStatus::Pending));
    }

    #[test]
    fn test_serde_and_parsing() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Cancelled).unwrap(),
            "\"CANCELLED\""
        );
        assert_eq!("paid".parse::<OrderStatus>().unwrap(), OrderStatus::Paid);
        assert!("shipped".parse::<OrderStatus>().is_err());

        assert_eq!(
            "WayForPay".parse::<PaymentProvider>().unwrap(),
            PaymentProvider::WayForPay
        );
        assert_eq!(
            serde_json::to_string(&PaymentMethod::CashOnDelivery).unwrap(),
            "\"cash_on_delivery\""
        );
        assert_eq!(
            serde_json::from_str::<PaymentMethod>("\"liqpay\"").unwrap(),
            PaymentMethod::LiqPay
        );
    }
}
