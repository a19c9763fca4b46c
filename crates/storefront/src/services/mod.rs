//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `catalog` - 60-second in-memory snapshot of the active catalog
//! - `pricing` - Cart quotes shared by `/api/cart/quote` and order creation
//! - `payments` - LiqPay, WayForPay and Fondy checkout and callbacks
//! - `nova_poshta` - Cached Nova Poshta address lookups
//! - `telegram` - Staff notifications

pub mod catalog;
pub mod nova_poshta;
pub mod payments;
pub mod pricing;
pub mod telegram;
