//! Domain models for the storefront.
//!
//! Row types derive `sqlx::FromRow` and are read with runtime queries;
//! view types are what the JSON API serializes.

pub mod lead;
pub mod order;
pub mod product;

pub use lead::{NewPreorderLead, PreorderLead};
pub use order::{NewOrder, Order, OrderItem, OrderSummary};
pub use product::{
    AddonLink, PricedVariant, Product, ProductDetail, Variant, VariantImage, catalog_products,
};
