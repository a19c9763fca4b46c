//! Domain models for the admin API.
//!
//! Row types derive `sqlx::FromRow`; admin views expose every column,
//! customer contact details and raw provider payloads included.

pub mod lead;
pub mod order;
pub mod product;
pub mod session;

pub use lead::PreorderLead;
pub use order::{Order, OrderDetail, OrderItem, OrderListItem};
pub use product::{
    AddonInput, AdminProduct, AdminVariant, ImageInput, Product, ProductInput, ProductSummary,
    Variant, VariantImage, VariantInput,
};
pub use session::{CurrentAdmin, keys as session_keys};

use serde::{Deserialize, Serialize};

/// Default page size for admin listings.
pub const DEFAULT_PER_PAGE: u32 = 25;
/// Largest page size a client may ask for.
pub const MAX_PER_PAGE: u32 = 100;

/// `?page=&per_page=` query parameters; pages are 1-based.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl Pagination {
    /// Page number, at least 1.
    #[must_use]
    pub fn page(self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size clamped to `1..=MAX_PER_PAGE`.
    #[must_use]
    pub fn per_page(self) -> u32 {
        self.per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE)
    }

    /// Rows to skip.
    #[must_use]
    pub fn offset(self) -> i64 {
        i64::from(self.page() - 1) * i64::from(self.per_page())
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, total: i64, pagination: Pagination) -> Self {
        Self {
            items,
            total,
            page: pagination.page(),
            per_page: pagination.per_page(),
        }
    }
}
