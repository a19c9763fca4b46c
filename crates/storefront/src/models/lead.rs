//! Preorder leads.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use ruchna_core::PreorderLeadId;

/// A row of `shop.preorder_lead`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PreorderLead {
    pub id: PreorderLeadId,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub product_slug: Option<String>,
    pub variant_color: Option<String>,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Validated lead ready to insert.
#[derive(Debug, Clone)]
pub struct NewPreorderLead {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub product_slug: Option<String>,
    pub variant_color: Option<String>,
    pub comment: Option<String>,
}
