//! Preorder lead capture.

use sqlx::PgPool;

use super::RepositoryError;
use crate::models::{NewPreorderLead, PreorderLead};

/// Repository for preorder leads.
pub struct LeadRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> LeadRepository<'a> {
    /// Create a new lead repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a lead.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, lead: &NewPreorderLead) -> Result<PreorderLead, RepositoryError> {
        let row = sqlx::query_as::<_, PreorderLead>(
            r"
            INSERT INTO shop.preorder_lead (name, phone, email, product_slug, variant_color, comment)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, phone, email, product_slug, variant_color, comment, created_at
            ",
        )
        .bind(&lead.name)
        .bind(&lead.phone)
        .bind(lead.email.as_deref())
        .bind(lead.product_slug.as_deref())
        .bind(lead.variant_color.as_deref())
        .bind(lead.comment.as_deref())
        .fetch_one(self.pool)
        .await?;
        Ok(row)
    }
}
