//! Preorder lead listing.

use sqlx::PgPool;

use super::RepositoryError;
use crate::models::{Page, Pagination, PreorderLead};

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

    /// Leads, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(&self, pagination: Pagination) -> Result<Page<PreorderLead>, RepositoryError> {
        let total: i64 = sqlx::query_scalar("SELECT count(*) FROM shop.preorder_lead")
            .fetch_one(self.pool)
            .await?;

        let items = sqlx::query_as::<_, PreorderLead>(
            r"
            SELECT id, name, phone, email, product_slug, variant_color, comment, created_at
            FROM shop.preorder_lead
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(i64::from(pagination.per_page()))
        .bind(pagination.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(Page::new(items, total, pagination))
    }
}
