//! Preorder lead listing.

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};

use crate::db::LeadRepository;
use crate::error::Result;
use crate::middleware::RequireAdminAuth;
use crate::models::{Page, Pagination, PreorderLead};
use crate::state::AppState;

/// `GET /api/admin/preorders`
pub async fn index(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    query: std::result::Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<Page<PreorderLead>>> {
    let Query(pagination) = query?;
    let page = LeadRepository::new(state.pool()).list(pagination).await?;
    Ok(Json(page))
}
