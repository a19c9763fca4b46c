//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::header::CACHE_CONTROL,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::instrument;

use ruchna_core::VariantId;
use ruchna_core::catalog::{CatalogFacets, CatalogFilter, CatalogProduct, SortKey};

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::models::ProductDetail;
use crate::state::AppState;

/// Listing and facets may sit in shared caches as long as the snapshot does.
const PUBLIC_CACHE: &str = "public, max-age=60";

#[derive(Serialize)]
struct ProductList {
    products: Vec<CatalogProduct>,
    total: usize,
    sort: SortKey,
}

/// List active products, filtered and sorted.
///
/// Query parameters: `q`, `in_stock`, `type`, `color`, `min_price`,
/// `max_price`, `sort` (`popular`, `cheap`, `exp`, `new`).
#[instrument(skip(state, filter))]
pub async fn index(
    State(state): State<AppState>,
    filter: std::result::Result<Query<CatalogFilter>, QueryRejection>,
) -> Result<Response> {
    let Query(filter) = filter?;
    let catalog = state.catalog().products().await?;
    let products = filter.apply(&catalog);

    let body = ProductList {
        total: products.len(),
        sort: filter.sort,
        products,
    };
    Ok(([(CACHE_CONTROL, PUBLIC_CACHE)], Json(body)).into_response())
}

/// Filter facets over every active product.
#[instrument(skip(state))]
pub async fn facets(State(state): State<AppState>) -> Result<Response> {
    let catalog = state.catalog().products().await?;
    let facets = CatalogFacets::collect(&catalog);
    Ok(([(CACHE_CONTROL, PUBLIC_CACHE)], Json(facets)).into_response())
}

/// Product page payload: variants with images and addon suggestions.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ProductDetail>> {
    let repo = ProductRepository::new(state.pool());

    let product = repo
        .get_active_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

    let variants = repo.variants_for(&[product.id]).await?;
    let variant_ids: Vec<VariantId> = variants.iter().map(|v| v.id).collect();
    let images = repo.images_for(&variant_ids).await?;
    let addons = repo.addons_for(&variant_ids).await?;

    Ok(Json(ProductDetail::assemble(
        product, variants, images, addons,
    )))
}
