//! Catalog management.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use tracing::instrument;
use validator::Validate;

use ruchna_core::ProductId;
use ruchna_core::slug::slugify;

use crate::db::ProductRepository;
use crate::error::{AppError, FieldErrors, Result, flatten_validation_errors};
use crate::middleware::RequireAdminAuth;
use crate::models::{AdminProduct, ProductInput, ProductSummary};
use crate::state::AppState;

/// Validate a payload and settle its slug.
///
/// Field errors and cross-variant problems are reported together.
fn checked(input: &ProductInput) -> Result<String> {
    let mut details: FieldErrors = match input.validate() {
        Ok(()) => FieldErrors::new(),
        Err(errors) => flatten_validation_errors(&errors),
    };
    for (field, messages) in input.cross_field_problems() {
        details.entry(field).or_default().extend(messages);
    }

    let slug = match input.slug.as_deref().map(str::trim) {
        Some(slug) if !slug.is_empty() => slug.to_string(),
        _ => slugify(&input.name),
    };
    if slug.is_empty() && !details.contains_key("slug") {
        details.insert(
            "slug".to_string(),
            vec!["could not derive a slug from the name, set one".to_string()],
        );
    }

    if details.is_empty() {
        Ok(slug)
    } else {
        Err(AppError::validation("Invalid product", details))
    }
}

async fn load(state: &AppState, id: ProductId) -> Result<AdminProduct> {
    ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
}

/// `GET /api/admin/products`
pub async fn index(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductSummary>>> {
    let products = ProductRepository::new(state.pool()).list().await?;
    Ok(Json(products))
}

/// `GET /api/admin/products/{id}`
pub async fn show(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    id: std::result::Result<Path<ProductId>, PathRejection>,
) -> Result<Json<AdminProduct>> {
    let Path(id) = id?;
    Ok(Json(load(&state, id).await?))
}

/// `POST /api/admin/products`
#[instrument(skip(state, payload))]
pub async fn create(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    payload: std::result::Result<Json<ProductInput>, JsonRejection>,
) -> Result<(StatusCode, Json<AdminProduct>)> {
    let Json(input) = payload?;
    let slug = checked(&input)?;

    let id = ProductRepository::new(state.pool())
        .create(&slug, &input)
        .await?;
    tracing::info!(product_id = %id, %slug, variants = input.variants.len(), "Product created");

    Ok((StatusCode::CREATED, Json(load(&state, id).await?)))
}

/// `PUT /api/admin/products/{id}`
#[instrument(skip(state, payload))]
pub async fn update(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    id: std::result::Result<Path<ProductId>, PathRejection>,
    payload: std::result::Result<Json<ProductInput>, JsonRejection>,
) -> Result<Json<AdminProduct>> {
    let Path(id) = id?;
    let Json(input) = payload?;
    let slug = checked(&input)?;

    ProductRepository::new(state.pool())
        .update(id, &slug, &input)
        .await?;
    tracing::info!(product_id = %id, %slug, variants = input.variants.len(), "Product updated");

    Ok(Json(load(&state, id).await?))
}

/// `DELETE /api/admin/products/{id}`
#[instrument(skip(state))]
pub async fn destroy(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    id: std::result::Result<Path<ProductId>, PathRejection>,
) -> Result<StatusCode> {
    let Path(id) = id?;
    ProductRepository::new(state.pool()).delete(id).await?;
    tracing::info!(product_id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}
