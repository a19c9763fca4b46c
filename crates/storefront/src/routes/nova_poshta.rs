//! Nova Poshta lookup proxy.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::routes::input::Problems;
use crate::services::nova_poshta::{City, Warehouse};
use crate::state::AppState;

/// Shortest settlement query worth sending to the carrier.
const MIN_QUERY_CHARS: usize = 2;

#[derive(Debug, Deserialize)]
pub struct CityQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct WarehouseQuery {
    #[serde(default)]
    pub city_ref: String,
    #[serde(default)]
    pub q: String,
}

/// `GET /api/nova-poshta/cities?q=`
#[instrument(skip(state, query))]
pub async fn cities(
    State(state): State<AppState>,
    query: std::result::Result<Query<CityQuery>, QueryRejection>,
) -> Result<Json<Arc<Vec<City>>>> {
    let Query(query) = query?;
    let q = query.q.trim();

    if q.chars().count() < MIN_QUERY_CHARS {
        let mut problems = Problems::default();
        problems.add("q", "enter at least 2 characters");
        problems.finish("Query is too short")?;
    }

    Ok(Json(state.nova_poshta().search_cities(q).await?))
}

/// `GET /api/nova-poshta/warehouses?city_ref=&q=`
#[instrument(skip(state, query))]
pub async fn warehouses(
    State(state): State<AppState>,
    query: std::result::Result<Query<WarehouseQuery>, QueryRejection>,
) -> Result<Json<Arc<Vec<Warehouse>>>> {
    let Query(query) = query?;
    let city_ref = query.city_ref.trim();

    if city_ref.is_empty() {
        return Err(AppError::BadRequest("city_ref is required".to_string()));
    }

    Ok(Json(
        state
            .nova_poshta()
            .warehouses(city_ref, query.q.trim())
            .await?,
    ))
}
