//! Order browsing and manual status changes.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
};
use serde::Deserialize;
use tracing::instrument;

use ruchna_core::{OrderId, OrderStatus};

use crate::db::{OrderRepository, StatusChange};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdminAuth;
use crate::models::{Order, OrderDetail, OrderListItem, Page, Pagination};
use crate::state::AppState;

/// `?status=&page=&per_page=`
#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl OrderListQuery {
    fn status(&self) -> Result<Option<OrderStatus>> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| AppError::field("status", format!("unknown status '{raw}'"))),
        }
    }

    const fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

/// `GET /api/admin/orders`
pub async fn index(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    query: std::result::Result<Query<OrderListQuery>, QueryRejection>,
) -> Result<Json<Page<OrderListItem>>> {
    let Query(query) = query?;
    let status = query.status()?;
    let page = OrderRepository::new(state.pool())
        .list(status, query.pagination())
        .await?;
    Ok(Json(page))
}

/// `GET /api/admin/orders/{id}`
pub async fn show(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    id: std::result::Result<Path<OrderId>, PathRejection>,
) -> Result<Json<OrderDetail>> {
    let Path(id) = id?;
    OrderRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Order".to_string()))
}

/// `PATCH /api/admin/orders/{id}/status`
///
/// A paid or fulfilled order cannot be sent back to pending or failed.
#[instrument(skip(state, payload))]
pub async fn update_status(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    id: std::result::Result<Path<OrderId>, PathRejection>,
    payload: std::result::Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<Order>> {
    let Path(id) = id?;
    let Json(request) = payload?;

    let next: OrderStatus = request.status.trim().parse().map_err(|_| {
        AppError::field("status", format!("unknown status '{}'", request.status))
    })?;

    match OrderRepository::new(state.pool()).set_status(id, next).await? {
        StatusChange::Updated(order) => {
            tracing::info!(order_id = %id, status = %next, "Order status changed by admin");
            Ok(Json(order))
        }
        StatusChange::Refused(current) => Err(AppError::field(
            "status",
            format!("cannot change a {current} order to {next}"),
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn query(status: Option<&str>) -> OrderListQuery {
        OrderListQuery {
            status: status.map(ToString::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_status_filter_parsing() {
        assert_eq!(query(None).status().unwrap(), None);
        assert_eq!(query(Some("  ")).status().unwrap(), None);
        assert_eq!(
            query(Some("paid")).status().unwrap(),
            Some(OrderStatus::Paid)
        );
        assert!(matches!(
            query(Some("shipped-ish")).status(),
            Err(AppError::Validation { .. })
        ));
    }

    #[test]
    fn test_pagination_passthrough() {
        let q = OrderListQuery {
            status: None,
            page: Some(2),
            per_page: Some(50),
        };
        assert_eq!(q.pagination().offset(), 50);
    }
}
