//! Preorder lead capture.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use validator::Validate;

use ruchna_core::{Email, PreorderLeadId};

use crate::db::LeadRepository;
use crate::error::{AppError, Result};
use crate::models::NewPreorderLead;
use crate::routes::input::{Problems, non_blank, trimmed_name};
use crate::services::telegram;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct PreorderRequest {
    #[validate(custom(function = "trimmed_name"))]
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    #[validate(length(max = 200))]
    pub product_slug: Option<String>,
    #[validate(length(max = 100))]
    pub variant_color: Option<String>,
    #[validate(length(max = 1000, message = "comment is too long"))]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PreorderCreated {
    pub id: PreorderLeadId,
}

/// `POST /api/preorders`
#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    payload: std::result::Result<Json<PreorderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PreorderCreated>)> {
    let Json(request) = payload?;

    let mut problems = Problems::of(&request);
    let phone = problems.phone("phone", &request.phone);
    let email = problems.email("email", request.email.as_deref());
    problems.finish("Invalid preorder")?;
    let phone = phone.ok_or_else(|| AppError::Internal("phone missing after validation".into()))?;

    let lead = LeadRepository::new(state.pool())
        .create(&NewPreorderLead {
            name: request.name.trim().to_string(),
            phone: phone.to_string(),
            email: email.map(Email::into_inner),
            product_slug: non_blank(request.product_slug),
            variant_color: non_blank(request.variant_color),
            comment: non_blank(request.comment),
        })
        .await?;
    tracing::info!(lead_id = %lead.id, product = ?lead.product_slug, "Preorder lead captured");

    let text = telegram::lead_message(&lead);
    state.notify(move |bot| async move { bot.send_message(&text).await });

    Ok((StatusCode::CREATED, Json(PreorderCreated { id: lead.id })))
}
