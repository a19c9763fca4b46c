//! Password login for the shared admin account.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::{clear_current_admin, is_logged_in, set_current_admin};
use crate::models::CurrentAdmin;
use crate::services::password::verify_password;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Serialize)]
pub struct SessionStatus {
    pub authenticated: bool,
}

/// `POST /api/admin/login`
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<SessionStatus>> {
    let Json(request) = payload?;

    if !verify_password(&state.config().password, &request.password) {
        tracing::warn!("Admin login failed");
        return Err(AppError::Unauthorized("Invalid password".to_string()));
    }

    let admin = CurrentAdmin {
        logged_in_at: chrono::Utc::now(),
    };
    set_current_admin(&session, &admin).await?;
    tracing::info!("Admin logged in");

    Ok(Json(SessionStatus {
        authenticated: true,
    }))
}

/// `POST /api/admin/logout`
pub async fn logout(session: Session) -> Result<Json<SessionStatus>> {
    clear_current_admin(&session).await?;
    Ok(Json(SessionStatus {
        authenticated: false,
    }))
}

/// `GET /api/admin/session`
pub async fn session(session: Session) -> Json<SessionStatus> {
    Json(SessionStatus {
        authenticated: is_logged_in(&session).await,
    })
}
