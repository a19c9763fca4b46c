//! Authentication extractor and session helpers for admin.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::{CurrentAdmin, session_keys};

/// Extractor that requires an authenticated admin session.
///
/// ```rust,ignore
/// async fn protected(RequireAdminAuth(admin): RequireAdminAuth) -> impl IntoResponse {
///     format!("logged in at {}", admin.logged_in_at)
/// }
/// ```
pub struct RequireAdminAuth(pub CurrentAdmin);

/// Rejection for requests without an admin session.
#[derive(Debug)]
pub struct AdminAuthRejection;

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        AppError::Unauthorized("Login required".to_string()).into_response()
    }
}

impl<S> FromRequestParts<S> for RequireAdminAuth
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AdminAuthRejection)?;

        let admin: CurrentAdmin = session
            .get(session_keys::CURRENT_ADMIN)
            .await
            .ok()
            .flatten()
            .ok_or(AdminAuthRejection)?;

        Ok(Self(admin))
    }
}

/// Whether the session belongs to a logged-in admin.
pub async fn is_logged_in(session: &Session) -> bool {
    session
        .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await
        .ok()
        .flatten()
        .is_some()
}

/// Rotate the session id and store the current admin.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Drop the whole session (logout).
///
/// # Errors
///
/// Returns an error if the session store cannot delete the record.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
