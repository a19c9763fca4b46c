//! Unified error handling for admin.
//!
//! Error bodies are JSON `{"error": "..."}`; validation failures add
//! `"details"` keyed by field path.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::db::RepositoryError;
use crate::services::cloudinary::CloudinaryError;

/// Field path → messages, e.g. `variants[1].color`.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Application-level error type for the admin API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Cloudinary upload failed.
    #[error("Cloudinary error: {0}")]
    Cloudinary(#[from] CloudinaryError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Request body or query failed validation.
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        details: FieldErrors,
    },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a FieldErrors>,
}

impl AppError {
    /// Validation error with per-field details.
    #[must_use]
    pub fn validation(message: impl Into<String>, details: FieldErrors) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    /// Validation error for a single field.
    #[must_use]
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut details = FieldErrors::new();
        details.insert(field.to_string(), vec![message.into()]);
        Self::validation("Invalid request", details)
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Session(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Cloudinary(CloudinaryError::NotConfigured) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Cloudinary(_) => StatusCode::BAD_GATEWAY,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Validation { .. } | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        Self::validation("Invalid request", flatten_validation_errors(&errors))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() || matches!(self, Self::Cloudinary(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(RepositoryError::Conflict(what)) => format!("Conflict: {what}"),
            Self::Database(_) | Self::Session(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
            Self::Cloudinary(CloudinaryError::NotConfigured) => {
                "Image uploads are not configured".to_string()
            }
            Self::Cloudinary(_) => "External service error".to_string(),
            Self::Validation { message, .. } => message.clone(),
            Self::NotFound(what) => format!("{what} not found"),
            Self::Unauthorized(message) | Self::BadRequest(message) => message.clone(),
        };

        let details = match &self {
            Self::Validation { details, .. } => Some(details),
            _ => None,
        };

        (
            status,
            Json(ErrorBody {
                error: &message,
                details,
            }),
        )
            .into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Flatten nested validator errors into `path → messages`.
#[must_use]
pub fn flatten_validation_errors(errors: &ValidationErrors) -> FieldErrors {
    let mut out = FieldErrors::new();
    collect(errors, "", &mut out);
    out
}

fn collect(errors: &ValidationErrors, prefix: &str, out: &mut FieldErrors) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };

        match kind {
            ValidationErrorsKind::Field(list) => {
                out.entry(path).or_default().extend(list.iter().map(|e| {
                    e.message
                        .as_ref()
                        .map_or_else(|| e.code.to_string(), ToString::to_string)
                }));
            }
            ValidationErrorsKind::Struct(inner) => collect(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect(inner, &format!("{path}[{index}]"), out);
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Product".to_string());
        assert_eq!(err.to_string(), "Not found: Product");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::Conflict(
                "slug".to_string()
            ))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::field("status", "not allowed")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Cloudinary(CloudinaryError::NotConfigured)),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            get_status(AppError::Cloudinary(CloudinaryError::Api(
                "Invalid image".to_string()
            ))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_unauthorized_body_is_json() {
        let response = AppError::Unauthorized("Login required".to_string()).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body, serde_json::json!({"error": "Login required"}));
    }
}
