//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Every error body is JSON: `{"error": "..."}`, plus `"details"` mapping
//! field paths to messages for validation failures.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::db::RepositoryError;
use crate::services::nova_poshta::NovaPoshtaError;
use crate::services::payments::PaymentError;

/// Field path → messages, e.g. `items[0].quantity`.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Nova Poshta API failed.
    #[error("Nova Poshta error: {0}")]
    NovaPoshta(#[from] NovaPoshtaError),

    /// Payment provider failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Request body or query failed validation.
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        details: FieldErrors,
    },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

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

    fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Payment(PaymentError::NotConfigured(_)) => StatusCode::BAD_REQUEST,
            Self::NovaPoshta(_) | Self::Payment(_) => StatusCode::BAD_GATEWAY,
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

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(RepositoryError::Conflict(_)) => "Conflict".to_string(),
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Payment(PaymentError::NotConfigured(provider)) => {
                format!("{provider} is not available")
            }
            Self::NovaPoshta(_) | Self::Payment(_) => "External service error".to_string(),
            Self::Validation { message, .. } => message.clone(),
            Self::NotFound(what) => format!("{what} not found"),
            Self::BadRequest(message) => message.clone(),
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
///
/// Nested structs become `customer.phone`, list entries `items[2].quantity`.
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
                let messages = out.entry(path).or_default();
                messages.extend(list.iter().map(|e| {
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

/// Add a breadcrumb for a notable step.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ruchna_core::PaymentProvider;
    use validator::Validate;

    use super::*;

    #[derive(Validate)]
    struct Line {
        #[validate(range(min = 1, max = 99, message = "quantity must be between 1 and 99"))]
        quantity: i32,
    }

    #[derive(Validate)]
    struct Request {
        #[validate(length(min = 2))]
        name: String,
        #[validate(nested)]
        items: Vec<Line>,
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
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
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Payment(PaymentError::NotConfigured(
                PaymentProvider::Fondy
            ))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::NovaPoshta(NovaPoshtaError::Api("down".to_string()))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_flatten_nested_errors() {
        let request = Request {
            name: "A".to_string(),
            items: vec![Line { quantity: 1 }, Line { quantity: 0 }],
        };
        let errors = request.validate().unwrap_err();
        let flat = flatten_validation_errors(&errors);

        assert_eq!(flat["name"], ["length"]);
        assert_eq!(
            flat["items[1].quantity"],
            ["quantity must be between 1 and 99"]
        );
        assert!(!flat.contains_key("items[0].quantity"));
    }

    #[tokio::test]
    async fn test_validation_body_has_details() {
        let mut details = FieldErrors::new();
        details.insert("phone".to_string(), vec!["not a Ukrainian number".to_string()]);
        let response = AppError::validation("Invalid order", details).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Invalid order");
        assert_eq!(json["details"]["phone"][0], "not a Ukrainian number");
    }

    #[tokio::test]
    async fn test_internal_error_body_is_generic() {
        let response = AppError::Internal("connection refused at 10.0.0.3".to_string())
            .into_response();
        let json = body_json(response).await;

        assert_eq!(json, serde_json::json!({"error": "Internal server error"}));
    }
}
