//! Product image uploads.

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::RequireAdminAuth;
use crate::routes::MAX_UPLOAD_BYTES;
use crate::services::cloudinary::UploadedImage;
use crate::state::AppState;

/// Multipart field carrying the image.
const FILE_FIELD: &str = "file";

/// `POST /api/admin/uploads`
///
/// Expects a multipart body with a single `file` part of an `image/*` type.
#[instrument(skip_all)]
pub async fn create(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadedImage>)> {
    let cloudinary = state.cloudinary()?;
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        check_content_type(&content_type)?;
        let file_name = field.file_name().unwrap_or("upload").to_string();

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        check_size(bytes.len())?;

        let image = cloudinary
            .upload(&file_name, &content_type, bytes.to_vec())
            .await?;
        tracing::info!(public_id = %image.public_id, size = bytes.len(), "Image uploaded");

        return Ok((StatusCode::CREATED, Json(image)));
    }

    Err(AppError::field(FILE_FIELD, "an image file is required"))
}

fn check_content_type(content_type: &str) -> Result<()> {
    if content_type.starts_with("image/") {
        Ok(())
    } else {
        Err(AppError::field(FILE_FIELD, "only image files can be uploaded"))
    }
}

fn check_size(len: usize) -> Result<()> {
    match len {
        0 => Err(AppError::field(FILE_FIELD, "the file is empty")),
        n if n > MAX_UPLOAD_BYTES => Err(AppError::field(
            FILE_FIELD,
            format!("the file is larger than {} MB", MAX_UPLOAD_BYTES / (1024 * 1024)),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_checks() {
        assert!(check_content_type("image/jpeg").is_ok());
        assert!(check_content_type("image/webp").is_ok());
        assert!(check_content_type("application/pdf").is_err());
        assert!(check_content_type("").is_err());

        assert!(check_size(1).is_ok());
        assert!(check_size(MAX_UPLOAD_BYTES).is_ok());
        assert!(check_size(0).is_err());
        assert!(check_size(MAX_UPLOAD_BYTES + 1).is_err());
    }
}
