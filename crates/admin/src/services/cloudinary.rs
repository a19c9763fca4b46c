//! Cloudinary signed image uploads.
//!
//! Uploads are signed server-side so the API secret never reaches the
//! browser. The signature is SHA-256 over the sorted, `&`-joined upload
//! parameters followed by the secret.

use std::collections::BTreeMap;

use reqwest::Client;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::instrument;

use crate::config::CloudinaryConfig;

/// Cloudinary upload API base URL.
const CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Errors that can occur when uploading to Cloudinary.
#[derive(Debug, Error)]
pub enum CloudinaryError {
    /// Uploads are disabled because credentials are missing.
    #[error("Cloudinary is not configured")]
    NotConfigured,

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Cloudinary rejected the upload.
    #[error("API error: {0}")]
    Api(String),
}

/// A stored image, as recorded on a variant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadedImage {
    pub public_id: String,
    #[serde(rename(deserialize = "secure_url"))]
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub format: Option<String>,
    pub bytes: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

/// Upload client for one Cloudinary account.
#[derive(Clone)]
pub struct CloudinaryClient {
    client: Client,
    cloud_name: String,
    api_key: String,
    api_secret: SecretString,
    folder: String,
}

impl std::fmt::Debug for CloudinaryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryClient")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("folder", &self.folder)
            .finish_non_exhaustive()
    }
}

impl CloudinaryClient {
    #[must_use]
    pub fn new(config: &CloudinaryConfig, client: Client) -> Self {
        Self {
            client,
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            folder: config.folder.clone(),
        }
    }

    /// Sign upload parameters.
    #[must_use]
    pub fn sign(&self, params: &BTreeMap<&str, String>) -> String {
        signature(params, self.api_secret.expose_secret())
    }

    /// Upload one image into the configured folder.
    ///
    /// # Errors
    ///
    /// Returns `CloudinaryError` if the request fails or Cloudinary refuses
    /// the file.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedImage, CloudinaryError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();

        let mut params = BTreeMap::new();
        params.insert("folder", self.folder.clone());
        params.insert("timestamp", timestamp);
        let signature = self.sign(&params);

        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;

        let mut form = Form::new()
            .part("file", part)
            .text("api_key", self.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(key, value);
        }

        let url = format!("{CLOUDINARY_API_BASE}/{}/image/upload", self.cloud_name);
        let response = self.client.post(&url).multipart(form).send().await?;

        let status = response.status();
        let body = response.text().await?;
        parse_upload(status.is_success(), &body)
    }
}

/// `sha256("k1=v1&k2=v2" + secret)` over non-empty params in key order.
#[must_use]
pub fn signature(params: &BTreeMap<&str, String>, api_secret: &str) -> String {
    let to_sign = params
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    hex::encode(Sha256::digest(format!("{to_sign}{api_secret}").as_bytes()))
}

fn parse_upload(success: bool, body: &str) -> Result<UploadedImage, CloudinaryError> {
    if success {
        return serde_json::from_str(body)
            .map_err(|e| CloudinaryError::Api(format!("unexpected response: {e}")));
    }

    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.chars().take(200).collect());
    Err(CloudinaryError::Api(message))
}
