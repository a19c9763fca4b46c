//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::config::AdminConfig;
use crate::services::cloudinary::{CloudinaryClient, CloudinaryError};

/// Uploads carry whole images, so they get more time than a JSON call.
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    cloudinary: Option<CloudinaryClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: AdminConfig, pool: PgPool) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!("ruchna-admin/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cloudinary = config
            .cloudinary
            .as_ref()
            .map(|c| CloudinaryClient::new(c, http));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                cloudinary,
            }),
        })
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a reference to the database pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// The Cloudinary client, if uploads are configured.
    ///
    /// # Errors
    ///
    /// Returns `CloudinaryError::NotConfigured` when credentials are absent.
    pub fn cloudinary(&self) -> Result<&CloudinaryClient, CloudinaryError> {
        self.inner
            .cloudinary
            .as_ref()
            .ok_or(CloudinaryError::NotConfigured)
    }
}
