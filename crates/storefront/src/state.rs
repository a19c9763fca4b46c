//! Application state shared across handlers.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use ruchna_core::PaymentProvider;

use crate::config::StorefrontConfig;
use crate::services::catalog::CatalogCache;
use crate::services::nova_poshta::NovaPoshtaClient;
use crate::services::payments::{Fondy, LiqPay, PaymentError, WayForPay};
use crate::services::telegram::{TelegramClient, TelegramError};

/// Timeout for every outbound HTTP call.
const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    catalog: CatalogCache,
    nova_poshta: NovaPoshtaClient,
    liqpay: Option<LiqPay>,
    wayforpay: Option<WayForPay>,
    fondy: Option<Fondy>,
    telegram: Option<TelegramClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!("ruchna-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let catalog = CatalogCache::new(pool.clone());
        let nova_poshta = NovaPoshtaClient::new(config.nova_poshta_api_key.clone(), http.clone());
        let liqpay = config.liqpay.as_ref().map(LiqPay::new);
        let wayforpay = config.wayforpay.as_ref().map(WayForPay::new);
        let fondy = config.fondy.as_ref().map(|c| Fondy::new(c, http.clone()));
        let telegram = config
            .telegram
            .as_ref()
            .map(|c| TelegramClient::new(c, http.clone()));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalog,
                nova_poshta,
                liqpay,
                wayforpay,
                fondy,
                telegram,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the cached catalog.
    #[must_use]
    pub fn catalog(&self) -> &CatalogCache {
        &self.inner.catalog
    }

    /// Get a reference to the Nova Poshta client.
    #[must_use]
    pub fn nova_poshta(&self) -> &NovaPoshtaClient {
        &self.inner.nova_poshta
    }

    /// LiqPay client, if configured.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::NotConfigured` if LiqPay keys are absent.
    pub fn liqpay(&self) -> Result<&LiqPay, PaymentError> {
        self.inner
            .liqpay
            .as_ref()
            .ok_or(PaymentError::NotConfigured(PaymentProvider::LiqPay))
    }

    /// WayForPay client, if configured.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::NotConfigured` if WayForPay credentials are absent.
    pub fn wayforpay(&self) -> Result<&WayForPay, PaymentError> {
        self.inner
            .wayforpay
            .as_ref()
            .ok_or(PaymentError::NotConfigured(PaymentProvider::WayForPay))
    }

    /// Fondy client, if configured.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::NotConfigured` if Fondy credentials are absent.
    pub fn fondy(&self) -> Result<&Fondy, PaymentError> {
        self.inner
            .fondy
            .as_ref()
            .ok_or(PaymentError::NotConfigured(PaymentProvider::Fondy))
    }

    /// Send a staff notification in the background.
    ///
    /// Failures are logged and never reach the caller.
    pub fn notify<F, Fut>(&self, build: F)
    where
        F: FnOnce(TelegramClient) -> Fut,
        Fut: Future<Output = Result<(), TelegramError>> + Send + 'static,
    {
        let Some(telegram) = self.inner.telegram.clone() else {
            return;
        };

        let task = build(telegram);
        tokio::spawn(async move {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Telegram notification failed");
            }
        });
    }
}
