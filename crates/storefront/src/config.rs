//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL of this API; payment callbacks are built from it
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_SITE_URL` - Browser-facing site, target of payment returns (default: base URL)
//! - `STOREFRONT_CORS_ORIGINS` - Comma-separated origins allowed to call the API
//! - `LIQPAY_PUBLIC_KEY`, `LIQPAY_PRIVATE_KEY` - LiqPay merchant keys
//! - `WAYFORPAY_MERCHANT_ACCOUNT`, `WAYFORPAY_SECRET_KEY`, `WAYFORPAY_MERCHANT_DOMAIN`
//! - `FONDY_MERCHANT_ID`, `FONDY_PAYMENT_KEY` - Fondy merchant credentials
//! - `NOVA_POSHTA_API_KEY` - Nova Poshta API key
//! - `TELEGRAM_BOT_TOKEN`, `TELEGRAM_CHAT_ID` - Order notifications
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT` - Error tracking
//! - `LOG_FORMAT` - `json` for structured logs
//!
//! Payment providers are independent: a provider whose variables are absent
//! is simply not offered at checkout.

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the API (no trailing slash)
    pub base_url: String,
    /// Public URL of the browser site (no trailing slash)
    pub site_url: String,
    /// Origins allowed by CORS; empty means same-origin only
    pub cors_origins: Vec<String>,
    pub liqpay: Option<LiqPayConfig>,
    pub wayforpay: Option<WayForPayConfig>,
    pub fondy: Option<FondyConfig>,
    pub nova_poshta_api_key: Option<SecretString>,
    pub telegram: Option<TelegramConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
    /// Emit JSON logs instead of the human-readable format
    pub log_json: bool,
}

/// LiqPay merchant keys.
#[derive(Clone)]
pub struct LiqPayConfig {
    pub public_key: String,
    pub private_key: SecretString,
}

impl std::fmt::Debug for LiqPayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiqPayConfig")
            .field("public_key", &self.public_key)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

/// WayForPay merchant credentials.
#[derive(Clone)]
pub struct WayForPayConfig {
    pub merchant_account: String,
    pub secret_key: SecretString,
    /// Domain registered with WayForPay for this merchant
    pub merchant_domain: String,
}

impl std::fmt::Debug for WayForPayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WayForPayConfig")
            .field("merchant_account", &self.merchant_account)
            .field("secret_key", &"[REDACTED]")
            .field("merchant_domain", &self.merchant_domain)
            .finish()
    }
}

/// Fondy merchant credentials.
#[derive(Clone)]
pub struct FondyConfig {
    pub merchant_id: String,
    pub payment_key: SecretString,
}

impl std::fmt::Debug for FondyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FondyConfig")
            .field("merchant_id", &self.merchant_id)
            .field("payment_key", &"[REDACTED]")
            .finish()
    }
}

/// Telegram bot used for shop notifications.
#[derive(Clone)]
pub struct TelegramConfig {
    pub bot_token: SecretString,
    pub chat_id: String,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"[REDACTED]")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid,
    /// or if only part of a provider's credentials is set.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = get_url("STOREFRONT_BASE_URL")?;
        let site_url = match get_optional_env("STOREFRONT_SITE_URL") {
            Some(_) => get_url("STOREFRONT_SITE_URL")?,
            None => base_url.clone(),
        };
        let cors_origins = parse_list(&get_env_or_default("STOREFRONT_CORS_ORIGINS", ""));

        let liqpay = get_group(&["LIQPAY_PUBLIC_KEY", "LIQPAY_PRIVATE_KEY"])?.map(|v| {
            let [public_key, private_key] = v;
            LiqPayConfig {
                public_key,
                private_key: SecretString::from(private_key),
            }
        });

        let wayforpay = get_group(&[
            "WAYFORPAY_MERCHANT_ACCOUNT",
            "WAYFORPAY_SECRET_KEY",
            "WAYFORPAY_MERCHANT_DOMAIN",
        ])?
        .map(|v| {
            let [merchant_account, secret_key, merchant_domain] = v;
            WayForPayConfig {
                merchant_account,
                secret_key: SecretString::from(secret_key),
                merchant_domain,
            }
        });

        let fondy = get_group(&["FONDY_MERCHANT_ID", "FONDY_PAYMENT_KEY"])?.map(|v| {
            let [merchant_id, payment_key] = v;
            FondyConfig {
                merchant_id,
                payment_key: SecretString::from(payment_key),
            }
        });

        let telegram = get_group(&["TELEGRAM_BOT_TOKEN", "TELEGRAM_CHAT_ID"])?.map(|v| {
            let [bot_token, chat_id] = v;
            TelegramConfig {
                bot_token: SecretString::from(bot_token),
                chat_id,
            }
        });

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            site_url,
            cors_origins,
            liqpay,
            wayforpay,
            fondy,
            nova_poshta_api_key: get_optional_env("NOVA_POSHTA_API_KEY").map(SecretString::from),
            telegram,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_rate("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: get_rate("SENTRY_TRACES_SAMPLE_RATE", 0.1)?,
            log_json: get_env_or_default("LOG_FORMAT", "text").eq_ignore_ascii_case("json"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable; blank values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a required absolute URL, normalized without a trailing slash.
fn get_url(key: &str) -> Result<String, ConfigError> {
    let raw = get_required_env(key)?;
    normalize_url(&raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e))
}

fn normalize_url(raw: &str) -> Result<String, String> {
    let parsed = url::Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err("must be an http(s) URL".to_string());
    }
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

/// Load a group of variables that must be set together.
///
/// Returns `None` when none of them is set.
fn get_group<const N: usize>(keys: &[&str; N]) -> Result<Option<[String; N]>, ConfigError> {
    let values = keys.map(get_optional_env);
    resolve_group(keys, values)
}

fn resolve_group<const N: usize>(
    keys: &[&str; N],
    values: [Option<String>; N],
) -> Result<Option<[String; N]>, ConfigError> {
    if values.iter().all(Option::is_none) {
        return Ok(None);
    }

    if let Some(missing) = keys
        .iter()
        .zip(values.iter())
        .find_map(|(key, value)| value.is_none().then_some(*key))
    {
        return Err(ConfigError::MissingEnvVar(format!(
            "{missing} (required together with {})",
            keys.join(", ")
        )));
    }

    Ok(Some(values.map(Option::unwrap_or_default)))
}

fn get_rate(key: &str, default: f32) -> Result<f32, ConfigError> {
    let Some(raw) = get_optional_env(key) else {
        return Ok(default);
    };
    match raw.parse::<f32>() {
        Ok(rate) if (0.0..=1.0).contains(&rate) => Ok(rate),
        _ => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be a number between 0 and 1".to_string(),
        )),
    }
}

/// Split a comma-separated list, dropping blanks.
pub(crate) fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_end_matches('/'))
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url_strips_trailing_slash() {
        assert_eq!(
            normalize_url("https://api.ruchna.ua/").unwrap(),
            "https://api.ruchna.ua"
        );
        assert_eq!(
            normalize_url(" http://localhost:3000 ").unwrap(),
            "http://localhost:3000"
        );
        assert!(normalize_url("ftp://ruchna.ua").is_err());
        assert!(normalize_url("not a url").is_err());
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            parse_list("https://ruchna.ua/, https://www.ruchna.ua ,,"),
            ["https://ruchna.ua", "https://www.ruchna.ua"]
        );
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn test_group_all_or_nothing() {
        let keys = ["A_KEY", "B_KEY"];

        assert!(resolve_group(&keys, [None, None]).unwrap().is_none());

        let both = resolve_group(&keys, [Some("a".into()), Some("b".into())]).unwrap();
        assert_eq!(both, Some(["a".to_string(), "b".to_string()]));

        let partial = resolve_group(&keys, [Some("a".into()), None]);
        assert!(matches!(partial, Err(ConfigError::MissingEnvVar(ref msg)) if msg.starts_with("B_KEY")));
    }

    #[test]
    fn test_provider_debug_redacts_secrets() {
        let liqpay = LiqPayConfig {
            public_key: "sandbox_i000".to_string(),
            private_key: SecretString::from("sandbox_super_private"),
        };
        let debug_output = format!("{liqpay:?}");
        assert!(debug_output.contains("sandbox_i000"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("sandbox_super_private"));

        let telegram = TelegramConfig {
            bot_token: SecretString::from("123:bot-token-value"),
            chat_id: "-100200".to_string(),
        };
        assert!(!format!("{telegram:?}").contains("bot-token-value"));
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            site_url: "http://localhost:5173".to_string(),
            cors_origins: Vec::new(),
            liqpay: None,
            wayforpay: None,
            fondy: None,
            nova_poshta_api_key: None,
            telegram: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
            log_json: false,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }
}
