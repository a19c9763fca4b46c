//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `ADMIN_BASE_URL` - Public URL for the admin API
//! - `ADMIN_PASSWORD_HASH` - Argon2 PHC string for the shared admin password,
//!   or `ADMIN_PASSWORD` - the plain password (min 12 chars, high entropy)
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `ADMIN_CORS_ORIGINS` - Comma-separated origins of the admin front-end
//! - `CLOUDINARY_CLOUD_NAME`, `CLOUDINARY_API_KEY`, `CLOUDINARY_API_SECRET` - Image uploads
//! - `CLOUDINARY_FOLDER` - Upload folder (default: ruchna/products)
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT` - Error tracking
//! - `LOG_FORMAT` - `json` for structured logs
//!
//! Generate a hash with `ruchna admin hash-password`.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_PASSWORD_LENGTH: usize = 12;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;
const DEFAULT_CLOUDINARY_FOLDER: &str = "ruchna/products";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "admin",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the admin API (no trailing slash)
    pub base_url: String,
    /// Shared admin password
    pub password: AdminPassword,
    /// Origins allowed by CORS; empty means same-origin only
    pub cors_origins: Vec<String>,
    /// Cloudinary credentials, when image uploads are enabled
    pub cloudinary: Option<CloudinaryConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
    /// Emit JSON logs instead of the human-readable format
    pub log_json: bool,
}

/// How the shared admin password is configured.
#[derive(Clone)]
pub enum AdminPassword {
    /// Argon2 PHC string.
    Hash(SecretString),
    /// Plain password, compared in constant time.
    Plain(SecretString),
}

impl std::fmt::Debug for AdminPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hash(_) => f.write_str("Hash([REDACTED])"),
            Self::Plain(_) => f.write_str("Plain([REDACTED])"),
        }
    }
}

/// Cloudinary account used for product images.
#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: SecretString,
    pub folder: String,
}

impl std::fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("folder", &self.folder)
            .finish()
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the password fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("ADMIN_DATABASE_URL")?;
        let host = get_env_or_default("ADMIN_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("ADMIN_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("ADMIN_BASE_URL")?
            .trim()
            .trim_end_matches('/')
            .to_string();

        let password = AdminPassword::from_values(
            get_optional_env("ADMIN_PASSWORD_HASH"),
            get_optional_env("ADMIN_PASSWORD"),
        )?;

        let cloudinary = CloudinaryConfig::from_values(
            get_optional_env("CLOUDINARY_CLOUD_NAME"),
            get_optional_env("CLOUDINARY_API_KEY"),
            get_optional_env("CLOUDINARY_API_SECRET"),
            get_optional_env("CLOUDINARY_FOLDER"),
        )?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            password,
            cors_origins: parse_list(&get_env_or_default("ADMIN_CORS_ORIGINS", "")),
            cloudinary,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_optional_env("SENTRY_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
            sentry_traces_sample_rate: get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.1),
            log_json: get_env_or_default("LOG_FORMAT", "text").eq_ignore_ascii_case("json"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies must be marked `Secure`.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl AdminPassword {
    /// Prefer the hash; fall back to a validated plain password.
    fn from_values(hash: Option<String>, plain: Option<String>) -> Result<Self, ConfigError> {
        if let Some(hash) = hash {
            argon2::PasswordHash::new(hash.trim()).map_err(|e| {
                ConfigError::InvalidEnvVar("ADMIN_PASSWORD_HASH".to_string(), e.to_string())
            })?;
            return Ok(Self::Hash(SecretString::from(hash.trim().to_string())));
        }

        let plain = plain.ok_or_else(|| {
            ConfigError::MissingEnvVar("ADMIN_PASSWORD_HASH or ADMIN_PASSWORD".to_string())
        })?;
        validate_password(&SecretString::from(plain.clone()), "ADMIN_PASSWORD")?;
        Ok(Self::Plain(SecretString::from(plain)))
    }
}

impl CloudinaryConfig {
    /// All three credentials or none; the folder is optional.
    fn from_values(
        cloud_name: Option<String>,
        api_key: Option<String>,
        api_secret: Option<String>,
        folder: Option<String>,
    ) -> Result<Option<Self>, ConfigError> {
        match (cloud_name, api_key, api_secret) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Ok(Some(Self {
                cloud_name,
                api_key,
                api_secret: SecretString::from(api_secret),
                folder: folder
                    .map(|f| f.trim().trim_matches('/').to_string())
                    .filter(|f| !f.is_empty())
                    .unwrap_or_else(|| DEFAULT_CLOUDINARY_FOLDER.to_string()),
            })),
            (None, None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "CLOUDINARY_*".to_string(),
                "CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY and CLOUDINARY_API_SECRET must be set together"
                    .to_string(),
            )),
        }
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

/// Split a comma-separated list, dropping blanks.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_end_matches('/'))
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Validate that a plain password meets minimum length requirements and strength.
fn validate_password(password: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = password.expose_secret();
    let len = value.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("must be at least {MIN_PASSWORD_LENGTH} characters (got {len})"),
        ));
    }
    validate_secret_strength(value, var_name)
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated password."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use argon2::PasswordHasher;
    use argon2::password_hash::SaltString;

    use super::*;

    #[test]
    fn test_shannon_entropy() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy("aB3$xY9!mK2@nL5#") > 3.3);
    }

    #[test]
    fn test_validate_secret_strength() {
        assert!(matches!(
            validate_secret_strength("changeme123", "TEST_VAR"),
            Err(ConfigError::InsecureSecret(_, _))
        ));
        assert!(validate_secret_strength("Admin-Ruchna-2026", "TEST_VAR").is_err());
        assert!(validate_secret_strength("aaaaaaaaaaaaaaaa", "TEST_VAR").is_err());
        assert!(validate_secret_strength("kX9#mP2$vL7@nQ4!", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_plain_password_too_short() {
        let result = AdminPassword::from_values(None, Some("kX9#mP2$".to_string()));
        assert!(
            matches!(result, Err(ConfigError::InsecureSecret(_, ref msg)) if msg.contains("at least 12"))
        );
    }

    #[test]
    fn test_hash_preferred_over_plain() {
        let salt = SaltString::from_b64("c29tZXNhbHR2YWx1ZQ").unwrap();
        let hash = argon2::Argon2::default()
            .hash_password(b"kX9#mP2$vL7@nQ4!", &salt)
            .unwrap()
            .to_string();

        let password = AdminPassword::from_values(Some(hash), Some("short".to_string())).unwrap();
        assert!(matches!(password, AdminPassword::Hash(_)));

        let bad = AdminPassword::from_values(Some("not-a-phc-string".to_string()), None);
        assert!(matches!(bad, Err(ConfigError::InvalidEnvVar(ref key, _)) if key == "ADMIN_PASSWORD_HASH"));

        assert!(matches!(
            AdminPassword::from_values(None, None),
            Err(ConfigError::MissingEnvVar(_))
        ));
    }

    #[test]
    fn test_cloudinary_all_or_nothing() {
        assert!(
            CloudinaryConfig::from_values(None, None, None, None)
                .unwrap()
                .is_none()
        );

        let config = CloudinaryConfig::from_values(
            Some("ruchna".into()),
            Some("123456".into()),
            Some("s3cr3t-value".into()),
            Some("/shop/items/".into()),
        )
        .unwrap()
        .unwrap();
        assert_eq!(config.folder, "shop/items");

        let defaulted = CloudinaryConfig::from_values(
            Some("ruchna".into()),
            Some("123456".into()),
            Some("s3cr3t-value".into()),
            None,
        )
        .unwrap()
        .unwrap();
        assert_eq!(defaulted.folder, DEFAULT_CLOUDINARY_FOLDER);

        assert!(
            CloudinaryConfig::from_values(Some("ruchna".into()), None, None, None).is_err()
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let password = AdminPassword::Plain(SecretString::from("kX9#mP2$vL7@nQ4!"));
        assert!(!format!("{password:?}").contains("kX9"));

        let cloudinary = CloudinaryConfig {
            cloud_name: "ruchna".to_string(),
            api_key: "123456".to_string(),
            api_secret: SecretString::from("cloud-secret-value"),
            folder: DEFAULT_CLOUDINARY_FOLDER.to_string(),
        };
        let debug_output = format!("{cloudinary:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("cloud-secret-value"));
    }

    #[test]
    fn test_socket_addr() {
        let config = AdminConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3001,
            base_url: "https://admin.ruchna.ua".to_string(),
            password: AdminPassword::Plain(SecretString::from("kX9#mP2$vL7@nQ4!")),
            cors_origins: Vec::new(),
            cloudinary: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
            log_json: false,
        };

        assert_eq!(config.socket_addr().port(), 3001);
        assert!(config.is_https());
    }
}
