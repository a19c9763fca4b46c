//! Session middleware configuration for admin.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions with
//! strict cookie settings (SameSite=Strict, 24hr inactivity expiry).

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::AdminConfig;

/// Session cookie name for admin.
pub const SESSION_COOKIE_NAME: &str = "ruchna_admin_session";

/// Session expiry time in seconds (24 hours of inactivity).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// Create the session layer with `PostgreSQL` store.
///
/// The `admin.session` table is created by the admin migrations.
///
/// # Panics
///
/// Panics if the schema name or table name is invalid (never happens with
/// the hardcoded "admin" and "session" values).
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &AdminConfig,
) -> SessionManagerLayer<PostgresStore> {
    let store = PostgresStore::new(pool.clone())
        .with_schema_name("admin")
        .expect("valid schema name")
        .with_table_name("session")
        .expect("valid table name");

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_https())
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
}
