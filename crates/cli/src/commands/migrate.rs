//! Database migration commands.
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string for storefront
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string for admin
//!
//! Both fall back to `DATABASE_URL`. The two services usually share one
//! database, so each migrator ignores versions applied by the other.
//!
//! # Migration Files
//!
//! Storefront migrations: `crates/storefront/migrations/`
//! Admin migrations: `crates/admin/migrations/`

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use thiserror::Error;

use super::database_url;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A migration failed or conflicts with the applied history.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run storefront database migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing or a migration fails.
pub async fn storefront() -> Result<(), MigrationError> {
    let mut migrator = sqlx::migrate!("../storefront/migrations");
    run("storefront", "STOREFRONT_DATABASE_URL", &mut migrator).await
}

/// Run admin database migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing or a migration fails.
pub async fn admin() -> Result<(), MigrationError> {
    let mut migrator = sqlx::migrate!("../admin/migrations");
    run("admin", "ADMIN_DATABASE_URL", &mut migrator).await
}

async fn run(
    name: &str,
    env_key: &'static str,
    migrator: &mut Migrator,
) -> Result<(), MigrationError> {
    let url = database_url(env_key).ok_or(MigrationError::MissingEnvVar(env_key))?;

    tracing::info!("Connecting to {name} database...");
    let pool = PgPool::connect(url.expose_secret()).await?;

    tracing::info!(
        migrations = migrator.iter().count(),
        "Running {name} migrations..."
    );
    migrator.set_ignore_missing(true);
    migrator.run(&pool).await?;

    tracing::info!("{name} migrations complete");
    Ok(())
}
