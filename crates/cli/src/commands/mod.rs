pub mod admin;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;

/// Read a database URL, falling back to the shared `DATABASE_URL`.
pub fn database_url(primary_key: &'static str) -> Option<SecretString> {
    dotenvy::dotenv().ok();
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}
