//! HTTP middleware for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors)
//! 2. CORS, when origins are configured
//! 3. `TraceLayer` (request span with status and latency)
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//! 5. Login rate limit, on `POST /api/admin/login` only
//! 6. `RequireAdminAuth` extractor on every protected handler

pub mod auth;
pub mod rate_limit;
pub mod session;

pub use auth::{
    AdminAuthRejection, RequireAdminAuth, clear_current_admin, is_logged_in, set_current_admin,
};
pub use rate_limit::login_rate_limiter;
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
