//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. CORS (only when origins are configured)
//! 3. `TraceLayer` (request tracing)
//! 4. Request ID (add unique ID to each request)
//! 5. Security headers
//! 6. Rate limiting (governor, per route group)

pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use rate_limit::{api_rate_limiter, checkout_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
