//! Rate limiting for the login endpoint.

use std::sync::Arc;

use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};

/// Rate limiter layer type for Axum.
///
/// `SmartIpKeyExtractor` reads `X-Forwarded-For`, `X-Real-IP` and `Forwarded`
/// before falling back to the peer address.
pub type RateLimiterLayer =
    GovernorLayer<SmartIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Login attempts: one token every 6 seconds, burst of 5 (~10/minute per IP).
///
/// # Panics
///
/// This function will not panic. `per_second(6)` and `burst_size(5)` are
/// always accepted by `GovernorConfigBuilder`.
#[must_use]
pub fn login_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(SmartIpKeyExtractor)
        .per_second(6)
        .burst_size(5)
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config))
}
