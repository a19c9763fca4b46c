//! Rate limiting middleware using governor and `tower_governor`.
//!
//! Provides configurable rate limiters for different endpoint categories:
//! - `checkout_rate_limiter`: Strict limits for order, preorder and payment
//!   session creation (~20/min)
//! - `api_rate_limiter`: Relaxed limits for general API endpoints (~100/min)

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

// =============================================================================
// Client IP Key Extractor
// =============================================================================

/// Key extractor that checks Cloudflare's `CF-Connecting-IP` header first,
/// then standard proxy headers, then the socket peer address.
#[derive(Clone, Copy)]
pub struct CloudflareIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for CloudflareIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let headers = req.headers();

        // Try CF-Connecting-IP first (Cloudflare's real client IP)
        if let Some(ip) = headers
            .get("cf-connecting-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<IpAddr>().ok())
        {
            return Ok(ip);
        }

        // Try X-Forwarded-For (first IP in the chain)
        if let Some(ip) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
        {
            return Ok(ip);
        }

        // Try X-Real-IP
        if let Some(ip) = headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
        {
            return Ok(ip);
        }

        // Direct connection without a proxy
        if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
            return Ok(addr.ip());
        }

        Err(GovernorError::UnableToExtractKey)
    }
}

// =============================================================================
// Rate Limiter Configuration
// =============================================================================

/// Rate limiter layer type for Axum.
///
/// Uses `CloudflareIpKeyExtractor` to get the real client IP behind
/// Cloudflare or a reverse proxy.
pub type RateLimiterLayer =
    GovernorLayer<CloudflareIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create rate limiter for checkout endpoints: ~20 requests per minute per IP.
///
/// Configuration: 1 request every 3 seconds (replenish), burst of 10.
/// Order and lead creation write rows and notify staff, so they are kept
/// well below what a real customer needs.
///
/// # Panics
///
/// This function will not panic. The configuration uses only valid positive
/// integers (`per_second(3)` and `burst_size(10)`), which are always accepted
/// by `GovernorConfigBuilder`.
#[must_use]
pub fn checkout_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(CloudflareIpKeyExtractor)
        .per_second(3) // Replenish 1 token every 3 seconds (~20/minute)
        .burst_size(10)
        .finish()
        .expect("rate limiter config with per_second(3) and burst_size(10) is valid");
    GovernorLayer::new(Arc::new(config))
}

/// Create rate limiter for general API: ~100 requests per minute per IP.
///
/// Configuration: 1 request per second (replenish), burst of 50.
/// This prevents abuse of catalog and address lookup endpoints.
///
/// # Panics
///
/// This function will not panic. The configuration uses only valid positive
/// integers (`per_second(1)` and `burst_size(50)`), which are always accepted
/// by `GovernorConfigBuilder`.
#[must_use]
pub fn api_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(CloudflareIpKeyExtractor)
        .per_second(1) // Replenish quickly
        .burst_size(50) // Allow burst of 50 requests
        .finish()
        .expect("rate limiter config with per_second(1) and burst_size(50) is valid");
    GovernorLayer::new(Arc::new(config))
}
