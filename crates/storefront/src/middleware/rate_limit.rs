//! Rate limiting middleware using governor and `tower_governor`.
//!
//! Two limiters, keyed by client IP:
//! - `auth_rate_limiter`: sign-in and registration posts (~10/min)
//! - `cart_rate_limiter`: cart mutations (~60/min with bursts)

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Proxy headers carrying the client IP, most trusted first.
const CLIENT_IP_HEADERS: &[&str] = &["cf-connecting-ip", "x-real-ip", "fly-client-ip"];

/// Key extractor reading the client IP from proxy headers.
///
/// Single-IP headers are tried first, then the first hop of
/// `X-Forwarded-For`, then the socket peer address when the server was
/// started with connect info.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let headers = req.headers();
        let parse = |value: &str| value.trim().parse::<IpAddr>().ok();

        CLIENT_IP_HEADERS
            .iter()
            .filter_map(|name| headers.get(*name))
            .filter_map(|value| value.to_str().ok())
            .find_map(parse)
            .or_else(|| {
                headers
                    .get("x-forwarded-for")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.split(',').next())
                    .and_then(parse)
            })
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

fn limiter(replenish_secs: u64, burst: u32) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(replenish_secs)
        .burst_size(burst)
        .finish()
        .expect("rate limiter config with non-zero period and burst is valid");
    GovernorLayer::new(Arc::new(config))
}

/// Create rate limiter for auth endpoints: ~10 requests per minute per IP.
///
/// 1 request every 6 seconds, burst of 5.
///
/// # Panics
///
/// Does not panic: the period and burst are non-zero constants.
#[must_use]
pub fn auth_rate_limiter() -> RateLimiterLayer {
    limiter(6, 5)
}

/// Create rate limiter for cart mutations: ~60 requests per minute per IP.
///
/// 1 request per second, burst of 20 for quick quantity changes.
///
/// # Panics
///
/// Does not panic: the period and burst are non-zero constants.
#[must_use]
pub fn cart_rate_limiter() -> RateLimiterLayer {
    limiter(1, 20)
}
