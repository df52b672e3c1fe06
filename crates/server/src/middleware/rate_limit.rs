//! Rate limiting middleware using governor and `tower_governor`.
//!
//! Only the login endpoint is limited, per client IP, to slow down password
//! guessing.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

use crate::error::AppError;

// =============================================================================
// Client IP Key Extractor
// =============================================================================

/// Key extractor that prefers proxy headers and falls back to the peer address.
///
/// The peer address is only available when the server is started with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let headers = req.headers();

        // X-Forwarded-For (first IP in the chain)
        if let Some(ip) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
        {
            return Ok(ip);
        }

        if let Some(ip) = headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
        {
            return Ok(ip);
        }

        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

// =============================================================================
// Rate Limiter Configuration
// =============================================================================

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create rate limiter for the login endpoint: ~10 requests per minute per IP.
///
/// Configuration: 1 request every 6 seconds (replenish), burst of 5.
///
/// # Panics
///
/// This function will not panic. The configuration uses only valid positive
/// integers (`per_second(6)` and `burst_size(5)`), which are always accepted
/// by `GovernorConfigBuilder`.
#[must_use]
pub fn login_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(6) // Replenish 1 token every 6 seconds (~10/minute)
        .burst_size(5)
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config))
}

/// Rewrite the limiter's plain-text 429 into the JSON error body.
///
/// Used with `axum::middleware::map_response` outside the limiter layer.
pub async fn json_rate_limit_response(response: Response) -> Response {
    if response.status() == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response.headers().get("retry-after").cloned();
        let mut rewritten = AppError::RateLimited.into_response();
        if let Some(value) = retry_after {
            rewritten.headers_mut().insert("retry-after", value);
        }
        return rewritten;
    }
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    #[test]
    fn test_forwarded_for_takes_precedence() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .header("x-real-ip", "198.51.100.2")
            .body(())
            .unwrap();
        let ip = ClientIpKeyExtractor.extract(&req).unwrap();
        assert_eq!(ip.to_string(), "203.0.113.7");
    }

    #[test]
    fn test_falls_back_to_peer_address() {
        let mut req = Request::builder().body(()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 40000))));
        let ip = ClientIpKeyExtractor.extract(&req).unwrap();
        assert_eq!(ip.to_string(), "192.0.2.1");
    }

    #[test]
    fn test_no_key_without_headers_or_peer() {
        let req = Request::builder().body(()).unwrap();
        assert!(ClientIpKeyExtractor.extract(&req).is_err());
    }
}
