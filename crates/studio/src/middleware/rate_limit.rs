//! Rate limiting for the generation endpoints using governor and
//! `tower_governor`.
//!
//! Every generation request costs an upstream model call, so those routes get
//! a per-client limiter. Draft edits and page views are not limited.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Key extractor keyed on the client IP.
///
/// Checks `X-Forwarded-For`, then `X-Real-IP`, then the socket peer address.
/// Requests with none of these (in-process tests) share the loopback bucket.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let headers = req.headers();

        // First IP in the chain is the original client
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

        if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
            return Ok(addr.ip());
        }

        Ok(IpAddr::V4(Ipv4Addr::LOCALHOST))
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create rate limiter for generation endpoints: ~30 requests per minute per IP.
///
/// Configuration: 1 request every 2 seconds (replenish), burst of 20.
///
/// # Panics
///
/// This function will not panic. The configuration uses only valid positive
/// integers (`per_second(2)` and `burst_size(20)`), which are always accepted
/// by `GovernorConfigBuilder`.
#[must_use]
pub fn generation_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(2)
        .burst_size(20)
        .finish()
        .expect("rate limiter config with per_second(2) and burst_size(20) is valid");
    GovernorLayer::new(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    fn extract(request: &Request<()>) -> IpAddr {
        ClientIpKeyExtractor.extract(request).unwrap()
    }

    #[test]
    fn test_forwarded_for_first_hop() {
        let request = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(())
            .unwrap();
        assert_eq!(extract(&request).to_string(), "203.0.113.7");
    }

    #[test]
    fn test_real_ip() {
        let request = Request::builder()
            .header("x-real-ip", "198.51.100.2")
            .body(())
            .unwrap();
        assert_eq!(extract(&request).to_string(), "198.51.100.2");
    }

    #[test]
    fn test_connect_info() {
        let mut request = Request::builder().body(()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 9], 4000))));
        assert_eq!(extract(&request).to_string(), "192.0.2.9");
    }

    #[test]
    fn test_falls_back_to_loopback() {
        let request = Request::builder().body(()).unwrap();
        assert_eq!(extract(&request), IpAddr::V4(Ipv4Addr::LOCALHOST));
    }
}
