//! Rate limiting middleware.
//!
//! Mailbox creation is limited per client IP. Viewing is not limited.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::{net::SocketAddr, num::NonZeroU32, sync::Arc, time::Duration};

use crate::web::error::ApiError;

/// Key used when no client address is known.
const UNKNOWN_CLIENT: &str = "unknown";

/// Interval between sweeps of idle limiter entries.
const CLEANUP_INTERVAL_SECS: u64 = 300;

/// State for rate limiting.
#[derive(Clone)]
pub struct RateLimitState {
    create_limiter: Arc<DefaultKeyedRateLimiter<String>>,
    create_rate_limit: u32,
    trust_proxy_headers: bool,
}

impl RateLimitState {
    /// Create a new rate limit state allowing `create_rate_limit` creations
    /// per minute per IP.
    ///
    /// Forwarding headers are only used to find the client IP when
    /// `trust_proxy_headers` is set.
    pub fn new(create_rate_limit: u32, trust_proxy_headers: bool) -> Self {
        let quota =
            Quota::per_minute(NonZeroU32::new(create_rate_limit).unwrap_or(NonZeroU32::MIN));
        Self {
            create_limiter: Arc::new(RateLimiter::keyed(quota)),
            create_rate_limit,
            trust_proxy_headers,
        }
    }

    /// Configured creations per minute.
    pub fn create_rate_limit(&self) -> u32 {
        self.create_rate_limit
    }

    /// Check if a creation request is allowed for the given client.
    pub fn check_create(&self, ip: &str) -> bool {
        self.create_limiter.check_key(&ip.to_string()).is_ok()
    }

    /// Drop entries for clients whose quota has fully replenished.
    pub fn cleanup(&self) {
        self.create_limiter.retain_recent();
        self.create_limiter.shrink_to_fit();
    }

    /// Start a background task to periodically clean up idle entries.
    pub fn start_cleanup_task(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(CLEANUP_INTERVAL_SECS));
            interval.tick().await;
            loop {
                interval.tick().await;
                self.cleanup();
                tracing::debug!(
                    tracked = self.create_limiter.len(),
                    "Rate limiter entries swept"
                );
            }
        });
    }
}

fn header_ip(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Client IP for rate limiting and verification.
///
/// Without `trust_proxy_headers` this is the peer address and forwarding
/// headers are ignored. With it, `CF-Connecting-IP` is preferred, then the
/// first `X-Forwarded-For` entry, then `X-Real-IP`, then the peer address.
pub fn client_ip(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_proxy_headers: bool,
) -> Option<String> {
    let forwarded = if trust_proxy_headers {
        header_ip(headers, "CF-Connecting-IP")
            .or_else(|| header_ip(headers, "X-Forwarded-For"))
            .or_else(|| header_ip(headers, "X-Real-IP"))
    } else {
        None
    };
    forwarded.or_else(|| peer.map(|addr| addr.ip().to_string()))
}

/// Rate limiting middleware for mailbox creation.
pub async fn create_rate_limit(
    state: Arc<RateLimitState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ip = client_ip(req.headers(), peer, state.trust_proxy_headers)
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());

    if !state.check_create(&ip) {
        tracing::warn!(ip = %ip, "Mailbox creation rate limit exceeded");
        return ApiError::too_many_requests("Too many mailboxes created. Please try again later.")
            .into_response();
    }

    next.run(req).await
}
