use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderValue, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use uuid::Uuid;

use crate::config::RateLimitConfig;
use crate::server::AppState;

/// Attaches a request id to the request extensions and echoes it back in
/// the `x-request-id` response header.
pub async fn request_id(mut req: Request<Body>, next: Next) -> Response {
    let id = Uuid::new_v4().to_string();
    if let Ok(value) = HeaderValue::from_str(&id) {
        req.extensions_mut().insert(value.clone());
        let mut res = next.run(req).await;
        res.headers_mut().insert("x-request-id", value);
        res
    } else {
        next.run(req).await
    }
}

/// Adds baseline security headers to every response.
pub async fn security_headers(req: Request<Body>, next: Next) -> Response {
    let mut res = next.run(req).await;
    let headers = res.headers_mut();
    headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "referrer-policy",
        HeaderValue::from_static("no-referrer"),
    );
    res
}

/// Per-client request rate limiter.
///
/// Keys on the peer IP when the connection info is available, otherwise
/// on a single shared key.
pub struct ApiRateLimiter {
    limiter: DefaultKeyedRateLimiter<String>,
    enabled: bool,
}

impl ApiRateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        let per_second = NonZeroU32::new(config.per_second.max(1))
            .unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(config.burst.max(1)).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: RateLimiter::keyed(Quota::per_second(per_second).allow_burst(burst)),
            enabled: config.enabled,
        }
    }

    pub fn check(&self, key: &str) -> bool {
        if !self.enabled {
            return true;
        }
        self.limiter.check_key(&key.to_string()).is_ok()
    }
}

/// Rejects requests over the configured rate with 429.
pub async fn rate_limit(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let key = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "global".to_string());

    if !state.limiter.check(&key) {
        tracing::debug!(client = %key, "rate limit exceeded");
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }
    Ok(next.run(req).await)
}

/// Shared limiter handle stored in the application state.
pub type SharedRateLimiter = Arc<ApiRateLimiter>;
