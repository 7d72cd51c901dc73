//! Fixed-window rate limiting for public write endpoints.
//!
//! Counters live in process memory and are keyed by scope plus client
//! (session user when signed in, otherwise client IP).

#![allow(missing_docs)]

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use aac_common::AppError;
use aac_core::Session;
use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::RwLock;
use tracing::debug;

/// Rate limit for one endpoint category.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Name used to separate counters of different categories.
    pub scope: &'static str,
    /// Maximum requests per window.
    pub max_requests: u32,
    /// Window length in seconds.
    pub window_secs: u64,
}

impl RateLimitConfig {
    pub const fn new(scope: &'static str, max_requests: u32, window_secs: u64) -> Self {
        Self {
            scope,
            max_requests,
            window_secs,
        }
    }
}

/// Limits for each endpoint category.
pub mod limits {
    use super::RateLimitConfig;

    /// Every API request.
    pub const STANDARD: RateLimitConfig = RateLimitConfig::new("api", 300, 60);

    /// Contact form submissions.
    pub const CONTACT: RateLimitConfig = RateLimitConfig::new("contact", 5, 600);

    /// Sign-in attempts.
    pub const AUTH: RateLimitConfig = RateLimitConfig::new("auth", 10, 300);

    /// Account creation.
    pub const SIGNUP: RateLimitConfig = RateLimitConfig::new("signup", 5, 3600);

    /// Longest window of any category, used for cleanup.
    pub const MAX_WINDOW_SECS: u64 = 3600;
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started: Instant,
}

/// In-memory fixed-window counter store.
#[derive(Clone, Default)]
pub struct ApiRateLimiter {
    windows: Arc<RwLock<HashMap<String, Window>>>,
}

impl ApiRateLimiter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request for `key` and report whether it is allowed.
    pub async fn check(&self, key: &str, config: &RateLimitConfig) -> RateLimitResult {
        let window_len = Duration::from_secs(config.window_secs);
        let now = Instant::now();
        let mut windows = self.windows.write().await;

        let window = windows
            .entry(format!("{}:{key}", config.scope))
            .or_insert(Window {
                count: 0,
                started: now,
            });

        if now.duration_since(window.started) >= window_len {
            *window = Window {
                count: 0,
                started: now,
            };
        }

        let reset = window_len
            .saturating_sub(now.duration_since(window.started))
            .as_secs()
            .max(1);

        if window.count >= config.max_requests {
            return RateLimitResult::Limited { retry_after: reset };
        }

        window.count += 1;
        RateLimitResult::Allowed {
            remaining: config.max_requests - window.count,
            limit: config.max_requests,
            reset,
        }
    }

    /// Drop windows older than `max_window_secs`.
    pub async fn cleanup(&self, max_window_secs: u64) {
        let max_age = Duration::from_secs(max_window_secs);
        let now = Instant::now();
        self.windows
            .write()
            .await
            .retain(|_, window| now.duration_since(window.started) < max_age);
    }

    /// Number of live windows.
    pub async fn key_count(&self) -> usize {
        self.windows.read().await.len()
    }
}

/// Outcome of [`ApiRateLimiter::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitResult {
    Allowed {
        remaining: u32,
        limit: u32,
        /// Seconds until the window resets.
        reset: u64,
    },
    Limited {
        /// Seconds until a request will be accepted again.
        retry_after: u64,
    },
}

/// Limiter shared by the rate limit middlewares.
#[derive(Clone, Default)]
pub struct RateLimiterState {
    pub limiter: ApiRateLimiter,
    /// Key anonymous clients by `X-Forwarded-For`/`X-Real-IP` instead of the
    /// socket peer. Only safe behind a proxy that overwrites these headers.
    pub trust_proxy_headers: bool,
}

impl RateLimiterState {
    #[must_use]
    pub fn new(trust_proxy_headers: bool) -> Self {
        Self {
            limiter: ApiRateLimiter::new(),
            trust_proxy_headers,
        }
    }
}

/// `429 Too Many Requests` with a `Retry-After` header.
#[derive(Debug)]
pub struct RateLimitError {
    pub retry_after: u64,
}

impl IntoResponse for RateLimitError {
    fn into_response(self) -> Response {
        let mut response = AppError::RateLimited.into_response();
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, self.retry_after.into());
        response
    }
}

/// Client address: the socket peer, or the proxy headers when they are trusted.
fn client_ip(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_proxy_headers: bool,
) -> Option<IpAddr> {
    if !trust_proxy_headers {
        return peer.map(|addr| addr.ip());
    }

    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|first| first.trim().parse().ok());

    forwarded
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse().ok())
        })
        .or_else(|| peer.map(|addr| addr.ip()))
}

fn client_key(req: &Request<Body>, trust_proxy_headers: bool) -> String {
    if let Some(session) = req.extensions().get::<Session>() {
        return format!("user:{}", session.user.id);
    }
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    client_ip(req.headers(), peer, trust_proxy_headers)
        .map_or_else(|| "unknown".to_string(), |ip| format!("ip:{ip}"))
}

/// Global API limit.
pub async fn rate_limit_middleware(
    State(state): State<RateLimiterState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, RateLimitError> {
    rate_limit_with_config(&state, req, next, &limits::STANDARD).await
}

/// Contact form limit.
pub async fn rate_limit_contact_middleware(
    State(state): State<RateLimiterState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, RateLimitError> {
    rate_limit_with_config(&state, req, next, &limits::CONTACT).await
}

/// Sign-in limit.
pub async fn rate_limit_auth_middleware(
    State(state): State<RateLimiterState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, RateLimitError> {
    rate_limit_with_config(&state, req, next, &limits::AUTH).await
}

/// Sign-up limit.
pub async fn rate_limit_signup_middleware(
    State(state): State<RateLimiterState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, RateLimitError> {
    rate_limit_with_config(&state, req, next, &limits::SIGNUP).await
}

async fn rate_limit_with_config(
    state: &RateLimiterState,
    req: Request<Body>,
    next: Next,
    config: &RateLimitConfig,
) -> Result<Response, RateLimitError> {
    let key = client_key(&req, state.trust_proxy_headers);

    match state.limiter.check(&key, config).await {
        RateLimitResult::Allowed {
            remaining,
            limit,
            reset,
        } => {
            let mut response = next.run(req).await;
            let headers = response.headers_mut();
            headers.insert("X-RateLimit-Limit", limit.into());
            headers.insert("X-RateLimit-Remaining", remaining.into());
            headers.insert("X-RateLimit-Reset", reset.into());
            Ok(response)
        }
        RateLimitResult::Limited { retry_after } => {
            debug!(scope = config.scope, key = %key, retry_after, "Rate limited");
            Err(RateLimitError { retry_after })
        }
    }
}
