//! HTTP API layer for the AAC Optics site.
//!
//! - **Endpoints**: public content, contact form, i18n catalogs, admin back office
//! - **Extractors**: session, admin guard, request language
//! - **Middleware**: bearer authentication, rate limiting
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod rate_limit;
pub mod response;

use axum::{Router, middleware::from_fn_with_state};

pub use endpoints::router;
pub use middleware::AppState;
pub use rate_limit::{ApiRateLimiter, RateLimitConfig, RateLimiterState};

/// Largest request body accepted, sized to fit one attachment plus multipart framing.
pub const MAX_BODY_SIZE: usize = 12 * 1024 * 1024;

/// The API mounted under `/api`, with session resolution applied to every request.
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api", router(state.rate_limiter.clone()))
        .layer(from_fn_with_state(state.clone(), middleware::auth_middleware))
        .with_state(state)
}
