//! API endpoints.

mod admin;
mod auth;
mod contact;
mod i18n;
mod meta;
mod news;
mod site;

use axum::{Router, middleware::from_fn_with_state};

use crate::middleware::AppState;
use crate::rate_limit::{RateLimiterState, rate_limit_middleware};

/// Create the API router.
///
/// `limiter` backs the stricter per-endpoint limits on the contact form and
/// the auth endpoints, as well as the global limit.
pub fn router(limiter: RateLimiterState) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router(&limiter))
        .nest("/news", news::router())
        .nest("/contact", contact::router(&limiter))
        .nest("/i18n", i18n::router())
        .nest("/site", site::router())
        .nest("/meta", meta::router())
        .nest("/admin", admin::router())
        .layer(from_fn_with_state(limiter, rate_limit_middleware))
}
