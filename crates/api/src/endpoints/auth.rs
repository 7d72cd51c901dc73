//! Account and session endpoints.

use aac_common::AppResult;
use aac_core::{Credentials, Session, SignedIn};
use aac_db::entities::user;
use axum::{
    Json, Router,
    extract::State,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Serialize;

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    rate_limit::{RateLimiterState, rate_limit_auth_middleware, rate_limit_signup_middleware},
    response::{self, ApiResponse},
};

#[derive(Serialize)]
pub struct SessionResponse {
    pub session: Option<Session>,
}

async fn signup(
    State(state): State<AppState>,
    Json(input): Json<Credentials>,
) -> AppResult<ApiResponse<user::Model>> {
    let user = state.auth_service.sign_up(input).await?;
    Ok(ApiResponse::created(user))
}

async fn signin(
    State(state): State<AppState>,
    Json(input): Json<Credentials>,
) -> AppResult<ApiResponse<SignedIn>> {
    let signed_in = state
        .auth_service
        .sign_in(&input.email, &input.password)
        .await?;
    Ok(ApiResponse::ok(signed_in))
}

async fn signout(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
) -> AppResult<impl IntoResponse> {
    state.auth_service.sign_out(&session.user.id).await?;
    Ok(response::ok())
}

async fn session(MaybeAuthUser(session): MaybeAuthUser) -> ApiResponse<SessionResponse> {
    ApiResponse::ok(SessionResponse { session })
}

pub fn router(limiter: &RateLimiterState) -> Router<AppState> {
    Router::new()
        .route(
            "/signup",
            post(signup).route_layer(from_fn_with_state(
                limiter.clone(),
                rate_limit_signup_middleware,
            )),
        )
        .route(
            "/signin",
            post(signin).route_layer(from_fn_with_state(
                limiter.clone(),
                rate_limit_auth_middleware,
            )),
        )
        .route("/signout", post(signout))
        .route("/session", get(session))
}
