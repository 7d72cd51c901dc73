//! Contact form endpoint.

use aac_common::AppResult;
use aac_core::SubmitContactInput;
use axum::{
    Json, Router,
    extract::State,
    middleware::from_fn_with_state,
    routing::post,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    middleware::AppState,
    rate_limit::{RateLimiterState, rate_limit_contact_middleware},
    response::ApiResponse,
};

/// Acknowledgement returned to the visitor.
#[derive(Serialize)]
pub struct ContactReceipt {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

async fn submit(
    State(state): State<AppState>,
    Json(input): Json<SubmitContactInput>,
) -> AppResult<ApiResponse<ContactReceipt>> {
    let message = state.contact_service.submit(input).await?;
    Ok(ApiResponse::created(ContactReceipt {
        id: message.id,
        created_at: message.created_at,
    }))
}

pub fn router(limiter: &RateLimiterState) -> Router<AppState> {
    Router::new().route(
        "/",
        post(submit).route_layer(from_fn_with_state(
            limiter.clone(),
            rate_limit_contact_middleware,
        )),
    )
}
