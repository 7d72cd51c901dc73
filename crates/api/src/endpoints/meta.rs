//! Meta endpoints.

use aac_core::Language;
use axum::{Router, extract::State, routing::get};
use serde::Serialize;

use crate::{middleware::AppState, response::ApiResponse};

/// Site metadata response.
#[derive(Serialize)]
pub struct MetaResponse {
    pub name: String,
    pub version: &'static str,
    pub default_language: Language,
    pub languages: Vec<Language>,
}

async fn meta(State(state): State<AppState>) -> ApiResponse<MetaResponse> {
    ApiResponse::ok(MetaResponse {
        name: state.site.name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        default_language: state.site.default_language,
        languages: Language::ALL.to_vec(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(meta))
}
