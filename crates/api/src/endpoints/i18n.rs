//! Translation catalog endpoints.

use std::collections::BTreeMap;

use aac_common::AppResult;
use aac_core::Language;
use axum::{
    Router,
    extract::{Path, State},
    routing::get,
};
use serde::Serialize;

use crate::{extractors::Lang, middleware::AppState, response::ApiResponse};

#[derive(Serialize)]
pub struct LanguageInfo {
    pub code: Language,
    pub name: &'static str,
    pub default: bool,
    /// Whether this is the language negotiated for the current request.
    pub current: bool,
}

#[derive(Serialize)]
pub struct CatalogResponse {
    pub language: Language,
    pub messages: BTreeMap<String, String>,
}

async fn languages(
    State(state): State<AppState>,
    Lang(current): Lang,
) -> ApiResponse<Vec<LanguageInfo>> {
    let list = Language::ALL
        .iter()
        .map(|&code| LanguageInfo {
            code,
            name: code.native_name(),
            default: code == state.site.default_language,
            current: code == current,
        })
        .collect();

    ApiResponse::ok(list)
}

async fn catalog(
    State(state): State<AppState>,
    Path(lang): Path<String>,
) -> AppResult<ApiResponse<CatalogResponse>> {
    let language: Language = lang.parse()?;
    let messages = state
        .translator
        .catalog(language)
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

    Ok(ApiResponse::ok(CatalogResponse { language, messages }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(languages))
        .route("/{lang}", get(catalog))
}
