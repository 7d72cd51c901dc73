//! Site navigation endpoints.

use aac_common::AppResult;
use aac_core::{
    PageView, SitemapEntry,
    services::site::{page_view, resolve, sitemap},
};
use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{Lang, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

#[derive(Deserialize)]
pub struct ResolveQuery {
    pub path: String,
}

#[derive(Serialize)]
pub struct ResolvedPage {
    #[serde(flatten)]
    pub page: PageView,
    /// Whether the caller may open the page.
    pub accessible: bool,
}

async fn pages(State(state): State<AppState>, Lang(lang): Lang) -> ApiResponse<Vec<SitemapEntry>> {
    ApiResponse::ok(sitemap(&state.translator, lang))
}

async fn resolve_page(
    State(state): State<AppState>,
    Lang(lang): Lang,
    MaybeAuthUser(session): MaybeAuthUser,
    Query(query): Query<ResolveQuery>,
) -> AppResult<ApiResponse<ResolvedPage>> {
    let page = resolve(&query.path)?;
    let accessible = !page.restricted || session.is_some_and(|s| s.is_admin());

    Ok(ApiResponse::ok(ResolvedPage {
        page: page_view(page, &state.translator, lang),
        accessible,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pages", get(pages))
        .route("/resolve", get(resolve_page))
}
