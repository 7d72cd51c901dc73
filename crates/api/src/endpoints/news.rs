//! Public news endpoints.

use aac_common::AppResult;
use aac_core::{AttachmentList, LocalizedNews, localize, services::news::DEFAULT_SUMMARY_LEN};
use axum::{
    Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::Lang,
    middleware::AppState,
    response::{ApiResponse, PageMeta},
};

const DEFAULT_LIMIT: u64 = 20;
const MAX_LIMIT: u64 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl ListQuery {
    fn limit(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    fn offset(&self) -> u64 {
        self.offset.unwrap_or(0)
    }
}

#[derive(Serialize)]
pub struct NewsDetail {
    #[serde(flatten)]
    pub news: LocalizedNews,
    pub attachments: AttachmentList,
}

async fn list(
    State(state): State<AppState>,
    Lang(lang): Lang,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<LocalizedNews>>> {
    let (limit, offset) = (query.limit(), query.offset());
    let items = state.news_service.list_published(limit, offset).await?;
    let total = state.news_service.count_published().await?;

    let localized = items
        .iter()
        .map(|item| localize(item, lang, DEFAULT_SUMMARY_LEN))
        .collect();

    Ok(ApiResponse::ok(localized).with_meta(PageMeta {
        total,
        limit,
        offset,
    }))
}

async fn show(
    State(state): State<AppState>,
    Lang(lang): Lang,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<NewsDetail>> {
    let item = state.news_service.get_published(&id).await?;
    let attachments = state.attachment_service.list(&item.id).await?;

    Ok(ApiResponse::ok(NewsDetail {
        news: localize(&item, lang, DEFAULT_SUMMARY_LEN),
        attachments,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/{id}", get(show))
}
