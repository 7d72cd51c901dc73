//! Back office endpoints.
//!
//! Every handler takes [`AdminUser`], so anonymous callers get `401` and
//! signed-in non-admins get `403` before any work is done.

use aac_common::{AppError, AppResult};
use aac_core::{AttachmentList, AttachmentView, CreateNewsInput, UpdateNewsInput, UploadFile};
use aac_db::entities::{contact_message, news};
use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Path, Query, State,
        multipart::{Multipart, MultipartError},
    },
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{delete, get},
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::{
    MAX_BODY_SIZE,
    extractors::AdminUser,
    middleware::AppState,
    response::{self, ApiResponse, PageMeta},
};

const DEFAULT_MESSAGE_LIMIT: u64 = 50;
const MAX_MESSAGE_LIMIT: u64 = 200;

#[derive(Debug, Deserialize)]
pub struct MessageListQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Serialize)]
pub struct DeletedNews {
    pub id: String,
    pub attachments_removed: usize,
}

// === News ===

async fn list_news(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<news::Model>>> {
    Ok(ApiResponse::ok(state.news_service.list_all().await?))
}

async fn create_news(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Json(input): Json<CreateNewsInput>,
) -> AppResult<ApiResponse<news::Model>> {
    input.validate()?;
    let item = state.news_service.create(input).await?;
    info!(news_id = %item.id, user_id = %admin.user.id, "News created");
    Ok(ApiResponse::created(item))
}

async fn show_news(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<news::Model>> {
    Ok(ApiResponse::ok(state.news_service.get(&id).await?))
}

async fn update_news(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateNewsInput>,
) -> AppResult<ApiResponse<news::Model>> {
    input.validate()?;
    let item = state.news_service.update(&id, input).await?;
    info!(news_id = %item.id, user_id = %admin.user.id, "News updated");
    Ok(ApiResponse::ok(item))
}

async fn delete_news(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<DeletedNews>> {
    let attachments_removed = state.news_service.delete(&id).await?;
    info!(news_id = %id, user_id = %admin.user.id, attachments_removed, "News deleted");
    Ok(ApiResponse::ok(DeletedNews {
        id,
        attachments_removed,
    }))
}

// === Attachments ===

async fn list_attachments(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(news_id): Path<String>,
) -> AppResult<ApiResponse<AttachmentList>> {
    state.news_service.get(&news_id).await?;
    Ok(ApiResponse::ok(state.attachment_service.list(&news_id).await?))
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::BadRequest(e.body_text())
    }
}

/// Upload one or more files sent as `file` fields.
///
/// All fields are read before anything is stored, so a rejected file leaves
/// no partial upload behind.
async fn upload_attachments(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(news_id): Path<String>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<Vec<AttachmentView>>> {
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("file").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data: Bytes = field.bytes().await.map_err(multipart_error)?;
        files.push(UploadFile {
            file_name,
            content_type,
            data,
        });
    }

    if files.is_empty() {
        return Err(AppError::BadRequest("No file field in upload".to_string()));
    }

    let uploaded = state.attachment_service.upload(&news_id, files).await?;

    info!(news_id = %news_id, user_id = %admin.user.id, count = uploaded.len(), "Attachments uploaded");
    Ok(ApiResponse::created(uploaded))
}

fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| if c.is_ascii_graphic() && c != '"' && c != '\\' { c } else { '_' })
        .collect();
    format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        urlencoding::encode(file_name)
    )
}

async fn download_attachment(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let (attachment, data) = state.attachment_service.download(&id).await?;

    Ok((
        [
            (header::CONTENT_TYPE, attachment.file_type.clone()),
            (header::CONTENT_DISPOSITION, content_disposition(&attachment.file_name)),
        ],
        data,
    ))
}

async fn delete_attachment(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.attachment_service.delete(&id).await?;
    info!(attachment_id = %id, user_id = %admin.user.id, "Attachment deleted");
    Ok(response::ok())
}

// === Contact messages ===

async fn list_messages(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<MessageListQuery>,
) -> AppResult<ApiResponse<Vec<contact_message::Model>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_MESSAGE_LIMIT)
        .clamp(1, MAX_MESSAGE_LIMIT);
    let offset = query.offset.unwrap_or(0);

    let messages = state.contact_service.list(limit, offset).await?;
    let total = state.contact_service.count().await?;

    Ok(ApiResponse::ok(messages).with_meta(PageMeta {
        total,
        limit,
        offset,
    }))
}

async fn show_message(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<contact_message::Model>> {
    Ok(ApiResponse::ok(state.contact_service.get(&id).await?))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/news", get(list_news).post(create_news))
        .route(
            "/news/{id}",
            get(show_news).put(update_news).delete(delete_news),
        )
        .route(
            "/news/{id}/attachments",
            get(list_attachments)
                .post(upload_attachments)
                .layer(DefaultBodyLimit::max(MAX_BODY_SIZE)),
        )
        .route("/attachments/{id}/download", get(download_attachment))
        .route("/attachments/{id}", delete(delete_attachment))
        .route("/contact-messages", get(list_messages))
        .route("/contact-messages/{id}", get(show_message))
}
