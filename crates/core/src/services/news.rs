//! News service.

use std::sync::Arc;

use aac_common::{AppError, AppResult, IdGenerator, StorageBackend};
use aac_db::{entities::news, repositories::NewsRepository};
use chrono::{DateTime, Utc};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use super::i18n::Language;

/// Default summary length for list views, in characters.
pub const DEFAULT_SUMMARY_LEN: usize = 150;

/// Input for creating a news item.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateNewsInput {
    #[validate(length(max = 512))]
    pub title: String,

    #[validate(length(max = 512))]
    pub title_en: Option<String>,

    pub content: String,

    pub content_en: Option<String>,

    pub summary: Option<String>,

    pub summary_en: Option<String>,

    #[validate(length(max = 1024))]
    pub image_url: Option<String>,

    pub published: Option<bool>,
}

/// Input for updating a news item.
///
/// Absent fields are left untouched; an empty string clears an optional field.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateNewsInput {
    #[validate(length(max = 512))]
    pub title: Option<String>,

    #[validate(length(max = 512))]
    pub title_en: Option<String>,

    pub content: Option<String>,

    pub content_en: Option<String>,

    pub summary: Option<String>,

    pub summary_en: Option<String>,

    #[validate(length(max = 1024))]
    pub image_url: Option<String>,

    pub published: Option<bool>,
}

/// A news item rendered for one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalizedNews {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Service for managing news posts.
#[derive(Clone)]
pub struct NewsService {
    news_repo: NewsRepository,
    storage: Arc<dyn StorageBackend>,
    id_gen: IdGenerator,
}

impl NewsService {
    /// Create a new news service.
    #[must_use]
    pub fn new(news_repo: NewsRepository, storage: Arc<dyn StorageBackend>) -> Self {
        Self {
            news_repo,
            storage,
            id_gen: IdGenerator::new(),
        }
    }

    /// List every news item, newest first (for admin).
    pub async fn list_all(&self) -> AppResult<Vec<news::Model>> {
        self.news_repo.find_all().await
    }

    /// List published news items, newest first.
    pub async fn list_published(&self, limit: u64, offset: u64) -> AppResult<Vec<news::Model>> {
        self.news_repo.find_published(limit, offset).await
    }

    /// Count published news items.
    pub async fn count_published(&self) -> AppResult<u64> {
        self.news_repo.count_published().await
    }

    /// Get a news item by ID (for admin).
    pub async fn get(&self, id: &str) -> AppResult<news::Model> {
        self.news_repo.get_by_id(id).await
    }

    /// Get a published news item. Drafts are reported as missing.
    pub async fn get_published(&self, id: &str) -> AppResult<news::Model> {
        match self.news_repo.find_by_id(id).await? {
            Some(item) if item.published => Ok(item),
            _ => Err(AppError::NotFound(format!("News item not found: {id}"))),
        }
    }

    /// Create a news item.
    pub async fn create(&self, input: CreateNewsInput) -> AppResult<news::Model> {
        input.validate()?;

        let title = required("title", &input.title)?;
        let content = required("content", &input.content)?;
        let now = Utc::now();

        let model = news::ActiveModel {
            id: Set(self.id_gen.generate()),
            title: Set(title),
            title_en: Set(optional(input.title_en)),
            content: Set(content),
            content_en: Set(optional(input.content_en)),
            summary: Set(optional(input.summary)),
            summary_en: Set(optional(input.summary_en)),
            image_url: Set(optional(input.image_url)),
            published: Set(input.published.unwrap_or(false)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = self.news_repo.create(model).await?;
        info!(news_id = %created.id, published = created.published, "News item created");
        Ok(created)
    }

    /// Update a news item.
    pub async fn update(&self, id: &str, input: UpdateNewsInput) -> AppResult<news::Model> {
        input.validate()?;

        let item = self.news_repo.get_by_id(id).await?;
        let mut active: news::ActiveModel = item.into();

        if let Some(title) = input.title {
            active.title = Set(required("title", &title)?);
        }
        if let Some(content) = input.content {
            active.content = Set(required("content", &content)?);
        }
        if let Some(title_en) = input.title_en {
            active.title_en = Set(optional(Some(title_en)));
        }
        if let Some(content_en) = input.content_en {
            active.content_en = Set(optional(Some(content_en)));
        }
        if let Some(summary) = input.summary {
            active.summary = Set(optional(Some(summary)));
        }
        if let Some(summary_en) = input.summary_en {
            active.summary_en = Set(optional(Some(summary_en)));
        }
        if let Some(image_url) = input.image_url {
            active.image_url = Set(optional(Some(image_url)));
        }
        if let Some(published) = input.published {
            active.published = Set(published);
        }

        active.updated_at = Set(Utc::now());

        let updated = self.news_repo.update(active).await?;
        info!(news_id = %updated.id, published = updated.published, "News item updated");
        Ok(updated)
    }

    /// Delete a news item with its attachments.
    ///
    /// Rows go in one transaction; stored objects are removed after commit.
    /// Returns the number of attachments removed.
    pub async fn delete(&self, id: &str) -> AppResult<usize> {
        let removed = self
            .news_repo
            .delete_with_attachments(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("News item not found: {id}")))?;

        let keys: Vec<String> = removed.iter().map(|a| a.file_path.clone()).collect();
        if !keys.is_empty() {
            if let Err(e) = self.storage.remove(&keys).await {
                warn!(
                    news_id = %id,
                    orphaned = keys.len(),
                    error = %e,
                    "Failed to remove attachment objects, leaving orphans in storage"
                );
            }
        }

        info!(news_id = %id, attachments = removed.len(), "News item deleted");
        Ok(removed.len())
    }
}

/// Render a news item for `language`.
///
/// English prefers the `_en` fields; every other language uses the base
/// fields. The summary falls back to the body and is cut to `summary_len`
/// characters followed by `...`.
#[must_use]
pub fn localize(item: &news::Model, language: Language, summary_len: usize) -> LocalizedNews {
    let (title, content, summary_source) = if language == Language::En {
        let content = first_present(&[&item.content_en, &Some(item.content.clone())]);
        let summary = first_present(&[
            &item.summary_en,
            &item.content_en,
            &item.summary,
            &Some(item.content.clone()),
        ]);
        (
            first_present(&[&item.title_en, &Some(item.title.clone())]),
            content,
            summary,
        )
    } else {
        (
            item.title.clone(),
            item.content.clone(),
            first_present(&[&item.summary, &Some(item.content.clone())]),
        )
    };

    LocalizedNews {
        id: item.id.clone(),
        title,
        summary: truncate(&summary_source, summary_len),
        content,
        image_url: item.image_url.clone(),
        created_at: item.created_at,
        updated_at: item.updated_at,
    }
}

fn first_present(candidates: &[&Option<String>]) -> String {
    candidates
        .iter()
        .find_map(|c| c.as_deref().filter(|s| !s.trim().is_empty()))
        .unwrap_or_default()
        .to_string()
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

fn required(field: &str, value: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
