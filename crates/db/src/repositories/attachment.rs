//! News attachment repository.

use std::sync::Arc;

use aac_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter,
    QueryOrder,
};

use crate::entities::{NewsAttachment, news_attachment};

/// Repository for attachment operations.
#[derive(Clone)]
pub struct AttachmentRepository {
    db: Arc<DatabaseConnection>,
}

impl AttachmentRepository {
    /// Create a new attachment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an attachment by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<news_attachment::Model>> {
        NewsAttachment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an attachment by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<news_attachment::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Attachment not found: {id}")))
    }

    /// Find the attachments of a news item, oldest first.
    pub async fn find_by_news(&self, news_id: &str) -> AppResult<Vec<news_attachment::Model>> {
        NewsAttachment::find()
            .filter(news_attachment::Column::NewsId.eq(news_id))
            .order_by(news_attachment::Column::CreatedAt, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create an attachment record.
    pub async fn create(
        &self,
        model: news_attachment::ActiveModel,
    ) -> AppResult<news_attachment::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete an attachment record. Returns whether a row was removed.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = NewsAttachment::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }
}
