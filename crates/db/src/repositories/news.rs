//! News repository.

use std::sync::Arc;

use aac_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};

use crate::entities::{News, NewsAttachment, news, news_attachment};

/// Repository for news operations.
#[derive(Clone)]
pub struct NewsRepository {
    db: Arc<DatabaseConnection>,
}

impl NewsRepository {
    /// Create a new news repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a news item by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<news::Model>> {
        News::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a news item by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<news::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("News item not found: {id}")))
    }

    /// Find published news items, newest first.
    pub async fn find_published(&self, limit: u64, offset: u64) -> AppResult<Vec<news::Model>> {
        News::find()
            .filter(news::Column::Published.eq(true))
            .order_by(news::Column::CreatedAt, Order::Desc)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count published news items.
    pub async fn count_published(&self) -> AppResult<u64> {
        News::find()
            .filter(news::Column::Published.eq(true))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find all news items (for admin), newest first.
    pub async fn find_all(&self) -> AppResult<Vec<news::Model>> {
        News::find()
            .order_by(news::Column::CreatedAt, Order::Desc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a news item.
    pub async fn create(&self, model: news::ActiveModel) -> AppResult<news::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a news item.
    pub async fn update(&self, model: news::ActiveModel) -> AppResult<news::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a news item together with its attachment rows in one transaction.
    ///
    /// Returns the removed attachments so their objects can be cleaned up, or
    /// `None` when the news item does not exist.
    pub async fn delete_with_attachments(
        &self,
        id: &str,
    ) -> AppResult<Option<Vec<news_attachment::Model>>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let item = News::find_by_id(id)
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if item.is_none() {
            txn.rollback()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            return Ok(None);
        }

        // RETURNING yields exactly the rows removed, including any inserted
        // after the news row was read.
        let attachments = NewsAttachment::delete_many()
            .filter(news_attachment::Column::NewsId.eq(id))
            .exec_with_returning(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        News::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Some(attachments))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_news(id: &str, title: &str, published: bool) -> news::Model {
        let now = Utc::now();
        news::Model {
            id: id.to_string(),
            title: title.to_string(),
            title_en: None,
            content: "Body".to_string(),
            content_en: None,
            summary: None,
            summary_en: None,
            image_url: None,
            published,
            created_at: now,
            updated_at: now,
        }
    }

    fn create_test_attachment(id: &str, news_id: &str) -> news_attachment::Model {
        news_attachment::Model {
            id: id.to_string(),
            news_id: news_id.to_string(),
            file_name: "brochure.pdf".to_string(),
            file_path: format!("{news_id}/1700000000000_abc.pdf"),
            file_type: "application/pdf".to_string(),
            file_size: 2048,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_find_by_id_returns_news() {
        let item = create_test_news("n1", "Launch", true);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[item.clone()]])
                .into_connection(),
        );

        let repo = NewsRepository::new(db);
        let found = repo.find_by_id("n1").await.unwrap().unwrap();

        assert_eq!(found.id, "n1");
        assert_eq!(found.title, "Launch");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<news::Model>::new()])
                .into_connection(),
        );

        let repo = NewsRepository::new(db);
        let err = repo.get_by_id("missing").await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_find_published_filters_and_orders() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_news("n2", "Second", true),
                    create_test_news("n1", "First", true),
                ]])
                .into_connection(),
        );

        let repo = NewsRepository::new(db.clone());
        let results = repo.find_published(10, 0).await.unwrap();
        assert_eq!(results.len(), 2);
        drop(repo);

        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        let sql = log[0].statements()[0].sql.clone();
        assert!(sql.contains(r#""news"."published" = $1"#));
        assert!(sql.contains(r#"ORDER BY "news"."created_at" DESC"#));
    }

    #[tokio::test]
    async fn test_count_published() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(3))
                }]])
                .into_connection(),
        );

        let repo = NewsRepository::new(db);
        assert_eq!(repo.count_published().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_delete_with_attachments_missing_item() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<news::Model>::new()])
                .into_connection(),
        );

        let repo = NewsRepository::new(db);
        assert!(repo.delete_with_attachments("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_with_attachments_runs_in_one_transaction() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_news("n1", "Launch", true)]])
                .append_query_results([[
                    create_test_attachment("a1", "n1"),
                    create_test_attachment("a2", "n1"),
                ]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1, // news row deleted
                }])
                .into_connection(),
        );

        let repo = NewsRepository::new(db.clone());
        let removed = repo.delete_with_attachments("n1").await.unwrap().unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(removed[0].news_id, "n1");
        drop(repo);

        // Every statement belongs to a single transaction
        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        assert_eq!(log.len(), 1);
        let statements: Vec<&str> = log[0].statements().iter().map(|s| s.sql.as_str()).collect();
        let attachments_deleted = statements
            .iter()
            .position(|sql| sql.starts_with(r#"DELETE FROM "news_attachments""#))
            .unwrap();
        assert!(statements[attachments_deleted].contains("RETURNING"));
        assert!(!statements.iter().any(|sql| sql.starts_with(r#"SELECT "news_attachments""#)));
        let news_deleted = statements
            .iter()
            .position(|sql| sql.starts_with(r#"DELETE FROM "news" "#))
            .unwrap();
        assert!(attachments_deleted < news_deleted);
    }
}
