//! Contact message repository.

use std::sync::Arc;

use aac_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait, QueryOrder,
    QuerySelect,
};

use crate::entities::{ContactMessage, contact_message};

/// Repository for contact form submissions.
#[derive(Clone)]
pub struct ContactMessageRepository {
    db: Arc<DatabaseConnection>,
}

impl ContactMessageRepository {
    /// Create a new contact message repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Store a submission.
    pub async fn create(
        &self,
        model: contact_message::ActiveModel,
    ) -> AppResult<contact_message::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a submission by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<contact_message::Model>> {
        ContactMessage::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List submissions, newest first.
    pub async fn find_all(
        &self,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<contact_message::Model>> {
        ContactMessage::find()
            .order_by(contact_message::Column::CreatedAt, Order::Desc)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all submissions.
    pub async fn count(&self) -> AppResult<u64> {
        ContactMessage::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_message(id: &str) -> contact_message::Model {
        contact_message::Model {
            id: id.to_string(),
            name: "Li Wei".to_string(),
            email: "li.wei@example.com".to_string(),
            phone: None,
            company: Some("Optics Ltd".to_string()),
            subject: "Quote".to_string(),
            message: "Please send a quote for 500 lenses.".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_find_all_newest_first() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_message("m2"), create_test_message("m1")]])
                .into_connection(),
        );

        let repo = ContactMessageRepository::new(db.clone());
        let results = repo.find_all(20, 0).await.unwrap();
        assert_eq!(results.len(), 2);
        drop(repo);

        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        let sql = log[0].statements()[0].sql.clone();
        assert!(sql.contains(r#"ORDER BY "contact_messages"."created_at" DESC"#));
    }

    #[tokio::test]
    async fn test_count() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(7))
                }]])
                .into_connection(),
        );

        let repo = ContactMessageRepository::new(db);
        assert_eq!(repo.count().await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_find_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<contact_message::Model>::new()])
                .into_connection(),
        );

        let repo = ContactMessageRepository::new(db);
        assert!(repo.find_by_id("missing").await.unwrap().is_none());
    }
}
