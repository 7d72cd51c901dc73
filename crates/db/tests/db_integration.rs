//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test -p aac-db --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `aac_test`)
//!   `TEST_DB_PASSWORD` (default: `aac_test`)
//!   `TEST_DB_NAME` (default: `aac_test`)

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use aac_db::{
    entities::{news, news_attachment},
    repositories::{AttachmentRepository, NewsRepository},
    test_utils::{TestDatabase, TestDbConfig, fixtures},
};
use sea_orm::{ActiveModelTrait, IntoActiveModel};

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_delete_with_attachments_removes_rows() {
    let db = TestDatabase::new().await.expect("Failed to connect");
    db.cleanup().await.unwrap();
    let conn = Arc::new(db.conn);

    let item: news::ActiveModel = fixtures::news("n1", true, 0).into_active_model();
    item.insert(conn.as_ref()).await.unwrap();
    for id in ["a1", "a2"] {
        let row: news_attachment::ActiveModel =
            fixtures::attachment(id, "n1", "image/png").into_active_model();
        row.insert(conn.as_ref()).await.unwrap();
    }

    let news_repo = NewsRepository::new(conn.clone());
    let attachment_repo = AttachmentRepository::new(conn.clone());

    let removed = news_repo.delete_with_attachments("n1").await.unwrap().unwrap();
    assert_eq!(removed.len(), 2);
    assert!(news_repo.find_by_id("n1").await.unwrap().is_none());
    assert!(attachment_repo.find_by_news("n1").await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_public_list_hides_drafts() {
    let db = TestDatabase::new().await.expect("Failed to connect");
    db.cleanup().await.unwrap();
    let conn = Arc::new(db.conn);

    for (id, published, age) in [("old", true, 60), ("draft", false, 30), ("new", true, 0)] {
        let item: news::ActiveModel = fixtures::news(id, published, age).into_active_model();
        item.insert(conn.as_ref()).await.unwrap();
    }

    let repo = NewsRepository::new(conn);
    let ids: Vec<String> = repo
        .find_published(10, 0)
        .await
        .unwrap()
        .into_iter()
        .map(|n| n.id)
        .collect();
    assert_eq!(ids, vec!["new".to_string(), "old".to_string()]);
    assert_eq!(repo.count_published().await.unwrap(), 2);
    assert_eq!(repo.find_all().await.unwrap().len(), 3);
}

#[test]
fn test_database_url_format() {
    let config = TestDbConfig {
        host: "testhost".to_string(),
        port: 5432,
        username: "testuser".to_string(),
        password: "testpass".to_string(),
        database: "testdb".to_string(),
    };

    let url = config.database_url();
    assert!(url.starts_with("postgres://"));
    assert!(url.contains("testhost:5432"));
    assert!(url.ends_with("/testdb"));
}
