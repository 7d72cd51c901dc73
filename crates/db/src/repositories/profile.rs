//! Profile repository.

use std::sync::Arc;

use aac_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    sea_query::Expr,
};

use crate::entities::{Profile, profile};

/// Repository for profile (role) lookups.
#[derive(Clone)]
pub struct ProfileRepository {
    db: Arc<DatabaseConnection>,
}

impl ProfileRepository {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the profile of a user.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<profile::Model>> {
        Profile::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a profile.
    pub async fn create(&self, id: &str, role: profile::Role) -> AppResult<profile::Model> {
        profile::ActiveModel {
            id: Set(id.to_string()),
            role: Set(role),
        }
        .insert(self.db.as_ref())
        .await
        .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Change the role of an existing profile. Returns whether a row changed.
    pub async fn set_role(&self, id: &str, role: profile::Role) -> AppResult<bool> {
        let result = Profile::update_many()
            .col_expr(profile::Column::Role, Expr::value(role))
            .filter(profile::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_find_by_id_returns_role() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[profile::Model {
                    id: "u1".to_string(),
                    role: profile::Role::Admin,
                }]])
                .into_connection(),
        );

        let repo = ProfileRepository::new(db);
        let found = repo.find_by_id("u1").await.unwrap().unwrap();
        assert_eq!(found.role, profile::Role::Admin);
    }

    #[tokio::test]
    async fn test_set_role() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = ProfileRepository::new(db);
        assert!(repo.set_role("u1", profile::Role::Admin).await.unwrap());
    }
}
