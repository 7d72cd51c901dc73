//! Contact form service.

use aac_common::{AppError, AppResult, IdGenerator};
use aac_db::{entities::contact_message, repositories::ContactMessageRepository};
use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

/// Contact form submission.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SubmitContactInput {
    #[validate(length(max = 100))]
    pub name: String,

    #[validate(email, length(max = 255))]
    pub email: String,

    #[validate(length(max = 50))]
    pub phone: Option<String>,

    #[validate(length(max = 200))]
    pub company: Option<String>,

    #[validate(length(max = 200))]
    pub subject: String,

    #[validate(length(max = 5000))]
    pub message: String,
}

impl SubmitContactInput {
    /// Trim every field and turn blank optional fields into `None`.
    fn normalized(self) -> Self {
        let blank_to_none = |v: Option<String>| {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: blank_to_none(self.phone),
            company: blank_to_none(self.company),
            subject: self.subject.trim().to_string(),
            message: self.message.trim().to_string(),
        }
    }

    fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("name", &self.name),
            ("email", &self.email),
            ("subject", &self.subject),
            ("message", &self.message),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(field, _)| field)
        .collect()
    }
}

/// Service for contact form submissions.
#[derive(Clone)]
pub struct ContactService {
    contact_repo: ContactMessageRepository,
    id_gen: IdGenerator,
}

impl ContactService {
    /// Create a new contact service.
    #[must_use]
    pub const fn new(contact_repo: ContactMessageRepository) -> Self {
        Self {
            contact_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Store a contact form submission.
    pub async fn submit(&self, input: SubmitContactInput) -> AppResult<contact_message::Model> {
        let input = input.normalized();

        let missing = input.missing_fields();
        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "Required fields missing: {}",
                missing.join(", ")
            )));
        }
        input.validate()?;

        let model = contact_message::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(input.name),
            email: Set(input.email),
            phone: Set(input.phone),
            company: Set(input.company),
            subject: Set(input.subject),
            message: Set(input.message),
            created_at: Set(Utc::now()),
        };

        let created = self.contact_repo.create(model).await?;
        info!(contact_message_id = %created.id, "Contact message received");
        Ok(created)
    }

    /// List submissions, newest first.
    pub async fn list(&self, limit: u64, offset: u64) -> AppResult<Vec<contact_message::Model>> {
        self.contact_repo.find_all(limit, offset).await
    }

    /// Count submissions.
    pub async fn count(&self) -> AppResult<u64> {
        self.contact_repo.count().await
    }

    /// Get a submission by ID.
    pub async fn get(&self, id: &str) -> AppResult<contact_message::Model> {
        self.contact_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Contact message not found: {id}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use aac_db::test_utils::fixtures;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn service(db: MockDatabase) -> ContactService {
        ContactService::new(ContactMessageRepository::new(Arc::new(db.into_connection())))
    }

    fn valid_input() -> SubmitContactInput {
        SubmitContactInput {
            name: " Zhang San ".to_string(),
            email: "zhang@example.com".to_string(),
            phone: Some("   ".to_string()),
            company: Some(String::new()),
            subject: "Lens inquiry".to_string(),
            message: "Do you ship to Europe?".to_string(),
        }
    }

    #[test]
    fn test_normalized_blank_optionals_become_none() {
        let input = valid_input().normalized();
        assert_eq!(input.name, "Zhang San");
        assert!(input.phone.is_none());
        assert!(input.company.is_none());
    }

    #[tokio::test]
    async fn test_submit_rejects_missing_required_fields() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));

        for field in ["name", "email", "subject", "message"] {
            let mut input = valid_input();
            match field {
                "name" => input.name = "  ".to_string(),
                "email" => input.email = String::new(),
                "subject" => input.subject = String::new(),
                _ => input.message = "\n".to_string(),
            }
            let err = svc.submit(input).await.unwrap_err();
            match err {
                AppError::Validation(msg) => assert!(msg.contains(field), "{msg}"),
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_submit_rejects_invalid_email_and_long_message() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));

        let mut input = valid_input();
        input.email = "not-an-email".to_string();
        assert!(matches!(svc.submit(input).await, Err(AppError::Validation(_))));

        let mut input = valid_input();
        input.message = "x".repeat(5001);
        assert!(matches!(svc.submit(input).await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_submit_stores_message() {
        let row = fixtures::contact_message("m1");
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[row.clone()]]),
        );

        let created = svc.submit(valid_input()).await.unwrap();
        assert_eq!(created.id, "m1");
    }

    #[tokio::test]
    async fn test_get_missing_message() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<contact_message::Model>::new()]),
        );
        assert!(matches!(svc.get("nope").await, Err(AppError::NotFound(_))));
    }
}
