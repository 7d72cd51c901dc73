//! Authentication service (accounts, bearer sessions, roles).

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use aac_common::{AppError, AppResult, IdGenerator};
use aac_db::{
    entities::{profile::Role, user},
    repositories::{ProfileRepository, UserRepository},
};
use chrono::Utc;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

/// Hash checked when the email is unknown, so a miss costs as much as a
/// wrong password.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("unknown-account-placeholder").ok());

/// Credentials for sign-up and sign-in.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Credentials {
    #[validate(email, length(max = 255))]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// An authenticated user and their role.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub user: user::Model,
    pub role: Role,
}

impl Session {
    /// Whether this session may use the back office.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Result of a successful sign-in.
#[derive(Debug, Clone, Serialize)]
pub struct SignedIn {
    /// Bearer token for subsequent requests.
    pub token: String,
    #[serde(flatten)]
    pub session: Session,
}

/// Service for accounts and sessions.
#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    profile_repo: ProfileRepository,
    id_gen: IdGenerator,
}

impl AuthService {
    /// Create a new auth service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, profile_repo: ProfileRepository) -> Self {
        Self {
            user_repo,
            profile_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register an account with the `user` role.
    pub async fn sign_up(&self, input: Credentials) -> AppResult<user::Model> {
        input.validate()?;
        let email = input.email.trim().to_lowercase();

        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            email: Set(email),
            password_hash: Set(hash_password(&input.password)?),
            token: Set(None),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };

        let user = self.user_repo.create(model, Role::User).await?;
        info!(user_id = %user.id, "User signed up");
        Ok(user)
    }

    /// Sign in and issue a fresh session token.
    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<SignedIn> {
        let Some(user) = self.user_repo.find_by_email(email.trim()).await? else {
            if let Some(hash) = DUMMY_HASH.as_deref() {
                let _ = verify_password(password, hash);
            }
            return Err(AppError::Unauthorized);
        };

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        let token = self.id_gen.generate_token();
        self.user_repo.set_token(&user.id, Some(token.clone())).await?;
        let role = self.role_of(&user.id).await?;

        info!(user_id = %user.id, "User signed in");
        Ok(SignedIn {
            token: token.clone(),
            session: Session {
                user: user::Model {
                    token: Some(token),
                    ..user
                },
                role,
            },
        })
    }

    /// Resolve a bearer token to a session.
    pub async fn authenticate(&self, token: &str) -> AppResult<Session> {
        let user = self
            .user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)?;
        let role = self.role_of(&user.id).await?;
        Ok(Session { user, role })
    }

    /// Invalidate the session of a user.
    pub async fn sign_out(&self, user_id: &str) -> AppResult<()> {
        self.user_repo.set_token(user_id, None).await?;
        info!(user_id = %user_id, "User signed out");
        Ok(())
    }

    /// Set the role of a user, creating the profile if it is missing.
    pub async fn grant_role(&self, user_id: &str, role: Role) -> AppResult<()> {
        if !self.profile_repo.set_role(user_id, role).await? {
            self.profile_repo.create(user_id, role).await?;
        }
        info!(user_id = %user_id, role = ?role, "Role granted");
        Ok(())
    }

    /// Set the role of the user registered with `email`.
    pub async fn grant_role_by_email(&self, email: &str, role: Role) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_email(email.trim())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No user registered with {email}")))?;
        self.grant_role(&user.id, role).await?;
        Ok(user)
    }

    async fn role_of(&self, user_id: &str) -> AppResult<Role> {
        Ok(self
            .profile_repo
            .find_by_id(user_id)
            .await?
            .map(|p| p.role)
            .unwrap_or_default())
    }
}

/// Hash a password using Argon2.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
