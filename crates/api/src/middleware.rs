//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use aac_common::{AppError, AppResult, Config, StorageBackend};
use aac_core::{AttachmentService, AuthService, ContactService, Language, NewsService, Translator};
use aac_db::repositories::{
    AttachmentRepository, ContactMessageRepository, NewsRepository, ProfileRepository,
    UserRepository,
};
use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use sea_orm::DatabaseConnection;
use tracing::{debug, warn};

use crate::rate_limit::RateLimiterState;

/// Site-wide settings exposed through the API.
#[derive(Debug, Clone)]
pub struct SiteInfo {
    pub name: String,
    pub default_language: Language,
}

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub news_service: NewsService,
    pub attachment_service: AttachmentService,
    pub contact_service: ContactService,
    pub auth_service: AuthService,
    pub translator: Arc<Translator>,
    pub site: SiteInfo,
    pub rate_limiter: RateLimiterState,
}

impl AppState {
    /// Wire repositories and services over one connection pool and object store.
    pub fn new(
        db: Arc<DatabaseConnection>,
        storage: Arc<dyn StorageBackend>,
        config: &Config,
    ) -> AppResult<Self> {
        let default_language = Language::parse(&config.site.default_language).ok_or_else(|| {
            AppError::Config(format!(
                "Unsupported default language: {}",
                config.site.default_language
            ))
        })?;

        let news_repo = NewsRepository::new(Arc::clone(&db));
        let attachment_repo = AttachmentRepository::new(Arc::clone(&db));
        let contact_repo = ContactMessageRepository::new(Arc::clone(&db));
        let user_repo = UserRepository::new(Arc::clone(&db));
        let profile_repo = ProfileRepository::new(db);

        Ok(Self {
            news_service: NewsService::new(news_repo.clone(), Arc::clone(&storage)),
            attachment_service: AttachmentService::new(attachment_repo, news_repo, storage),
            contact_service: ContactService::new(contact_repo),
            auth_service: AuthService::new(user_repo, profile_repo),
            translator: Arc::new(Translator::load()?),
            site: SiteInfo {
                name: config.site.name.clone(),
                default_language,
            },
            rate_limiter: RateLimiterState::new(config.server.trust_proxy_headers),
        })
    }
}

/// Authentication middleware.
///
/// Resolves a `Bearer` token into a [`aac_core::Session`] stored in the request
/// extensions. Requests without a valid token continue anonymously.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToString::to_string);

    if let Some(token) = token {
        match state.auth_service.authenticate(&token).await {
            Ok(session) => {
                req.extensions_mut().insert(session);
            }
            Err(AppError::Unauthorized) => debug!("Ignoring unknown session token"),
            Err(e) => warn!(error = %e, "Session lookup failed"),
        }
    }

    next.run(req).await
}
