//! Request extractors.

use aac_common::AppError;
use aac_core::{Language, Session};
use axum::{
    extract::{FromRequestParts, Query},
    http::{header, request::Parts},
};
use serde::Deserialize;

use crate::middleware::AppState;

/// Authenticated user extractor.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Session);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by auth middleware
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}

/// Authenticated administrator extractor.
///
/// Rejects anonymous requests with `401` and signed-in users without the
/// `admin` role with `403`.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Session);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(session) = AuthUser::from_request_parts(parts, state).await?;
        if session.is_admin() {
            Ok(Self(session))
        } else {
            Err(AppError::Forbidden("Admin access required".to_string()))
        }
    }
}

/// Optional authenticated user extractor.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<Session>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Session>().cloned()))
    }
}

#[derive(Deserialize)]
struct LangQuery {
    lang: Option<String>,
}

/// Language of the current request.
///
/// Taken from `?lang=`, then `Accept-Language`, then the site default.
#[derive(Debug, Clone, Copy)]
pub struct Lang(pub Language);

impl FromRequestParts<AppState> for Lang {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let query = Query::<LangQuery>::try_from_uri(&parts.uri)
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        if let Some(code) = query.0.lang.as_deref().filter(|code| !code.is_empty()) {
            return code.parse().map(Self);
        }

        let negotiated = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok())
            .and_then(Language::negotiate);

        Ok(Self(negotiated.unwrap_or(state.site.default_language)))
    }
}
