use std::sync::Arc;
use std::time::Duration;

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use chrono::{DateTime, Utc};
use spyglass_core::error::Result;
use spyglass_core::ids::UserId;
use spyglass_store::Store;
use spyglass_store::sessions::IssuedSession;

use crate::error::ApiError;
use crate::http::AppState;

/// Identity collaborator: turns a presented session token into a user id.
pub trait SessionResolver: Send + Sync {
    fn resolve(&self, token: &str) -> Result<Option<UserId>>;
}

impl SessionResolver for Store {
    fn resolve(&self, token: &str) -> Result<Option<UserId>> {
        self.resolve_session(token, Utc::now())
    }
}

/// Issues and revokes sessions on behalf of the identity provider.
pub trait SessionIssuer: Send + Sync {
    fn issue(
        &self,
        user: &UserId,
        now: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<IssuedSession>;

    /// Returns whether the token existed.
    fn revoke(&self, token: &str) -> Result<bool>;
}

impl SessionIssuer for Store {
    fn issue(
        &self,
        user: &UserId,
        now: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<IssuedSession> {
        self.create_session(user, now, expires_at)
    }

    fn revoke(&self, token: &str) -> Result<bool> {
        self.revoke_session(token)
    }
}

/// Session administration, enabled only when an admin token is configured.
#[derive(Clone)]
pub struct SessionAdmin {
    pub token: String,
    pub default_ttl: Duration,
    pub sessions: Arc<dyn SessionIssuer>,
}

/// A caller holding the admin token. Without a configured admin the
/// endpoints behave as if they did not exist.
pub struct AdminCaller(pub SessionAdmin);

impl FromRequestParts<AppState> for AdminCaller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let Some(admin) = state.admin.as_ref() else {
            return Err(ApiError::NotFound);
        };
        match bearer_token(&parts.headers) {
            Some(token) if token == admin.token => Ok(AdminCaller(admin.clone())),
            _ => Err(ApiError::Unauthorized),
        }
    }
}

/// The authenticated caller. Extracting it fails with `401` before any body
/// is read, so unauthenticated requests never reach persistence.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserId);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let Some(token) = session_token(&parts.headers, &state.session_cookie) else {
            return Err(ApiError::Unauthorized);
        };
        match state.sessions.resolve(&token) {
            Ok(Some(user)) => Ok(CurrentUser(user)),
            Ok(None) => {
                tracing::debug!("session token did not resolve");
                Err(ApiError::Unauthorized)
            }
            Err(e) => Err(ApiError::Internal(format!("session lookup failed: {e}"))),
        }
    }
}

/// Bearer token wins over the session cookie when both are present.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(token) = bearer_token(headers) {
        return Some(token);
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}
