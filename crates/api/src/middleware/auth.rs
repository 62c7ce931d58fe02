//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use medialab_core::permissions::has_permission;
use medialab_core::roles::ROLE_ADMIN;
use medialab_core::types::DbId;

use crate::auth::cookies::{get_cookie, ACCESS_COOKIE};
use crate::auth::jwt::{validate_token, Claims};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Authenticated user extracted from the access token.
///
/// The token is read from `Authorization: Bearer <token>`, falling back to
/// the `access_token` cookie. Revoked tokens are rejected.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     user.require(permissions::ORG_WRITE)?;
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's internal database id (from `claims.sub`).
    pub user_id: DbId,
    /// The user's role name.
    pub role: String,
    /// Permission codes granted when the token was issued.
    pub perms: Vec<String>,
    /// Token id, used for revocation on logout.
    pub jti: String,
    /// Token expiry (UTC Unix timestamp).
    pub exp: i64,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
            perms: claims.perms,
            jti: claims.jti,
            exp: claims.exp,
        }
    }
}

impl AuthUser {
    pub fn has_permission(&self, code: &str) -> bool {
        has_permission(&self.perms, code)
    }

    /// Fail with 403 unless the user holds `code`.
    pub fn require(&self, code: &str) -> AppResult<()> {
        if self.has_permission(code) {
            Ok(())
        } else {
            Err(AppError::forbidden(format!("Permission '{code}' required")))
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    /// Seconds until the access token expires.
    pub fn remaining_secs(&self) -> u64 {
        let now = chrono::Utc::now().timestamp();
        u64::try_from(self.exp - now).unwrap_or(0)
    }
}

/// Pull the raw access token from the request: Bearer header first, then cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        if let Some(token) = auth.strip_prefix("Bearer ") {
            return Some(token.trim().to_string());
        }
    }
    get_cookie(headers, ACCESS_COOKIE)
}

/// Validate `token` and check it has not been revoked.
pub async fn authenticate(token: &str, state: &AppState) -> AppResult<AuthUser> {
    let claims = validate_token(token, &state.config.jwt)
        .map_err(|_| AppError::unauthorized("Invalid or expired token"))?;

    if state.token_store.is_revoked(&claims.jti).await {
        return Err(AppError::unauthorized("Token has been revoked"));
    }

    Ok(claims.into())
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers)
            .ok_or_else(|| AppError::unauthorized("Missing access token"))?;
        authenticate(&token, state).await
    }
}

/// Like [`AuthUser`] but anonymous requests pass through as `None`.
///
/// An invalid or revoked credential is also treated as anonymous, so public
/// endpoints keep working for clients holding a stale cookie.
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = extract_token(&parts.headers) else {
            return Ok(MaybeAuthUser(None));
        };
        Ok(MaybeAuthUser(authenticate(&token, state).await.ok()))
    }
}
