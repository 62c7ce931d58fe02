//! Permission-checking extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects the request with 403 unless
//! the token grants the named permission code (directly, via a `resource.*`
//! wildcard, or via `*`).

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use medialab_core::permissions;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

macro_rules! require_permission {
    ($($(#[$doc:meta])* $name:ident => $code:path;)+) => {
        $(
            $(#[$doc])*
            pub struct $name(pub AuthUser);

            impl FromRequestParts<AppState> for $name {
                type Rejection = AppError;

                async fn from_request_parts(
                    parts: &mut Parts,
                    state: &AppState,
                ) -> Result<Self, Self::Rejection> {
                    let user = AuthUser::from_request_parts(parts, state).await?;
                    user.require($code)?;
                    Ok($name(user))
                }
            }
        )+
    };
}

require_permission! {
    /// Requires `users.read`.
    RequireUsersRead => permissions::USERS_READ;
    /// Requires `users.write`.
    RequireUsersWrite => permissions::USERS_WRITE;
    /// Requires `roles.read`.
    RequireRolesRead => permissions::ROLES_READ;
    /// Requires `roles.write`.
    RequireRolesWrite => permissions::ROLES_WRITE;
    /// Requires `org.read`.
    RequireOrgRead => permissions::ORG_READ;
    /// Requires `org.write`.
    RequireOrgWrite => permissions::ORG_WRITE;
    /// Requires `requests.manage`.
    RequireRequestsManage => permissions::REQUESTS_MANAGE;
    /// Requires `projects.read`.
    RequireProjectsRead => permissions::PROJECTS_READ;
    /// Requires `projects.write`.
    RequireProjectsWrite => permissions::PROJECTS_WRITE;
    /// Requires `content.write`.
    RequireContentWrite => permissions::CONTENT_WRITE;
    /// Requires `smtp.manage`.
    RequireSmtpManage => permissions::SMTP_MANAGE;
    /// Requires `audit.read`.
    RequireAuditRead => permissions::AUDIT_READ;
}
