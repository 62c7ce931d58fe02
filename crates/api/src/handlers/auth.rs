//! Handlers for the `/auth` resource: login, token refresh, logout, password
//! reset and change, and the caller's own profile.

use std::collections::HashMap;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use medialab_core::types::DbId;
use medialab_db::models::session::CreateSession;
use medialab_db::models::user::{UpdateUser, User, UserResponse};
use medialab_db::repositories::{
    PasswordResetRepo, RoleRepo, SessionRepo, TokenBlacklistRepo, UserRepo,
};
use medialab_events::{event_types, EmailTemplate, PlatformEvent};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::cookies::{auth_cookies, clear_auth_cookies, get_cookie, REFRESH_COOKIE};
use crate::auth::jwt::{generate_access_token, generate_refresh_token, hash_refresh_token};
use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rate_limit::{check_login_rate, ClientIp};
use crate::notifications::mail;
use crate::state::AppState;
use crate::validation;

/// Maximum consecutive failed login attempts before locking the account.
pub const MAX_FAILED_ATTEMPTS: i32 = 5;

/// Duration in minutes to lock an account after exceeding failed attempts.
pub const LOCK_DURATION_MINS: i64 = 15;

/// Lifetime of a password reset token.
const RESET_TOKEN_TTL_MINS: i64 = 60;

const INVALID_CREDENTIALS: &str = "Invalid username or password";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`. `username` may also be an email.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Request body for `POST /auth/refresh`. Falls back to the cookie when absent.
#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(custom(function = "validation::email"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
    #[validate(custom(function = "validation::password"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(custom(function = "validation::password"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 200))]
    pub full_name: Option<String>,
    #[validate(custom(function = "validation::email"))]
    pub email: Option<String>,
}

/// Successful authentication response returned by login and refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserInfo,
}

/// Public user info embedded in [`AuthResponse`].
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
    pub permissions: Vec<String>,
}

/// `GET /auth/me` payload: the user plus effective permissions.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub permissions: Vec<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
///
/// Authenticate with username (or email) + password. Returns access and
/// refresh tokens in the body and as HttpOnly cookies.
pub async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    headers: HeaderMap,
    Json(input): Json<LoginRequest>,
) -> AppResult<(HeaderMap, Json<AuthResponse>)> {
    input.validate()?;
    check_login_rate(&state, ip.as_deref(), &input.username).await?;

    // 1. Find user by username, or by email when it looks like one.
    let found = if input.username.contains('@') {
        UserRepo::find_by_email(&state.pool, &input.username).await?
    } else {
        UserRepo::find_by_username(&state.pool, &input.username).await?
    };
    let Some(user) = found else {
        publish_login_failed(&state, None, &input.username, ip, "unknown_user");
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
    };

    // 2. Check if the account is active.
    if !user.is_active {
        return Err(AppError::forbidden("Account is deactivated"));
    }

    // 3. Check if the account is temporarily locked.
    if user.is_locked(Utc::now()) {
        return Err(AppError::forbidden(
            "Account is temporarily locked. Try again later.",
        ));
    }

    // 4. Verify password.
    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    if !password_valid {
        // 5. On failure: increment counter, lock if threshold reached.
        let failures = UserRepo::increment_failed_login(&state.pool, user.id).await?;
        if failures >= MAX_FAILED_ATTEMPTS {
            let lock_until = Utc::now() + chrono::Duration::minutes(LOCK_DURATION_MINS);
            UserRepo::lock_account(&state.pool, user.id, lock_until).await?;
            tracing::warn!(user_id = user.id, failures, "Account locked after failed logins");
        }
        publish_login_failed(&state, Some(user.id), &input.username, ip, "bad_password");
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
    }

    // 6. On success: reset failed count, set last_login_at.
    UserRepo::record_successful_login(&state.pool, user.id).await?;

    // 7. Generate tokens and create session.
    let response = create_auth_response(&state, &user, user_agent(&headers), ip.clone()).await?;

    state.event_bus.publish(
        PlatformEvent::new(event_types::USER_LOGGED_IN)
            .with_source("user", user.id)
            .with_actor(user.id)
            .with_ip(ip),
    );
    tracing::info!(user_id = user.id, "User logged in");

    Ok(with_cookies(&state, response))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a valid refresh token (body or cookie) for new tokens. The old
/// session is revoked.
pub async fn refresh(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<(HeaderMap, Json<AuthResponse>)> {
    let from_body = if body.is_empty() {
        RefreshRequest::default()
    } else {
        serde_json::from_slice::<RefreshRequest>(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {e}")))?
    };
    let refresh_token = from_body
        .refresh_token
        .or_else(|| get_cookie(&headers, REFRESH_COOKIE))
        .ok_or_else(|| AppError::unauthorized("Missing refresh token"))?;

    // 1. Consume the session. A token that was already rotated finds nothing.
    let token_hash = hash_refresh_token(&refresh_token);
    let session = SessionRepo::rotate(&state.pool, &token_hash)
        .await?
        .ok_or_else(|| AppError::unauthorized("Invalid or expired refresh token"))?;

    // 2. Reload the user; role and permissions may have changed.
    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .ok_or_else(|| AppError::unauthorized("User no longer exists"))?;
    if !user.is_active {
        return Err(AppError::forbidden("Account is deactivated"));
    }

    let user_agent = user_agent(&headers).or(session.user_agent);
    let response = create_auth_response(&state, &user, user_agent, ip).await?;
    Ok(with_cookies(&state, response))
}

/// POST /api/v1/auth/logout
///
/// Revoke the presented access token and every refresh session of the user,
/// and clear the auth cookies.
pub async fn logout(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    auth_user: AuthUser,
) -> AppResult<(HeaderMap, StatusCode)> {
    let ttl = Duration::from_secs(auth_user.remaining_secs());
    state.token_store.revoke(&auth_user.jti, ttl).await;

    let expires_at = chrono::DateTime::from_timestamp(auth_user.exp, 0).unwrap_or_else(Utc::now);
    TokenBlacklistRepo::insert(
        &state.pool,
        &auth_user.jti,
        Some(auth_user.user_id),
        expires_at,
        "logout",
    )
    .await?;
    SessionRepo::revoke_all_for_user(&state.pool, auth_user.user_id).await?;

    state.event_bus.publish(
        PlatformEvent::new(event_types::USER_LOGGED_OUT)
            .with_source("user", auth_user.user_id)
            .with_actor(auth_user.user_id)
            .with_ip(ip),
    );

    Ok((
        clear_auth_cookies(state.config.cookie_secure),
        StatusCode::NO_CONTENT,
    ))
}

/// POST /api/v1/auth/forgot-password
///
/// Always answers 202 so the endpoint does not reveal which emails exist.
pub async fn forgot_password(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(input): Json<ForgotPasswordRequest>,
) -> AppResult<StatusCode> {
    input.validate()?;

    let user = match UserRepo::find_by_email(&state.pool, &input.email).await? {
        Some(user) if user.is_active => user,
        _ => {
            tracing::debug!("Password reset requested for unknown or inactive email");
            return Ok(StatusCode::ACCEPTED);
        }
    };

    let (token, token_hash) = generate_refresh_token();
    let expires_at = Utc::now() + chrono::Duration::minutes(RESET_TOKEN_TTL_MINS);
    PasswordResetRepo::create(&state.pool, user.id, &token_hash, expires_at).await?;

    let vars = HashMap::from([
        ("name", user.display_name()),
        (
            "reset_url",
            format!("{}/reset-password?token={token}", state.config.frontend_url),
        ),
        ("expires_minutes", RESET_TOKEN_TTL_MINS.to_string()),
    ]);
    mail::spawn_send(
        state.pool.clone(),
        state.config.secret_encryption_key.clone(),
        user.email.clone(),
        EmailTemplate::PasswordReset.render(&vars),
    );

    state.event_bus.publish(
        PlatformEvent::new(event_types::PASSWORD_RESET)
            .with_source("user", user.id)
            .with_ip(ip)
            .with_payload(serde_json::json!({ "stage": "requested" })),
    );

    Ok(StatusCode::ACCEPTED)
}

/// POST /api/v1/auth/reset-password
///
/// Consume a reset token and set a new password. All sessions are revoked.
pub async fn reset_password(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(input): Json<ResetPasswordRequest>,
) -> AppResult<StatusCode> {
    input.validate()?;

    let token_hash = hash_refresh_token(&input.token);
    let reset = PasswordResetRepo::consume(&state.pool, &token_hash)
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid or expired reset token".into()))?;

    let new_hash = hash_password(&input.new_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
    if !UserRepo::update_password(&state.pool, reset.user_id, &new_hash).await? {
        return Err(AppError::BadRequest("Invalid or expired reset token".into()));
    }
    SessionRepo::revoke_all_for_user(&state.pool, reset.user_id).await?;

    state.event_bus.publish(
        PlatformEvent::new(event_types::PASSWORD_RESET)
            .with_source("user", reset.user_id)
            .with_actor(reset.user_id)
            .with_ip(ip)
            .with_payload(serde_json::json!({ "stage": "completed" })),
    );

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/auth/change-password
pub async fn change_password(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    auth_user: AuthUser,
    Json(input): Json<ChangePasswordRequest>,
) -> AppResult<StatusCode> {
    input.validate()?;

    let user = load_user(&state, auth_user.user_id).await?;
    let current_ok = verify_password(&input.current_password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !current_ok {
        return Err(AppError::validation("Current password is incorrect"));
    }
    if input.current_password == input.new_password {
        return Err(AppError::validation(
            "New password must differ from the current password",
        ));
    }

    let new_hash = hash_password(&input.new_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
    UserRepo::update_password(&state.pool, user.id, &new_hash).await?;
    SessionRepo::revoke_all_for_user(&state.pool, user.id).await?;

    state.event_bus.publish(
        PlatformEvent::new(event_types::PASSWORD_CHANGED)
            .with_source("user", user.id)
            .with_actor(user.id)
            .with_ip(ip),
    );

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/me
pub async fn me(State(state): State<AppState>, auth_user: AuthUser) -> AppResult<Json<MeResponse>> {
    let user = load_user(&state, auth_user.user_id).await?;
    let permissions = RoleRepo::permission_codes(&state.pool, user.role_id).await?;
    Ok(Json(MeResponse {
        user: user.into(),
        permissions,
    }))
}

/// PUT /api/v1/auth/me
///
/// Users may change their own display name and email only.
pub async fn update_me(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(input): Json<UpdateProfileRequest>,
) -> AppResult<Json<MeResponse>> {
    input.validate()?;

    let update = UpdateUser {
        full_name: input.full_name,
        email: input.email,
        ..Default::default()
    };
    let user = UserRepo::update(&state.pool, auth_user.user_id, &update)
        .await?
        .ok_or_else(|| AppError::not_found("User", auth_user.user_id))?;
    let permissions = RoleRepo::permission_codes(&state.pool, user.role_id).await?;
    Ok(Json(MeResponse {
        user: user.into(),
        permissions,
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn load_user(state: &AppState, id: DbId) -> AppResult<User> {
    UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("User", id))
}

fn publish_login_failed(
    state: &AppState,
    user_id: Option<DbId>,
    username: &str,
    ip: Option<String>,
    reason: &str,
) {
    let mut event = PlatformEvent::new(event_types::LOGIN_FAILED)
        .with_ip(ip)
        .with_payload(serde_json::json!({ "username": username, "reason": reason }));
    if let Some(id) = user_id {
        event = event.with_source("user", id);
    }
    state.event_bus.publish(event);
}

fn with_cookies(state: &AppState, response: AuthResponse) -> (HeaderMap, Json<AuthResponse>) {
    let jwt = &state.config.jwt;
    let headers = auth_cookies(
        &response.access_token,
        jwt.access_expiry_secs(),
        &response.refresh_token,
        jwt.refresh_token_expiry_days * 86_400,
        state.config.cookie_secure,
    );
    (headers, Json(response))
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Generate access + refresh tokens, persist a session row, and build the response.
async fn create_auth_response(
    state: &AppState,
    user: &User,
    user_agent: Option<String>,
    ip_address: Option<String>,
) -> AppResult<AuthResponse> {
    let permissions = RoleRepo::permission_codes(&state.pool, user.role_id).await?;

    let (access_token, _claims) =
        generate_access_token(user.id, &user.role, permissions.clone(), &state.config.jwt)
            .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    let (refresh_plaintext, refresh_hash) = generate_refresh_token();
    let expires_at =
        Utc::now() + chrono::Duration::days(state.config.jwt.refresh_token_expiry_days);

    let session_input = CreateSession {
        user_id: user.id,
        refresh_token_hash: refresh_hash,
        expires_at,
        user_agent,
        ip_address,
    };
    SessionRepo::create(&state.pool, &session_input).await?;

    Ok(AuthResponse {
        access_token,
        refresh_token: refresh_plaintext,
        token_type: "Bearer",
        expires_in: state.config.jwt.access_expiry_secs(),
        user: UserInfo {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            role: user.role.clone(),
            permissions,
        },
    })
}
