//! Handlers for the `/users` resource (administration of accounts).

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use medialab_core::roles::ROLE_MEMBER;
use medialab_core::types::DbId;
use medialab_db::models::user::{CreateUser, UpdateUser, UserFilter, UserResponse};
use medialab_db::repositories::{RoleRepo, SessionRepo, UserRepo};
use medialab_events::{event_types, PlatformEvent};
use serde::Deserialize;
use validator::Validate;

use crate::auth::password::hash_password;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireUsersRead, RequireUsersWrite};
use crate::query::PaginationParams;
use crate::response::{DataResponse, PageResponse};
use crate::state::AppState;
use crate::validation;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(custom(function = "validation::username"))]
    pub username: String,
    #[validate(custom(function = "validation::email"))]
    pub email: String,
    #[validate(custom(function = "validation::password"))]
    pub password: String,
    pub full_name: Option<String>,
    /// Role id; takes precedence over `role`.
    pub role_id: Option<DbId>,
    /// Role name. Defaults to `member` when neither field is given.
    pub role: Option<String>,
    pub department_id: Option<DbId>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(custom(function = "validation::username"))]
    pub username: Option<String>,
    #[validate(custom(function = "validation::email"))]
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub role_id: Option<DbId>,
    pub department_id: Option<DbId>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdminResetPasswordRequest {
    #[validate(custom(function = "validation::password"))]
    pub new_password: String,
}

async fn resolve_role_id(state: &AppState, input: &CreateUserRequest) -> AppResult<DbId> {
    if let Some(id) = input.role_id {
        return RoleRepo::find_by_id(&state.pool, id)
            .await?
            .map(|r| r.id)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown role id {id}")));
    }
    let name = input.role.as_deref().unwrap_or(ROLE_MEMBER);
    RoleRepo::find_by_name(&state.pool, name)
        .await?
        .map(|r| r.id)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown role '{name}'")))
}

/// POST /api/v1/users
pub async fn create(
    RequireUsersWrite(admin): RequireUsersWrite,
    State(state): State<AppState>,
    Json(input): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<UserResponse>>)> {
    input.validate()?;
    let role_id = resolve_role_id(&state, &input).await?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            username: input.username.trim().to_string(),
            email: input.email.trim().to_lowercase(),
            password_hash: hash_password(&input.password)
                .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?,
            full_name: input.full_name,
            role_id,
            department_id: input.department_id,
        },
    )
    .await?;

    state.event_bus.publish(
        PlatformEvent::new(event_types::USER_CREATED)
            .with_source("user", user.id)
            .with_actor(admin.user_id)
            .with_payload(serde_json::json!({ "username": user.username, "role": user.role })),
    );
    tracing::info!(user_id = user.id, created_by = admin.user_id, "User created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: user.into() })))
}

/// GET /api/v1/users
pub async fn list(
    RequireUsersRead(_user): RequireUsersRead,
    State(state): State<AppState>,
    Query(filter): Query<UserFilter>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<PageResponse<UserResponse>>> {
    let (limit, offset) = page.resolve();
    let users = UserRepo::list(&state.pool, &filter, limit, offset).await?;
    let total = UserRepo::count(&state.pool, &filter).await?;
    let data = users.into_iter().map(UserResponse::from).collect();
    Ok(Json(PageResponse::new(data, limit, offset).with_total(total)))
}

/// GET /api/v1/users/{id}
pub async fn get_by_id(
    RequireUsersRead(_user): RequireUsersRead,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("User", id))?;
    Ok(Json(DataResponse { data: user.into() }))
}

/// PUT /api/v1/users/{id}
pub async fn update(
    RequireUsersWrite(_admin): RequireUsersWrite,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateUserRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    input.validate()?;
    if let Some(role_id) = input.role_id {
        if RoleRepo::find_by_id(&state.pool, role_id).await?.is_none() {
            return Err(AppError::BadRequest(format!("Unknown role id {role_id}")));
        }
    }

    let patch = UpdateUser {
        username: input.username.map(|u| u.trim().to_string()),
        email: input.email.map(|e| e.trim().to_lowercase()),
        full_name: input.full_name,
        role_id: input.role_id,
        department_id: input.department_id,
        is_active: None,
    };
    let user = UserRepo::update(&state.pool, id, &patch)
        .await?
        .ok_or(AppError::not_found("User", id))?;
    Ok(Json(DataResponse { data: user.into() }))
}

/// DELETE /api/v1/users/{id}
pub async fn delete(
    RequireUsersWrite(admin): RequireUsersWrite,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if admin.user_id == id {
        return Err(AppError::BadRequest("You cannot delete your own account".into()));
    }
    if !UserRepo::soft_delete(&state.pool, id).await? {
        return Err(AppError::not_found("User", id));
    }
    SessionRepo::revoke_all_for_user(&state.pool, id).await?;
    tracing::info!(user_id = id, deleted_by = admin.user_id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/users/{id}/activate
pub async fn activate(
    RequireUsersWrite(_admin): RequireUsersWrite,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    set_active(&state, id, true).await
}

/// POST /api/v1/users/{id}/deactivate
///
/// Also revokes every refresh session of the user.
pub async fn deactivate(
    RequireUsersWrite(admin): RequireUsersWrite,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if admin.user_id == id {
        return Err(AppError::BadRequest("You cannot deactivate your own account".into()));
    }
    set_active(&state, id, false).await?;
    SessionRepo::revoke_all_for_user(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_active(state: &AppState, id: DbId, active: bool) -> AppResult<StatusCode> {
    if UserRepo::set_active(&state.pool, id, active).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("User", id))
    }
}

/// POST /api/v1/users/{id}/reset-password
pub async fn reset_password(
    RequireUsersWrite(admin): RequireUsersWrite,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<AdminResetPasswordRequest>,
) -> AppResult<StatusCode> {
    input.validate()?;
    let hash = hash_password(&input.new_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
    if !UserRepo::update_password(&state.pool, id, &hash).await? {
        return Err(AppError::not_found("User", id));
    }
    SessionRepo::revoke_all_for_user(&state.pool, id).await?;

    state.event_bus.publish(
        PlatformEvent::new(event_types::PASSWORD_RESET)
            .with_source("user", id)
            .with_actor(admin.user_id)
            .with_payload(serde_json::json!({ "stage": "admin" })),
    );
    Ok(StatusCode::NO_CONTENT)
}
