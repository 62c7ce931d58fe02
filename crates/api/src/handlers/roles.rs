//! Handlers for `/roles` and the `/permissions` catalogue.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use medialab_core::permissions::validate_permission_code;
use medialab_core::roles::is_builtin_role;
use medialab_core::types::DbId;
use medialab_db::models::role::{CreateRole, Permission, Role, RoleWithPermissions, UpdateRole};
use medialab_db::repositories::{PermissionRepo, RoleRepo};
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireRolesRead, RequireRolesWrite};
use crate::response::DataResponse;
use crate::state::AppState;
use crate::validation;

#[derive(Debug, Deserialize, Validate)]
pub struct RoleRequest {
    #[validate(custom(function = "validation::name"), length(max = 50))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRoleRequest {
    #[validate(custom(function = "validation::name"), length(max = 50))]
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetPermissionsRequest {
    pub permissions: Vec<String>,
}

/// GET /api/v1/roles
pub async fn list(
    RequireRolesRead(_user): RequireRolesRead,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Role>>>> {
    let roles = RoleRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: roles }))
}

/// POST /api/v1/roles
pub async fn create(
    RequireRolesWrite(_admin): RequireRolesWrite,
    State(state): State<AppState>,
    Json(input): Json<RoleRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Role>>)> {
    input.validate()?;
    let role = RoleRepo::create(
        &state.pool,
        &CreateRole {
            name: input.name.trim().to_lowercase(),
            description: input.description,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: role })))
}

/// GET /api/v1/roles/{id}
pub async fn get_by_id(
    RequireRolesRead(_user): RequireRolesRead,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<RoleWithPermissions>>> {
    let role = RoleRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Role", id))?;
    let permissions = RoleRepo::permission_codes(&state.pool, id).await?;
    Ok(Json(DataResponse {
        data: RoleWithPermissions { role, permissions },
    }))
}

/// PUT /api/v1/roles/{id}
///
/// Built-in roles keep their names; only the description may change.
pub async fn update(
    RequireRolesWrite(_admin): RequireRolesWrite,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateRoleRequest>,
) -> AppResult<Json<DataResponse<Role>>> {
    input.validate()?;
    let existing = RoleRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Role", id))?;

    let name = input.name.map(|n| n.trim().to_lowercase());
    if is_builtin_role(&existing.name) && name.as_deref().is_some_and(|n| n != existing.name) {
        return Err(AppError::BadRequest(format!(
            "Built-in role '{}' cannot be renamed",
            existing.name
        )));
    }

    let role = RoleRepo::update(
        &state.pool,
        id,
        &UpdateRole {
            name,
            description: input.description,
        },
    )
    .await?
    .ok_or(AppError::not_found("Role", id))?;
    Ok(Json(DataResponse { data: role }))
}

/// DELETE /api/v1/roles/{id}
pub async fn delete(
    RequireRolesWrite(_admin): RequireRolesWrite,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let role = RoleRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Role", id))?;
    if is_builtin_role(&role.name) {
        return Err(AppError::BadRequest(format!(
            "Built-in role '{}' cannot be deleted",
            role.name
        )));
    }
    // Users still holding the role trip the foreign key (400).
    if RoleRepo::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Role", id))
    }
}

/// GET /api/v1/roles/{id}/permissions
pub async fn get_permissions(
    RequireRolesRead(_user): RequireRolesRead,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<String>>>> {
    if RoleRepo::find_by_id(&state.pool, id).await?.is_none() {
        return Err(AppError::not_found("Role", id));
    }
    let codes = RoleRepo::permission_codes(&state.pool, id).await?;
    Ok(Json(DataResponse { data: codes }))
}

/// PUT /api/v1/roles/{id}/permissions
///
/// Replaces the role's grants. Tokens already issued keep their old
/// permissions until they expire or are refreshed.
pub async fn set_permissions(
    RequireRolesWrite(admin): RequireRolesWrite,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SetPermissionsRequest>,
) -> AppResult<Json<DataResponse<Vec<String>>>> {
    if RoleRepo::find_by_id(&state.pool, id).await?.is_none() {
        return Err(AppError::not_found("Role", id));
    }

    let mut codes: Vec<String> = input
        .permissions
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    codes.sort();
    codes.dedup();
    for code in &codes {
        validate_permission_code(code).map_err(AppError::validation)?;
        PermissionRepo::ensure(&state.pool, code).await?;
    }

    let granted = RoleRepo::set_permissions(&state.pool, id, &codes).await?;
    tracing::info!(
        role_id = id,
        changed_by = admin.user_id,
        count = granted.len(),
        "Role permissions replaced"
    );
    Ok(Json(DataResponse { data: granted }))
}

/// GET /api/v1/permissions
pub async fn list_permissions(
    RequireRolesRead(_user): RequireRolesRead,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Permission>>>> {
    let permissions = PermissionRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: permissions }))
}
