//! Handlers for the `/areas` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use medialab_core::types::DbId;
use medialab_core::validation::validate_name;
use medialab_db::models::area::{Area, CreateArea, UpdateArea};
use medialab_db::models::department::Department;
use medialab_db::repositories::{AreaRepo, DepartmentRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireOrgRead, RequireOrgWrite};
use crate::query::PaginationParams;
use crate::response::{DataResponse, PageResponse};
use crate::state::AppState;

/// POST /api/v1/areas
pub async fn create(
    RequireOrgWrite(_user): RequireOrgWrite,
    State(state): State<AppState>,
    Json(mut input): Json<CreateArea>,
) -> AppResult<(StatusCode, Json<DataResponse<Area>>)> {
    input.name = input.name.trim().to_string();
    validate_name("Name", &input.name).map_err(AppError::validation)?;
    let area = AreaRepo::create(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: area })))
}

/// GET /api/v1/areas
pub async fn list(
    RequireOrgRead(_user): RequireOrgRead,
    State(state): State<AppState>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<PageResponse<Area>>> {
    let (limit, offset) = page.resolve();
    let areas = AreaRepo::list(&state.pool, limit, offset).await?;
    let total = AreaRepo::count(&state.pool).await?;
    Ok(Json(PageResponse::new(areas, limit, offset).with_total(total)))
}

/// GET /api/v1/areas/{id}
pub async fn get_by_id(
    RequireOrgRead(_user): RequireOrgRead,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Area>>> {
    let area = AreaRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Area", id))?;
    Ok(Json(DataResponse { data: area }))
}

/// PUT /api/v1/areas/{id}
pub async fn update(
    RequireOrgWrite(_user): RequireOrgWrite,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateArea>,
) -> AppResult<Json<DataResponse<Area>>> {
    if let Some(name) = input.name.as_mut() {
        *name = name.trim().to_string();
        validate_name("Name", name).map_err(AppError::validation)?;
    }
    let area = AreaRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::not_found("Area", id))?;
    Ok(Json(DataResponse { data: area }))
}

/// DELETE /api/v1/areas/{id}
///
/// Refused with 409 while live departments still belong to the area.
pub async fn delete(
    RequireOrgWrite(_user): RequireOrgWrite,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let departments = AreaRepo::count_departments(&state.pool, id).await?;
    if departments > 0 {
        return Err(AppError::conflict(format!(
            "Area still has {departments} department(s)"
        )));
    }
    if AreaRepo::soft_delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Area", id))
    }
}

/// GET /api/v1/areas/{id}/departments
pub async fn list_departments(
    RequireOrgRead(_user): RequireOrgRead,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<PageResponse<Department>>> {
    if AreaRepo::find_by_id(&state.pool, id).await?.is_none() {
        return Err(AppError::not_found("Area", id));
    }
    let (limit, offset) = page.resolve();
    let departments = DepartmentRepo::list(&state.pool, Some(id), limit, offset).await?;
    let total = DepartmentRepo::count(&state.pool, Some(id)).await?;
    Ok(Json(PageResponse::new(departments, limit, offset).with_total(total)))
}
