//! Handlers for the `/departments` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use medialab_core::types::DbId;
use medialab_core::validation::validate_name;
use medialab_db::models::department::{CreateDepartment, Department, UpdateDepartment};
use medialab_db::models::service::{Service, ServiceFilter};
use medialab_db::repositories::{AreaRepo, DepartmentRepo, ServiceRepo, UserRepo};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireOrgRead, RequireOrgWrite};
use crate::query::PaginationParams;
use crate::response::{DataResponse, PageResponse};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DepartmentListParams {
    pub area_id: Option<DbId>,
}

async fn ensure_area(state: &AppState, area_id: DbId) -> AppResult<()> {
    match AreaRepo::find_by_id(&state.pool, area_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::BadRequest(format!("Area {area_id} does not exist"))),
    }
}

async fn ensure_head(state: &AppState, head_user_id: Option<DbId>) -> AppResult<()> {
    let Some(id) = head_user_id else {
        return Ok(());
    };
    match UserRepo::find_by_id(&state.pool, id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::BadRequest(format!("User {id} does not exist"))),
    }
}

/// POST /api/v1/departments
pub async fn create(
    RequireOrgWrite(_user): RequireOrgWrite,
    State(state): State<AppState>,
    Json(mut input): Json<CreateDepartment>,
) -> AppResult<(StatusCode, Json<DataResponse<Department>>)> {
    input.name = input.name.trim().to_string();
    validate_name("Name", &input.name).map_err(AppError::validation)?;
    ensure_area(&state, input.area_id).await?;
    ensure_head(&state, input.head_user_id).await?;

    let department = DepartmentRepo::create(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: department })))
}

/// GET /api/v1/departments
pub async fn list(
    RequireOrgRead(_user): RequireOrgRead,
    State(state): State<AppState>,
    Query(params): Query<DepartmentListParams>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<PageResponse<Department>>> {
    let (limit, offset) = page.resolve();
    let departments = DepartmentRepo::list(&state.pool, params.area_id, limit, offset).await?;
    let total = DepartmentRepo::count(&state.pool, params.area_id).await?;
    Ok(Json(PageResponse::new(departments, limit, offset).with_total(total)))
}

/// GET /api/v1/departments/{id}
pub async fn get_by_id(
    RequireOrgRead(_user): RequireOrgRead,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Department>>> {
    let department = DepartmentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Department", id))?;
    Ok(Json(DataResponse { data: department }))
}

/// PUT /api/v1/departments/{id}
pub async fn update(
    RequireOrgWrite(_user): RequireOrgWrite,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateDepartment>,
) -> AppResult<Json<DataResponse<Department>>> {
    if let Some(name) = input.name.as_mut() {
        *name = name.trim().to_string();
        validate_name("Name", name).map_err(AppError::validation)?;
    }
    if let Some(area_id) = input.area_id {
        ensure_area(&state, area_id).await?;
    }
    ensure_head(&state, input.head_user_id).await?;

    let department = DepartmentRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::not_found("Department", id))?;
    Ok(Json(DataResponse { data: department }))
}

/// DELETE /api/v1/departments/{id}
pub async fn delete(
    RequireOrgWrite(_user): RequireOrgWrite,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let services = DepartmentRepo::count_services(&state.pool, id).await?;
    if services > 0 {
        return Err(AppError::conflict(format!(
            "Department still has {services} service(s)"
        )));
    }
    if DepartmentRepo::soft_delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Department", id))
    }
}

/// GET /api/v1/departments/{id}/services
pub async fn list_services(
    RequireOrgRead(_user): RequireOrgRead,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<PageResponse<Service>>> {
    if DepartmentRepo::find_by_id(&state.pool, id).await?.is_none() {
        return Err(AppError::not_found("Department", id));
    }
    let (limit, offset) = page.resolve();
    let filter = ServiceFilter {
        department_id: Some(id),
        is_active: None,
    };
    let services = ServiceRepo::list(&state.pool, &filter, limit, offset).await?;
    let total = ServiceRepo::count(&state.pool, &filter).await?;
    Ok(Json(PageResponse::new(services, limit, offset).with_total(total)))
}
