//! Handlers for the `/services` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use medialab_core::types::DbId;
use medialab_core::validation::validate_name;
use medialab_db::models::service::{CreateService, Service, ServiceFilter, UpdateService};
use medialab_db::repositories::{DepartmentRepo, ServiceRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireOrgRead, RequireOrgWrite};
use crate::query::PaginationParams;
use crate::response::{DataResponse, PageResponse};
use crate::state::AppState;

async fn ensure_department(state: &AppState, department_id: DbId) -> AppResult<()> {
    if DepartmentRepo::find_by_id(&state.pool, department_id)
        .await?
        .is_none()
    {
        return Err(AppError::BadRequest(format!(
            "Department {department_id} does not exist"
        )));
    }
    Ok(())
}

/// POST /api/v1/services
pub async fn create(
    RequireOrgWrite(_user): RequireOrgWrite,
    State(state): State<AppState>,
    Json(mut input): Json<CreateService>,
) -> AppResult<(StatusCode, Json<DataResponse<Service>>)> {
    input.name = input.name.trim().to_string();
    validate_name("Name", &input.name).map_err(AppError::validation)?;
    ensure_department(&state, input.department_id).await?;
    let service = ServiceRepo::create(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: service })))
}

/// GET /api/v1/services
pub async fn list(
    RequireOrgRead(_user): RequireOrgRead,
    State(state): State<AppState>,
    Query(filter): Query<ServiceFilter>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<PageResponse<Service>>> {
    let (limit, offset) = page.resolve();
    let services = ServiceRepo::list(&state.pool, &filter, limit, offset).await?;
    let total = ServiceRepo::count(&state.pool, &filter).await?;
    Ok(Json(PageResponse::new(services, limit, offset).with_total(total)))
}

/// GET /api/v1/services/{id}
pub async fn get_by_id(
    RequireOrgRead(_user): RequireOrgRead,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Service>>> {
    let service = ServiceRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Service", id))?;
    Ok(Json(DataResponse { data: service }))
}

/// PUT /api/v1/services/{id}
pub async fn update(
    RequireOrgWrite(_user): RequireOrgWrite,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateService>,
) -> AppResult<Json<DataResponse<Service>>> {
    if let Some(name) = input.name.as_mut() {
        *name = name.trim().to_string();
        validate_name("Name", name).map_err(AppError::validation)?;
    }
    if let Some(department_id) = input.department_id {
        ensure_department(&state, department_id).await?;
    }
    let service = ServiceRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::not_found("Service", id))?;
    Ok(Json(DataResponse { data: service }))
}

/// DELETE /api/v1/services/{id}
pub async fn delete(
    RequireOrgWrite(_user): RequireOrgWrite,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if ServiceRepo::soft_delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Service", id))
    }
}
