//! Handlers for the `/projects` resource and the tasks nested under it.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use medialab_core::project::{
    project_accepts_changes, validate_date_range, validate_project_status, validate_task_status,
};
use medialab_core::types::DbId;
use medialab_db::models::project::{CreateProject, Project, ProjectFilter, UpdateProject};
use medialab_db::models::task::{CreateTask, Task};
use medialab_db::repositories::{ProjectRepo, ServiceRequestRepo, TaskRepo, UserRepo};
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::tasks::publish_task_assigned;
use crate::middleware::rbac::{RequireProjectsRead, RequireProjectsWrite};
use crate::query::PaginationParams;
use crate::response::{DataResponse, PageResponse};
use crate::state::AppState;
use crate::validation;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectBody {
    #[validate(custom(function = "validation::name"))]
    pub name: String,
    pub description: Option<String>,
    pub request_id: Option<DbId>,
    pub lead_id: Option<DbId>,
    /// Defaults to `planning` if omitted.
    #[validate(custom(function = "validation::project_status"))]
    pub status: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectBody {
    #[validate(custom(function = "validation::name"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub lead_id: Option<DbId>,
    #[validate(custom(function = "validation::project_status"))]
    pub status: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskBody {
    pub assignee_id: Option<DbId>,
    #[validate(custom(function = "validation::title"))]
    pub title: String,
    pub description: Option<String>,
    /// Defaults to `todo` if omitted.
    #[validate(custom(function = "validation::task_status"))]
    pub status: Option<String>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TaskListParams {
    pub status: Option<String>,
}

pub(crate) async fn load_project(state: &AppState, id: DbId) -> AppResult<Project> {
    ProjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Project", id))
}

pub(crate) async fn ensure_user(state: &AppState, user_id: Option<DbId>) -> AppResult<()> {
    let Some(id) = user_id else {
        return Ok(());
    };
    match UserRepo::find_by_id(&state.pool, id).await? {
        Some(user) if user.is_active => Ok(()),
        _ => Err(AppError::BadRequest(format!("User {id} is not an active user"))),
    }
}

/// POST /api/v1/projects
pub async fn create(
    RequireProjectsWrite(_user): RequireProjectsWrite,
    State(state): State<AppState>,
    Json(input): Json<CreateProjectBody>,
) -> AppResult<(StatusCode, Json<DataResponse<Project>>)> {
    input.validate()?;
    validate_date_range(input.start_date, input.end_date).map_err(AppError::validation)?;
    if let Some(request_id) = input.request_id {
        if ServiceRequestRepo::find_by_id(&state.pool, request_id)
            .await?
            .is_none()
        {
            return Err(AppError::BadRequest(format!(
                "Request {request_id} does not exist"
            )));
        }
    }
    ensure_user(&state, input.lead_id).await?;

    let project = ProjectRepo::create(
        &state.pool,
        &CreateProject {
            name: input.name.trim().to_string(),
            description: input.description,
            request_id: input.request_id,
            lead_id: input.lead_id,
            status: input.status,
            start_date: input.start_date,
            end_date: input.end_date,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: project })))
}

/// GET /api/v1/projects
pub async fn list(
    RequireProjectsRead(_user): RequireProjectsRead,
    State(state): State<AppState>,
    Query(filter): Query<ProjectFilter>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<PageResponse<Project>>> {
    if let Some(status) = filter.status.as_deref() {
        validate_project_status(status).map_err(AppError::validation)?;
    }
    let (limit, offset) = page.resolve();
    let projects = ProjectRepo::list(&state.pool, &filter, limit, offset).await?;
    let total = ProjectRepo::count(&state.pool, &filter).await?;
    Ok(Json(PageResponse::new(projects, limit, offset).with_total(total)))
}

/// GET /api/v1/projects/{id}
pub async fn get_by_id(
    RequireProjectsRead(_user): RequireProjectsRead,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = load_project(&state, id).await?;
    Ok(Json(DataResponse { data: project }))
}

/// PUT /api/v1/projects/{id}
///
/// An archived project only accepts a status change (to un-archive it).
pub async fn update(
    RequireProjectsWrite(_user): RequireProjectsWrite,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProjectBody>,
) -> AppResult<Json<DataResponse<Project>>> {
    input.validate()?;
    let existing = load_project(&state, id).await?;

    if !project_accepts_changes(&existing.status) {
        let only_status = input.name.is_none()
            && input.description.is_none()
            && input.lead_id.is_none()
            && input.start_date.is_none()
            && input.end_date.is_none();
        if !only_status || input.status.is_none() {
            return Err(AppError::BadRequest(
                "Archived projects can only have their status changed".into(),
            ));
        }
    }

    validate_date_range(
        input.start_date.or(existing.start_date),
        input.end_date.or(existing.end_date),
    )
    .map_err(AppError::validation)?;
    ensure_user(&state, input.lead_id).await?;

    let changes = UpdateProject {
        name: input.name.map(|name| name.trim().to_string()),
        description: input.description,
        lead_id: input.lead_id,
        status: input.status,
        start_date: input.start_date,
        end_date: input.end_date,
    };
    let project = ProjectRepo::update(&state.pool, id, &changes)
        .await?
        .ok_or(AppError::not_found("Project", id))?;
    Ok(Json(DataResponse { data: project }))
}

/// DELETE /api/v1/projects/{id}
pub async fn delete(
    RequireProjectsWrite(_user): RequireProjectsWrite,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if ProjectRepo::soft_delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Project", id))
    }
}

/// GET /api/v1/projects/{id}/tasks
pub async fn list_tasks(
    RequireProjectsRead(_user): RequireProjectsRead,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<TaskListParams>,
) -> AppResult<Json<DataResponse<Vec<Task>>>> {
    load_project(&state, id).await?;
    if let Some(status) = params.status.as_deref() {
        validate_task_status(status).map_err(AppError::validation)?;
    }
    let tasks = TaskRepo::list_by_project(&state.pool, id, params.status.as_deref()).await?;
    Ok(Json(DataResponse { data: tasks }))
}

/// POST /api/v1/projects/{id}/tasks
pub async fn create_task(
    RequireProjectsWrite(user): RequireProjectsWrite,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CreateTaskBody>,
) -> AppResult<(StatusCode, Json<DataResponse<Task>>)> {
    input.validate()?;
    let project = load_project(&state, id).await?;
    if !project_accepts_changes(&project.status) {
        return Err(AppError::BadRequest(format!(
            "Project '{}' is archived",
            project.name
        )));
    }

    ensure_user(&state, input.assignee_id).await?;

    let task = TaskRepo::create(
        &state.pool,
        &CreateTask {
            project_id: id,
            assignee_id: input.assignee_id,
            title: input.title.trim().to_string(),
            description: input.description,
            status: input.status,
            due_date: input.due_date,
        },
    )
    .await?;
    if task.assignee_id.is_some() {
        publish_task_assigned(&state, &task, &project, user.user_id);
    }
    Ok((StatusCode::CREATED, Json(DataResponse { data: task })))
}
