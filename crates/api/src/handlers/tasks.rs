//! Handlers for individual tasks at `/tasks/{id}`.
//!
//! Listing and creation live under `/projects/{id}/tasks`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use medialab_core::permissions;
use medialab_core::project::project_accepts_changes;
use medialab_core::types::DbId;
use medialab_db::models::project::Project;
use medialab_db::models::task::{Task, UpdateTask};
use medialab_db::repositories::TaskRepo;
use medialab_events::{event_types, PlatformEvent};
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::projects::{ensure_user, load_project};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireProjectsRead, RequireProjectsWrite};
use crate::response::DataResponse;
use crate::state::AppState;
use crate::validation;

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskBody {
    pub assignee_id: Option<DbId>,
    #[validate(custom(function = "validation::title"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TaskStatusBody {
    #[validate(custom(function = "validation::task_status"))]
    pub status: String,
}

pub(crate) fn publish_task_assigned(state: &AppState, task: &Task, project: &Project, actor: DbId) {
    let Some(assignee_id) = task.assignee_id else {
        return;
    };
    state.event_bus.publish(
        PlatformEvent::new(event_types::TASK_ASSIGNED)
            .with_source("task", task.id)
            .with_actor(actor)
            .with_payload(serde_json::json!({
                "title": task.title,
                "assignee_id": assignee_id,
                "project_id": project.id,
                "project_name": project.name,
            })),
    );
}

async fn load_task(state: &AppState, id: DbId) -> AppResult<Task> {
    TaskRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Task", id))
}

/// Load the task's project and refuse changes to archived projects.
async fn writable_project(state: &AppState, task: &Task) -> AppResult<Project> {
    let project = load_project(state, task.project_id).await?;
    if !project_accepts_changes(&project.status) {
        return Err(AppError::BadRequest(format!(
            "Project '{}' is archived",
            project.name
        )));
    }
    Ok(project)
}

/// GET /api/v1/tasks/{id}
pub async fn get_by_id(
    RequireProjectsRead(_user): RequireProjectsRead,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Task>>> {
    let task = load_task(&state, id).await?;
    Ok(Json(DataResponse { data: task }))
}

/// PUT /api/v1/tasks/{id}
pub async fn update(
    RequireProjectsWrite(user): RequireProjectsWrite,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateTaskBody>,
) -> AppResult<Json<DataResponse<Task>>> {
    input.validate()?;
    let existing = load_task(&state, id).await?;
    let project = writable_project(&state, &existing).await?;
    ensure_user(&state, input.assignee_id).await?;

    let changes = UpdateTask {
        assignee_id: input.assignee_id,
        title: input.title.map(|title| title.trim().to_string()),
        description: input.description,
        due_date: input.due_date,
    };
    let task = TaskRepo::update(&state.pool, id, &changes)
        .await?
        .ok_or(AppError::not_found("Task", id))?;
    if task.assignee_id != existing.assignee_id {
        publish_task_assigned(&state, &task, &project, user.user_id);
    }
    Ok(Json(DataResponse { data: task }))
}

/// DELETE /api/v1/tasks/{id}
pub async fn delete(
    RequireProjectsWrite(_user): RequireProjectsWrite,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let task = load_task(&state, id).await?;
    writable_project(&state, &task).await?;
    if TaskRepo::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Task", id))
    }
}

/// POST /api/v1/tasks/{id}/status
///
/// Allowed with `projects.write` or for the task's assignee.
pub async fn change_status(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<TaskStatusBody>,
) -> AppResult<Json<DataResponse<Task>>> {
    input.validate()?;
    let existing = load_task(&state, id).await?;
    if existing.assignee_id != Some(user.user_id) {
        user.require(permissions::PROJECTS_WRITE)?;
    }
    writable_project(&state, &existing).await?;

    let task = TaskRepo::set_status(&state.pool, id, &input.status)
        .await?
        .ok_or(AppError::not_found("Task", id))?;
    Ok(Json(DataResponse { data: task }))
}
