//! Handlers for the `/requests` resource (service requests).
//!
//! Any authenticated user may raise a request and see their own. Seeing
//! everyone's requires `requests.read`; triage (status, assignment,
//! deletion) requires `requests.manage`. A requester may still edit a
//! pending request and cancel it.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use medialab_core::permissions;
use medialab_core::service_request::{validate_transition, RequestPriority, RequestStatus};
use medialab_core::types::DbId;
use medialab_db::models::service_request::{
    CreateServiceRequest, ServiceRequest, ServiceRequestFilter, UpdateServiceRequest,
};
use medialab_db::repositories::{ServiceRepo, ServiceRequestRepo, UserRepo};
use medialab_events::{event_types, PlatformEvent};
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireRequestsManage;
use crate::query::PaginationParams;
use crate::response::{DataResponse, PageResponse};
use crate::state::AppState;
use crate::validation;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRequestBody {
    pub service_id: DbId,
    #[validate(custom(function = "validation::title"), length(max = 200))]
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRequestBody {
    #[validate(custom(function = "validation::title"), length(max = 200))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct StatusChangeBody {
    pub status: String,
    /// Stored as the resolution note when present.
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssignBody {
    /// `null` clears the assignment.
    pub assignee_id: Option<DbId>,
}

fn parse_priority(value: &str) -> AppResult<RequestPriority> {
    value.parse().map_err(AppError::validation)
}

fn parse_status(value: &str) -> AppResult<RequestStatus> {
    value.parse().map_err(AppError::validation)
}

async fn load(state: &AppState, id: DbId) -> AppResult<ServiceRequest> {
    ServiceRequestRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("ServiceRequest", id))
}

fn can_read(user: &AuthUser, request: &ServiceRequest) -> bool {
    request.requester_id == user.user_id
        || request.assignee_id == Some(user.user_id)
        || user.has_permission(permissions::REQUESTS_READ)
}

/// POST /api/v1/requests
pub async fn create(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateRequestBody>,
) -> AppResult<(StatusCode, Json<DataResponse<ServiceRequest>>)> {
    input.validate()?;
    let priority = match input.priority.as_deref() {
        Some(p) => parse_priority(p)?,
        None => RequestPriority::default(),
    };

    let service = ServiceRepo::find_by_id(&state.pool, input.service_id)
        .await?
        .ok_or_else(|| {
            AppError::BadRequest(format!("Service {} does not exist", input.service_id))
        })?;
    if !service.is_active {
        return Err(AppError::BadRequest(format!(
            "Service '{}' is not accepting requests",
            service.name
        )));
    }

    let request = ServiceRequestRepo::create(
        &state.pool,
        &CreateServiceRequest {
            service_id: service.id,
            requester_id: user.user_id,
            title: input.title.trim().to_string(),
            description: input.description,
            priority: priority.as_str().to_string(),
            due_date: input.due_date,
        },
    )
    .await?;

    state.event_bus.publish(
        PlatformEvent::new(event_types::REQUEST_CREATED)
            .with_source("service_request", request.id)
            .with_actor(user.user_id)
            .with_payload(serde_json::json!({
                "title": request.title,
                "service_id": request.service_id,
                "department_id": service.department_id,
                "priority": request.priority,
            })),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: request })))
}

/// GET /api/v1/requests
///
/// Without `requests.read` the list is restricted to requests the caller
/// raised or is assigned to, on top of any other filter.
pub async fn list(
    user: AuthUser,
    State(state): State<AppState>,
    Query(mut filter): Query<ServiceRequestFilter>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<PageResponse<ServiceRequest>>> {
    if let Some(status) = filter.status.as_deref() {
        parse_status(status)?;
    }
    if let Some(priority) = filter.priority.as_deref() {
        parse_priority(priority)?;
    }
    if !user.has_permission(permissions::REQUESTS_READ) {
        filter.participant_id = Some(user.user_id);
    }

    let (limit, offset) = page.resolve();
    let requests = ServiceRequestRepo::list(&state.pool, &filter, limit, offset).await?;
    let total = ServiceRequestRepo::count(&state.pool, &filter).await?;
    Ok(Json(PageResponse::new(requests, limit, offset).with_total(total)))
}

/// GET /api/v1/requests/{id}
pub async fn get_by_id(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ServiceRequest>>> {
    let request = load(&state, id).await?;
    if !can_read(&user, &request) {
        return Err(AppError::forbidden("You cannot view this request"));
    }
    Ok(Json(DataResponse { data: request }))
}

/// PUT /api/v1/requests/{id}
pub async fn update(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateRequestBody>,
) -> AppResult<Json<DataResponse<ServiceRequest>>> {
    input.validate()?;
    let existing = load(&state, id).await?;

    let is_manager = user.has_permission(permissions::REQUESTS_MANAGE);
    let own_pending =
        existing.requester_id == user.user_id && existing.status == RequestStatus::Pending.as_str();
    if !is_manager && !own_pending {
        return Err(AppError::forbidden(
            "Only managers can edit a request once it leaves pending",
        ));
    }

    let priority = match input.priority.as_deref() {
        Some(p) => Some(parse_priority(p)?.as_str().to_string()),
        None => None,
    };
    let patch = UpdateServiceRequest {
        title: input.title.map(|t| t.trim().to_string()),
        description: input.description,
        priority,
        due_date: input.due_date,
    };
    let request = ServiceRequestRepo::update(&state.pool, id, &patch)
        .await?
        .ok_or(AppError::not_found("ServiceRequest", id))?;
    Ok(Json(DataResponse { data: request }))
}

/// DELETE /api/v1/requests/{id}
pub async fn delete(
    RequireRequestsManage(_user): RequireRequestsManage,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if ServiceRequestRepo::soft_delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("ServiceRequest", id))
    }
}

/// POST /api/v1/requests/{id}/status
///
/// Follows the request state machine; an illegal move is a 400. The
/// requester may cancel their own request without `requests.manage`.
pub async fn change_status(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<StatusChangeBody>,
) -> AppResult<Json<DataResponse<ServiceRequest>>> {
    let target = parse_status(&input.status)?;
    let existing = load(&state, id).await?;

    let self_cancel = target == RequestStatus::Cancelled && existing.requester_id == user.user_id;
    if !self_cancel {
        user.require(permissions::REQUESTS_MANAGE)?;
    }

    let current = parse_status(&existing.status)?;
    validate_transition(current, target).map_err(AppError::validation)?;

    let note = input.note.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let request = ServiceRequestRepo::set_status(
        &state.pool,
        id,
        current.as_str(),
        target.as_str(),
        note,
    )
    .await?
    .ok_or_else(|| AppError::conflict("Request status changed concurrently; reload and retry"))?;

    state.event_bus.publish(
        PlatformEvent::new(event_types::REQUEST_STATUS_CHANGED)
            .with_source("service_request", request.id)
            .with_actor(user.user_id)
            .with_payload(serde_json::json!({
                "title": request.title,
                "requester_id": request.requester_id,
                "from": current.as_str(),
                "status": target.as_str(),
                "note": note.unwrap_or_default(),
            })),
    );
    tracing::info!(
        request_id = id,
        from = current.as_str(),
        to = target.as_str(),
        "Request status changed"
    );

    Ok(Json(DataResponse { data: request }))
}

/// POST /api/v1/requests/{id}/assign
pub async fn assign(
    RequireRequestsManage(user): RequireRequestsManage,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<AssignBody>,
) -> AppResult<Json<DataResponse<ServiceRequest>>> {
    if let Some(assignee_id) = input.assignee_id {
        let assignee = UserRepo::find_by_id(&state.pool, assignee_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| {
                AppError::BadRequest(format!("User {assignee_id} is not an active user"))
            })?;
        tracing::debug!(request_id = id, assignee = %assignee.username, "Assigning request");
    }

    let request = ServiceRequestRepo::assign(&state.pool, id, input.assignee_id)
        .await?
        .ok_or(AppError::not_found("ServiceRequest", id))?;

    if let Some(assignee_id) = request.assignee_id {
        state.event_bus.publish(
            PlatformEvent::new(event_types::REQUEST_ASSIGNED)
                .with_source("service_request", request.id)
                .with_actor(user.user_id)
                .with_payload(serde_json::json!({
                    "title": request.title,
                    "assignee_id": assignee_id,
                })),
        );
    }

    Ok(Json(DataResponse { data: request }))
}
