//! Route definitions for `/projects` and the flat `/tasks` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{projects, tasks};
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /             -> list
/// POST   /             -> create
/// GET    /{id}         -> get_by_id
/// PUT    /{id}         -> update
/// DELETE /{id}         -> delete
/// GET    /{id}/tasks   -> list_tasks (?status)
/// POST   /{id}/tasks   -> create_task
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(projects::list).post(projects::create))
        .route(
            "/{id}",
            get(projects::get_by_id)
                .put(projects::update)
                .delete(projects::delete),
        )
        .route(
            "/{id}/tasks",
            get(projects::list_tasks).post(projects::create_task),
        )
}

/// Routes mounted at `/tasks`.
///
/// ```text
/// GET    /{id}          -> get_by_id
/// PUT    /{id}          -> update
/// DELETE /{id}          -> delete
/// POST   /{id}/status   -> change_status
/// ```
pub fn tasks_router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            get(tasks::get_by_id)
                .put(tasks::update)
                .delete(tasks::delete),
        )
        .route("/{id}/status", post(tasks::change_status))
}
