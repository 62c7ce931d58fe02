//! Route definitions for the organisation tree: areas, departments, services.

use axum::routing::get;
use axum::Router;

use crate::handlers::{areas, departments, services};
use crate::state::AppState;

/// Routes mounted at `/areas`.
///
/// ```text
/// GET    /                  -> list
/// POST   /                  -> create
/// GET    /{id}              -> get_by_id
/// PUT    /{id}              -> update
/// DELETE /{id}              -> delete
/// GET    /{id}/departments  -> list_departments
/// ```
pub fn areas_router() -> Router<AppState> {
    Router::new()
        .route("/", get(areas::list).post(areas::create))
        .route(
            "/{id}",
            get(areas::get_by_id)
                .put(areas::update)
                .delete(areas::delete),
        )
        .route("/{id}/departments", get(areas::list_departments))
}

/// Routes mounted at `/departments`.
///
/// ```text
/// GET    /                -> list (?area_id)
/// POST   /                -> create
/// GET    /{id}            -> get_by_id
/// PUT    /{id}            -> update
/// DELETE /{id}            -> delete
/// GET    /{id}/services   -> list_services
/// ```
pub fn departments_router() -> Router<AppState> {
    Router::new()
        .route("/", get(departments::list).post(departments::create))
        .route(
            "/{id}",
            get(departments::get_by_id)
                .put(departments::update)
                .delete(departments::delete),
        )
        .route("/{id}/services", get(departments::list_services))
}

/// Routes mounted at `/services`.
pub fn services_router() -> Router<AppState> {
    Router::new()
        .route("/", get(services::list).post(services::create))
        .route(
            "/{id}",
            get(services::get_by_id)
                .put(services::update)
                .delete(services::delete),
        )
}
