//! Route definitions for `/roles`.

use axum::routing::get;
use axum::Router;

use crate::handlers::roles;
use crate::state::AppState;

/// Routes mounted at `/roles`.
///
/// ```text
/// GET    /                  -> list
/// POST   /                  -> create
/// GET    /{id}              -> get_by_id
/// PUT    /{id}              -> update
/// DELETE /{id}              -> delete
/// GET    /{id}/permissions  -> get_permissions
/// PUT    /{id}/permissions  -> set_permissions
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(roles::list).post(roles::create))
        .route(
            "/{id}",
            get(roles::get_by_id)
                .put(roles::update)
                .delete(roles::delete),
        )
        .route(
            "/{id}/permissions",
            get(roles::get_permissions).put(roles::set_permissions),
        )
}
