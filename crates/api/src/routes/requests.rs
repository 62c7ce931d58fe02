//! Route definitions for service `/requests`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::requests;
use crate::state::AppState;

/// Routes mounted at `/requests`.
///
/// ```text
/// GET    /              -> list
/// POST   /              -> create
/// GET    /{id}          -> get_by_id
/// PUT    /{id}          -> update
/// DELETE /{id}          -> delete
/// POST   /{id}/status   -> change_status
/// POST   /{id}/assign   -> assign
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(requests::list).post(requests::create))
        .route(
            "/{id}",
            get(requests::get_by_id)
                .put(requests::update)
                .delete(requests::delete),
        )
        .route("/{id}/status", post(requests::change_status))
        .route("/{id}/assign", post(requests::assign))
}
