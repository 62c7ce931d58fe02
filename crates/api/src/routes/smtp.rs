use axum::routing::{get, post};
use axum::Router;

use crate::handlers::smtp;
use crate::state::AppState;

/// Routes mounted at `/smtp`.
///
/// ```text
/// GET    /               -> list
/// POST   /               -> create
/// POST   /test           -> send_test
/// GET    /{id}           -> get_by_id
/// PUT    /{id}           -> update
/// DELETE /{id}           -> delete
/// POST   /{id}/activate  -> activate
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(smtp::list).post(smtp::create))
        .route("/test", post(smtp::send_test))
        .route(
            "/{id}",
            get(smtp::get_by_id)
                .put(smtp::update)
                .delete(smtp::delete),
        )
        .route("/{id}/activate", post(smtp::activate))
}
