//! Route definitions for `/content` and its media.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{content, media};
use crate::state::AppState;

/// Routes mounted at `/content`.
///
/// ```text
/// GET    /               -> list (published only for readers)
/// POST   /               -> create
/// GET    /slug/{slug}    -> get_by_slug
/// GET    /{id}           -> get_by_id
/// PUT    /{id}           -> update
/// DELETE /{id}           -> delete
/// POST   /{id}/publish   -> publish
/// POST   /{id}/archive   -> archive
/// GET    /{id}/videos    -> list_videos
/// POST   /{id}/videos    -> create_video
/// GET    /{id}/photos    -> list_photos
/// POST   /{id}/photos    -> create_photo
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(content::list).post(content::create))
        .route("/slug/{slug}", get(content::get_by_slug))
        .route(
            "/{id}",
            get(content::get_by_id)
                .put(content::update)
                .delete(content::delete),
        )
        .route("/{id}/publish", post(content::publish))
        .route("/{id}/archive", post(content::archive))
        .route(
            "/{id}/videos",
            get(media::list_videos).post(media::create_video),
        )
        .route(
            "/{id}/photos",
            get(media::list_photos).post(media::create_photo),
        )
}

/// Routes mounted at `/videos`.
pub fn videos_router() -> Router<AppState> {
    Router::new().route(
        "/{id}",
        put(media::update_video).delete(media::delete_video),
    )
}

/// Routes mounted at `/photos`.
pub fn photos_router() -> Router<AppState> {
    Router::new().route(
        "/{id}",
        put(media::update_photo).delete(media::delete_photo),
    )
}
