//! Handlers for videos and photos attached to content entries.
//!
//! Listing follows the visibility of the parent entry; changes need
//! `content.write`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use medialab_core::content::detect_video_provider;
use medialab_core::types::DbId;
use medialab_core::validation::validate_http_url;
use medialab_db::models::media::{CreatePhoto, CreateVideo, Photo, UpdatePhoto, UpdateVideo, Video};
use medialab_db::repositories::{PhotoRepo, VideoRepo};
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::content::{load, visible};
use crate::middleware::auth::MaybeAuthUser;
use crate::middleware::rbac::RequireContentWrite;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::validation;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateVideoBody {
    #[validate(custom(function = "validation::title"), length(max = 200))]
    pub title: String,
    #[validate(custom(function = "validation::http_url"))]
    pub url: String,
    #[validate(range(min = 0))]
    pub duration_secs: Option<i32>,
    #[validate(custom(function = "validation::http_url"))]
    pub thumbnail_url: Option<String>,
    pub sort_order: Option<i32>,
}

fn check_url(url: &str) -> AppResult<()> {
    validate_http_url(url).map_err(AppError::validation)
}

// ---------------------------------------------------------------------------
// Videos
// ---------------------------------------------------------------------------

/// GET /api/v1/content/{id}/videos
pub async fn list_videos(
    MaybeAuthUser(user): MaybeAuthUser,
    State(state): State<AppState>,
    Path(content_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Video>>>> {
    visible(load(&state.pool, content_id).await?, user.as_ref())?;
    let videos = VideoRepo::list_by_content(&state.pool, content_id).await?;
    Ok(Json(DataResponse { data: videos }))
}

/// POST /api/v1/content/{id}/videos
///
/// The provider (`youtube`, `vimeo`, `other`) is detected from the URL.
pub async fn create_video(
    RequireContentWrite(_user): RequireContentWrite,
    State(state): State<AppState>,
    Path(content_id): Path<DbId>,
    Json(input): Json<CreateVideoBody>,
) -> AppResult<(StatusCode, Json<DataResponse<Video>>)> {
    input.validate()?;
    load(&state.pool, content_id).await?;

    let video = VideoRepo::create(
        &state.pool,
        &CreateVideo {
            content_id,
            title: input.title.trim().to_string(),
            provider: detect_video_provider(&input.url).to_string(),
            url: input.url,
            duration_secs: input.duration_secs,
            thumbnail_url: input.thumbnail_url,
            sort_order: input.sort_order,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: video })))
}

/// PUT /api/v1/videos/{id}
pub async fn update_video(
    RequireContentWrite(_user): RequireContentWrite,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateVideo>,
) -> AppResult<Json<DataResponse<Video>>> {
    if let Some(url) = input.url.as_deref() {
        check_url(url)?;
        input.provider = Some(detect_video_provider(url).to_string());
    }
    if let Some(url) = input.thumbnail_url.as_deref() {
        check_url(url)?;
    }
    if input.duration_secs.is_some_and(|d| d < 0) {
        return Err(AppError::validation("duration_secs must not be negative"));
    }

    let video = VideoRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::not_found("Video", id))?;
    Ok(Json(DataResponse { data: video }))
}

/// DELETE /api/v1/videos/{id}
pub async fn delete_video(
    RequireContentWrite(_user): RequireContentWrite,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if VideoRepo::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Video", id))
    }
}

// ---------------------------------------------------------------------------
// Photos
// ---------------------------------------------------------------------------

/// GET /api/v1/content/{id}/photos
pub async fn list_photos(
    MaybeAuthUser(user): MaybeAuthUser,
    State(state): State<AppState>,
    Path(content_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Photo>>>> {
    visible(load(&state.pool, content_id).await?, user.as_ref())?;
    let photos = PhotoRepo::list_by_content(&state.pool, content_id).await?;
    Ok(Json(DataResponse { data: photos }))
}

/// POST /api/v1/content/{id}/photos
pub async fn create_photo(
    RequireContentWrite(_user): RequireContentWrite,
    State(state): State<AppState>,
    Path(content_id): Path<DbId>,
    Json(mut input): Json<CreatePhoto>,
) -> AppResult<(StatusCode, Json<DataResponse<Photo>>)> {
    check_url(&input.url)?;
    load(&state.pool, content_id).await?;

    input.content_id = content_id;
    let photo = PhotoRepo::create(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: photo })))
}

/// PUT /api/v1/photos/{id}
pub async fn update_photo(
    RequireContentWrite(_user): RequireContentWrite,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdatePhoto>,
) -> AppResult<Json<DataResponse<Photo>>> {
    if let Some(url) = input.url.as_deref() {
        check_url(url)?;
    }
    let photo = PhotoRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::not_found("Photo", id))?;
    Ok(Json(DataResponse { data: photo }))
}

/// DELETE /api/v1/photos/{id}
pub async fn delete_photo(
    RequireContentWrite(_user): RequireContentWrite,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if PhotoRepo::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Photo", id))
    }
}
