//! Handlers for the `/content` resource.
//!
//! Published entries are public. Drafts and archived entries are only
//! visible to holders of `content.write`; everyone else gets a 404 so their
//! existence is not revealed.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use medialab_core::content::{self, slugify, STATUS_PUBLISHED};
use medialab_core::permissions;
use medialab_core::types::DbId;
use medialab_db::models::content::{Content, ContentFilter, CreateContent, UpdateContent};
use medialab_db::repositories::{AreaRepo, ContentRepo};
use medialab_db::DbPool;
use medialab_events::{event_types, PlatformEvent};
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::middleware::rbac::RequireContentWrite;
use crate::query::PaginationParams;
use crate::response::{DataResponse, PageResponse};
use crate::state::AppState;
use crate::validation;

/// Attempts at finding a free `-N` suffix for a derived slug.
const SLUG_ATTEMPTS: u32 = 50;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateContentBody {
    #[validate(custom(function = "validation::title"), length(max = 200))]
    pub title: String,
    /// Derived from the title when omitted.
    #[validate(custom(function = "validation::slug"))]
    pub slug: Option<String>,
    pub body: Option<String>,
    #[validate(custom(function = "validation::content_kind"))]
    pub kind: String,
    pub area_id: Option<DbId>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateContentBody {
    #[validate(custom(function = "validation::title"), length(max = 200))]
    pub title: Option<String>,
    #[validate(custom(function = "validation::slug"))]
    pub slug: Option<String>,
    pub body: Option<String>,
    #[validate(custom(function = "validation::content_kind"))]
    pub kind: Option<String>,
    pub area_id: Option<DbId>,
}

fn can_manage(user: Option<&AuthUser>) -> bool {
    user.is_some_and(|u| u.has_permission(permissions::CONTENT_WRITE))
}

/// Return `entry` if the caller may see it, else a 404.
pub(crate) fn visible(entry: Content, user: Option<&AuthUser>) -> AppResult<Content> {
    if entry.status == STATUS_PUBLISHED || can_manage(user) {
        Ok(entry)
    } else {
        Err(AppError::not_found("Content", entry.id))
    }
}

pub(crate) async fn load(pool: &DbPool, id: DbId) -> AppResult<Content> {
    ContentRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::not_found("Content", id))
}

/// First free slug among `base`, `base-2`, `base-3`, ...
async fn unique_slug(pool: &DbPool, base: &str) -> AppResult<String> {
    if !ContentRepo::slug_exists(pool, base).await? {
        return Ok(base.to_string());
    }
    for n in 2..=SLUG_ATTEMPTS + 1 {
        let candidate = format!("{base}-{n}");
        if !ContentRepo::slug_exists(pool, &candidate).await? {
            return Ok(candidate);
        }
    }
    Err(AppError::conflict(format!("No free slug derived from '{base}'")))
}

async fn ensure_area(pool: &DbPool, area_id: Option<DbId>) -> AppResult<()> {
    if let Some(id) = area_id {
        if AreaRepo::find_by_id(pool, id).await?.is_none() {
            return Err(AppError::BadRequest(format!("Area {id} does not exist")));
        }
    }
    Ok(())
}

/// GET /api/v1/content
///
/// Anonymous callers and users without `content.write` only see published
/// entries, whatever `status` filter they send.
pub async fn list(
    MaybeAuthUser(user): MaybeAuthUser,
    State(state): State<AppState>,
    Query(mut filter): Query<ContentFilter>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<PageResponse<Content>>> {
    if let Some(status) = filter.status.as_deref() {
        content::validate_status(status).map_err(AppError::validation)?;
    }
    if let Some(kind) = filter.kind.as_deref() {
        content::validate_kind(kind).map_err(AppError::validation)?;
    }
    if !can_manage(user.as_ref()) {
        filter.status = Some(STATUS_PUBLISHED.to_string());
    }

    let (limit, offset) = page.resolve();
    let entries = ContentRepo::list(&state.pool, &filter, limit, offset).await?;
    let total = ContentRepo::count(&state.pool, &filter).await?;
    Ok(Json(PageResponse::new(entries, limit, offset).with_total(total)))
}

/// POST /api/v1/content
pub async fn create(
    RequireContentWrite(user): RequireContentWrite,
    State(state): State<AppState>,
    Json(input): Json<CreateContentBody>,
) -> AppResult<(StatusCode, Json<DataResponse<Content>>)> {
    input.validate()?;
    ensure_area(&state.pool, input.area_id).await?;

    let title = input.title.trim().to_string();
    // An explicit slug must be free (409 from the unique constraint);
    // a derived one gets a numeric suffix instead.
    let slug = match input.slug {
        Some(slug) => slug,
        None => {
            let base = slugify(&title).ok_or_else(|| {
                AppError::validation("Title does not produce a usable slug; provide one")
            })?;
            unique_slug(&state.pool, &base).await?
        }
    };

    let entry = ContentRepo::create(
        &state.pool,
        &CreateContent {
            title,
            slug,
            body: input.body,
            kind: input.kind,
            author_id: Some(user.user_id),
            area_id: input.area_id,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: entry })))
}

/// GET /api/v1/content/{id}
pub async fn get_by_id(
    MaybeAuthUser(user): MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Content>>> {
    let entry = visible(load(&state.pool, id).await?, user.as_ref())?;
    Ok(Json(DataResponse { data: entry }))
}

/// GET /api/v1/content/slug/{slug}
pub async fn get_by_slug(
    MaybeAuthUser(user): MaybeAuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<DataResponse<Content>>> {
    let entry = ContentRepo::find_by_slug(&state.pool, &slug)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;
    let entry = visible(entry, user.as_ref())?;
    Ok(Json(DataResponse { data: entry }))
}

/// PUT /api/v1/content/{id}
pub async fn update(
    RequireContentWrite(_user): RequireContentWrite,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateContentBody>,
) -> AppResult<Json<DataResponse<Content>>> {
    input.validate()?;
    ensure_area(&state.pool, input.area_id).await?;

    let patch = UpdateContent {
        title: input.title.map(|t| t.trim().to_string()),
        slug: input.slug,
        body: input.body,
        kind: input.kind,
        area_id: input.area_id,
    };
    let entry = ContentRepo::update(&state.pool, id, &patch)
        .await?
        .ok_or(AppError::not_found("Content", id))?;
    Ok(Json(DataResponse { data: entry }))
}

/// DELETE /api/v1/content/{id}
pub async fn delete(
    RequireContentWrite(_user): RequireContentWrite,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if ContentRepo::soft_delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Content", id))
    }
}

/// POST /api/v1/content/{id}/publish
///
/// Announces the entry on the `global` room the first time it goes live.
pub async fn publish(
    RequireContentWrite(user): RequireContentWrite,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Content>>> {
    let before = load(&state.pool, id).await?;
    let entry = ContentRepo::publish(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Content", id))?;

    if before.status != STATUS_PUBLISHED {
        state.event_bus.publish(
            PlatformEvent::new(event_types::CONTENT_PUBLISHED)
                .with_source("content", entry.id)
                .with_actor(user.user_id)
                .with_payload(serde_json::json!({
                    "title": entry.title,
                    "slug": entry.slug,
                    "kind": entry.kind,
                })),
        );
    }
    Ok(Json(DataResponse { data: entry }))
}

/// POST /api/v1/content/{id}/archive
pub async fn archive(
    RequireContentWrite(_user): RequireContentWrite,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Content>>> {
    let entry = ContentRepo::archive(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Content", id))?;
    Ok(Json(DataResponse { data: entry }))
}
