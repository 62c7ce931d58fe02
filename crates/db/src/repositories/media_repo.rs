//! Repositories for the `videos` and `photos` tables.

use medialab_core::types::DbId;
use sqlx::PgPool;

use crate::models::media::{CreatePhoto, CreateVideo, Photo, UpdatePhoto, UpdateVideo, Video};

// ---------------------------------------------------------------------------
// Column lists
// ---------------------------------------------------------------------------

const VIDEO_COLUMNS: &str = "id, content_id, title, url, provider, duration_secs, thumbnail_url, \
                             sort_order, created_at, updated_at";

const PHOTO_COLUMNS: &str = "id, content_id, url, caption, sort_order, created_at, updated_at";

// ---------------------------------------------------------------------------
// VideoRepo
// ---------------------------------------------------------------------------

pub struct VideoRepo;

impl VideoRepo {
    /// Insert a video. Without an explicit `sort_order` it is appended last.
    pub async fn create(pool: &PgPool, input: &CreateVideo) -> Result<Video, sqlx::Error> {
        let query = format!(
            "INSERT INTO videos (content_id, title, url, provider, duration_secs, thumbnail_url, sort_order)
             VALUES ($1, $2, $3, $4, $5, $6,
                     COALESCE($7, (SELECT COALESCE(MAX(sort_order) + 1, 0) FROM videos WHERE content_id = $1)))
             RETURNING {VIDEO_COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(input.content_id)
            .bind(&input.title)
            .bind(&input.url)
            .bind(&input.provider)
            .bind(input.duration_secs)
            .bind(&input.thumbnail_url)
            .bind(input.sort_order)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Video>, sqlx::Error> {
        let query = format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1");
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_content(
        pool: &PgPool,
        content_id: DbId,
    ) -> Result<Vec<Video>, sqlx::Error> {
        let query = format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE content_id = $1 ORDER BY sort_order, id"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(content_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateVideo,
    ) -> Result<Option<Video>, sqlx::Error> {
        let query = format!(
            "UPDATE videos SET
                title = COALESCE($2, title),
                url = COALESCE($3, url),
                provider = COALESCE($4, provider),
                duration_secs = COALESCE($5, duration_secs),
                thumbnail_url = COALESCE($6, thumbnail_url),
                sort_order = COALESCE($7, sort_order)
             WHERE id = $1
             RETURNING {VIDEO_COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.url)
            .bind(&input.provider)
            .bind(input.duration_secs)
            .bind(&input.thumbnail_url)
            .bind(input.sort_order)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ---------------------------------------------------------------------------
// PhotoRepo
// ---------------------------------------------------------------------------

pub struct PhotoRepo;

impl PhotoRepo {
    /// Insert a photo. Without an explicit `sort_order` it is appended last.
    pub async fn create(pool: &PgPool, input: &CreatePhoto) -> Result<Photo, sqlx::Error> {
        let query = format!(
            "INSERT INTO photos (content_id, url, caption, sort_order)
             VALUES ($1, $2, $3,
                     COALESCE($4, (SELECT COALESCE(MAX(sort_order) + 1, 0) FROM photos WHERE content_id = $1)))
             RETURNING {PHOTO_COLUMNS}"
        );
        sqlx::query_as::<_, Photo>(&query)
            .bind(input.content_id)
            .bind(&input.url)
            .bind(&input.caption)
            .bind(input.sort_order)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Photo>, sqlx::Error> {
        let query = format!("SELECT {PHOTO_COLUMNS} FROM photos WHERE id = $1");
        sqlx::query_as::<_, Photo>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_content(
        pool: &PgPool,
        content_id: DbId,
    ) -> Result<Vec<Photo>, sqlx::Error> {
        let query = format!(
            "SELECT {PHOTO_COLUMNS} FROM photos WHERE content_id = $1 ORDER BY sort_order, id"
        );
        sqlx::query_as::<_, Photo>(&query)
            .bind(content_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdatePhoto,
    ) -> Result<Option<Photo>, sqlx::Error> {
        let query = format!(
            "UPDATE photos SET
                url = COALESCE($2, url),
                caption = COALESCE($3, caption),
                sort_order = COALESCE($4, sort_order)
             WHERE id = $1
             RETURNING {PHOTO_COLUMNS}"
        );
        sqlx::query_as::<_, Photo>(&query)
            .bind(id)
            .bind(&input.url)
            .bind(&input.caption)
            .bind(input.sort_order)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM photos WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
