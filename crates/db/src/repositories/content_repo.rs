//! Repository for the `contents` table.

use medialab_core::content::{STATUS_ARCHIVED, STATUS_PUBLISHED};
use medialab_core::types::DbId;
use sqlx::PgPool;

use crate::models::content::{Content, ContentFilter, CreateContent, UpdateContent};

const COLUMNS: &str = "id, title, slug, body, kind, status, author_id, area_id, published_at, \
                       created_at, updated_at";

/// WHERE clause shared by [`ContentRepo::list`] and [`ContentRepo::count`].
const LIST_FILTER: &str = "\
    deleted_at IS NULL \
    AND ($1::TEXT IS NULL OR status = $1) \
    AND ($2::TEXT IS NULL OR kind = $2) \
    AND ($3::BIGINT IS NULL OR area_id = $3) \
    AND ($4::BIGINT IS NULL OR author_id = $4)";

/// Provides CRUD and publishing operations for content entries.
pub struct ContentRepo;

impl ContentRepo {
    /// Insert a new entry in `draft` status.
    pub async fn create(pool: &PgPool, input: &CreateContent) -> Result<Content, sqlx::Error> {
        let query = format!(
            "INSERT INTO contents (title, slug, body, kind, author_id, area_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Content>(&query)
            .bind(&input.title)
            .bind(&input.slug)
            .bind(&input.body)
            .bind(&input.kind)
            .bind(input.author_id)
            .bind(input.area_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Content>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM contents WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Content>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Content>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM contents WHERE slug = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Content>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// Whether `slug` is taken by any row, including soft-deleted ones.
    pub async fn slug_exists(pool: &PgPool, slug: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM contents WHERE slug = $1)")
            .bind(slug)
            .fetch_one(pool)
            .await
    }

    /// List entries matching `filter`. Published entries sort by publish date.
    pub async fn list(
        pool: &PgPool,
        filter: &ContentFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Content>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM contents WHERE {LIST_FILTER}
             ORDER BY COALESCE(published_at, created_at) DESC, id DESC
             LIMIT $5 OFFSET $6"
        );
        sqlx::query_as::<_, Content>(&query)
            .bind(&filter.status)
            .bind(&filter.kind)
            .bind(filter.area_id)
            .bind(filter.author_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool, filter: &ContentFilter) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM contents WHERE {LIST_FILTER}");
        sqlx::query_scalar(&query)
            .bind(&filter.status)
            .bind(&filter.kind)
            .bind(filter.area_id)
            .bind(filter.author_id)
            .fetch_one(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateContent,
    ) -> Result<Option<Content>, sqlx::Error> {
        let query = format!(
            "UPDATE contents SET
                title = COALESCE($2, title),
                slug = COALESCE($3, slug),
                body = COALESCE($4, body),
                kind = COALESCE($5, kind),
                area_id = COALESCE($6, area_id)
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Content>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.slug)
            .bind(&input.body)
            .bind(&input.kind)
            .bind(input.area_id)
            .fetch_optional(pool)
            .await
    }

    /// Publish an entry. The first publish date is kept on re-publish.
    pub async fn publish(pool: &PgPool, id: DbId) -> Result<Option<Content>, sqlx::Error> {
        let query = format!(
            "UPDATE contents SET
                status = '{STATUS_PUBLISHED}',
                published_at = COALESCE(published_at, NOW())
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Content>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn archive(pool: &PgPool, id: DbId) -> Result<Option<Content>, sqlx::Error> {
        let query = format!(
            "UPDATE contents SET status = '{STATUS_ARCHIVED}'
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Content>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE contents SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
