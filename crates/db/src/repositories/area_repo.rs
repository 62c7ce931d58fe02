//! Repository for the `areas` table.

use medialab_core::types::DbId;
use sqlx::PgPool;

use crate::models::area::{Area, CreateArea, UpdateArea};

const COLUMNS: &str = "id, name, description, created_at, updated_at";

/// Provides CRUD operations for areas.
pub struct AreaRepo;

impl AreaRepo {
    pub async fn create(pool: &PgPool, input: &CreateArea) -> Result<Area, sqlx::Error> {
        let query = format!(
            "INSERT INTO areas (name, description) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Area>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_one(pool)
            .await
    }

    /// Find an area by ID. Excludes soft-deleted rows.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Area>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM areas WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Area>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List live areas alphabetically.
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Area>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM areas WHERE deleted_at IS NULL
             ORDER BY name LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, Area>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM areas WHERE deleted_at IS NULL")
            .fetch_one(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateArea,
    ) -> Result<Option<Area>, sqlx::Error> {
        let query = format!(
            "UPDATE areas SET
                name = COALESCE($2, name),
                description = COALESCE($3, description)
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Area>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_optional(pool)
            .await
    }

    /// Number of live departments under an area.
    pub async fn count_departments(pool: &PgPool, id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM departments WHERE area_id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_one(pool)
        .await
    }

    /// Soft-delete an area. Returns `true` if a row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE areas SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
