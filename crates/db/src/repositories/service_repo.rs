//! Repository for the `services` table.

use medialab_core::types::DbId;
use sqlx::PgPool;

use crate::models::service::{CreateService, Service, ServiceFilter, UpdateService};

const COLUMNS: &str = "id, department_id, name, description, is_active, created_at, updated_at";

/// WHERE clause shared by [`ServiceRepo::list`] and [`ServiceRepo::count`].
const LIST_FILTER: &str = "\
    deleted_at IS NULL \
    AND ($1::BIGINT IS NULL OR department_id = $1) \
    AND ($2::BOOLEAN IS NULL OR is_active = $2)";

/// Provides CRUD operations for services.
pub struct ServiceRepo;

impl ServiceRepo {
    pub async fn create(pool: &PgPool, input: &CreateService) -> Result<Service, sqlx::Error> {
        let query = format!(
            "INSERT INTO services (department_id, name, description, is_active)
             VALUES ($1, $2, $3, COALESCE($4, true))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Service>(&query)
            .bind(input.department_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Service>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM services WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Service>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        filter: &ServiceFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Service>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM services WHERE {LIST_FILTER}
             ORDER BY name LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Service>(&query)
            .bind(filter.department_id)
            .bind(filter.is_active)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool, filter: &ServiceFilter) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM services WHERE {LIST_FILTER}");
        sqlx::query_scalar(&query)
            .bind(filter.department_id)
            .bind(filter.is_active)
            .fetch_one(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateService,
    ) -> Result<Option<Service>, sqlx::Error> {
        let query = format!(
            "UPDATE services SET
                department_id = COALESCE($2, department_id),
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                is_active = COALESCE($5, is_active)
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Service>(&query)
            .bind(id)
            .bind(input.department_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE services SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
