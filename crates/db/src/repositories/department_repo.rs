//! Repository for the `departments` table.

use medialab_core::types::DbId;
use sqlx::PgPool;

use crate::models::department::{CreateDepartment, Department, UpdateDepartment};

const COLUMNS: &str = "id, area_id, name, description, head_user_id, created_at, updated_at";

/// Provides CRUD operations for departments.
pub struct DepartmentRepo;

impl DepartmentRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateDepartment,
    ) -> Result<Department, sqlx::Error> {
        let query = format!(
            "INSERT INTO departments (area_id, name, description, head_user_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Department>(&query)
            .bind(input.area_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.head_user_id)
            .fetch_one(pool)
            .await
    }

    /// Find a department by ID. Excludes soft-deleted rows.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Department>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM departments WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Department>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List live departments, optionally restricted to one area.
    pub async fn list(
        pool: &PgPool,
        area_id: Option<DbId>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Department>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM departments
             WHERE deleted_at IS NULL AND ($1::BIGINT IS NULL OR area_id = $1)
             ORDER BY name LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Department>(&query)
            .bind(area_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count departments matching the same filter as [`DepartmentRepo::list`].
    pub async fn count(pool: &PgPool, area_id: Option<DbId>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM departments
             WHERE deleted_at IS NULL AND ($1::BIGINT IS NULL OR area_id = $1)",
        )
        .bind(area_id)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateDepartment,
    ) -> Result<Option<Department>, sqlx::Error> {
        let query = format!(
            "UPDATE departments SET
                area_id = COALESCE($2, area_id),
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                head_user_id = COALESCE($5, head_user_id)
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Department>(&query)
            .bind(id)
            .bind(input.area_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.head_user_id)
            .fetch_optional(pool)
            .await
    }

    /// Number of live services offered by a department.
    pub async fn count_services(pool: &PgPool, id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM services WHERE department_id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_one(pool)
        .await
    }

    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE departments SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
