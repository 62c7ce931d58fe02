//! Repositories for `roles`, `permissions` and `role_permissions`.

use medialab_core::types::DbId;
use sqlx::PgPool;

use crate::models::role::{CreateRole, Permission, Role, UpdateRole};

const COLUMNS: &str = "id, name, description, created_at, updated_at";

const PERMISSION_COLUMNS: &str = "id, code, description, created_at";

// ---------------------------------------------------------------------------
// RoleRepo
// ---------------------------------------------------------------------------

/// Provides CRUD operations for roles and their permission grants.
pub struct RoleRepo;

impl RoleRepo {
    pub async fn create(pool: &PgPool, input: &CreateRole) -> Result<Role, sqlx::Error> {
        let query = format!(
            "INSERT INTO roles (name, description) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Role>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Role>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM roles WHERE id = $1");
        sqlx::query_as::<_, Role>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Role>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM roles WHERE name = $1");
        sqlx::query_as::<_, Role>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// List all roles ordered by id (seeded roles first).
    pub async fn list(pool: &PgPool) -> Result<Vec<Role>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM roles ORDER BY id");
        sqlx::query_as::<_, Role>(&query).fetch_all(pool).await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateRole,
    ) -> Result<Option<Role>, sqlx::Error> {
        let query = format!(
            "UPDATE roles SET
                name = COALESCE($2, name),
                description = COALESCE($3, description)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Role>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_optional(pool)
            .await
    }

    /// Delete a role. Fails with a foreign-key violation while users still hold it.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Permission codes granted to a role, sorted.
    pub async fn permission_codes(
        pool: &PgPool,
        role_id: DbId,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT p.code FROM role_permissions rp
             JOIN permissions p ON p.id = rp.permission_id
             WHERE rp.role_id = $1
             ORDER BY p.code",
        )
        .bind(role_id)
        .fetch_all(pool)
        .await
    }

    /// Permission codes granted to the role with the given name.
    pub async fn permission_codes_by_name(
        pool: &PgPool,
        role_name: &str,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT p.code FROM role_permissions rp
             JOIN permissions p ON p.id = rp.permission_id
             JOIN roles r ON r.id = rp.role_id
             WHERE r.name = $1
             ORDER BY p.code",
        )
        .bind(role_name)
        .fetch_all(pool)
        .await
    }

    /// Replace a role's grants with exactly `codes`. Unknown codes are ignored
    /// by the join; callers validate them first.
    pub async fn set_permissions(
        pool: &PgPool,
        role_id: DbId,
        codes: &[String],
    ) -> Result<Vec<String>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(role_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "INSERT INTO role_permissions (role_id, permission_id)
             SELECT $1, id FROM permissions WHERE code = ANY($2)",
        )
        .bind(role_id)
        .bind(codes)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Self::permission_codes(pool, role_id).await
    }
}

// ---------------------------------------------------------------------------
// PermissionRepo
// ---------------------------------------------------------------------------

/// Read access to the seeded permission catalogue.
pub struct PermissionRepo;

impl PermissionRepo {
    pub async fn list(pool: &PgPool) -> Result<Vec<Permission>, sqlx::Error> {
        let query = format!("SELECT {PERMISSION_COLUMNS} FROM permissions ORDER BY code");
        sqlx::query_as::<_, Permission>(&query).fetch_all(pool).await
    }

    pub async fn find_by_code(
        pool: &PgPool,
        code: &str,
    ) -> Result<Option<Permission>, sqlx::Error> {
        let query = format!("SELECT {PERMISSION_COLUMNS} FROM permissions WHERE code = $1");
        sqlx::query_as::<_, Permission>(&query)
            .bind(code)
            .fetch_optional(pool)
            .await
    }

    /// Insert a code that is not yet in the catalogue (e.g. a `resource.*`
    /// wildcard). Existing codes are left untouched.
    pub async fn ensure(pool: &PgPool, code: &str) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO permissions (code) VALUES ($1) ON CONFLICT (code) DO NOTHING")
            .bind(code)
            .execute(pool)
            .await?;
        Ok(())
    }
}
