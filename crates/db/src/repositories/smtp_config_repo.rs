//! Repository for the `smtp_configs` table.

use medialab_core::types::DbId;
use sqlx::PgPool;

use crate::models::smtp::{CreateSmtpConfig, SmtpConfig, UpdateSmtpConfig};

const COLUMNS: &str = "id, name, host, port, username, password_encrypted, from_address, \
                       from_name, use_starttls, is_active, created_at, updated_at";

/// Provides CRUD operations for SMTP configurations.
pub struct SmtpConfigRepo;

impl SmtpConfigRepo {
    /// Insert a new, inactive configuration.
    pub async fn create(
        pool: &PgPool,
        input: &CreateSmtpConfig,
    ) -> Result<SmtpConfig, sqlx::Error> {
        let query = format!(
            "INSERT INTO smtp_configs
                (name, host, port, username, password_encrypted, from_address, from_name, use_starttls)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SmtpConfig>(&query)
            .bind(&input.name)
            .bind(&input.host)
            .bind(input.port)
            .bind(&input.username)
            .bind(&input.password_encrypted)
            .bind(&input.from_address)
            .bind(&input.from_name)
            .bind(input.use_starttls)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<SmtpConfig>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM smtp_configs WHERE id = $1");
        sqlx::query_as::<_, SmtpConfig>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The configuration currently used for outgoing mail, if any.
    pub async fn find_active(pool: &PgPool) -> Result<Option<SmtpConfig>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM smtp_configs WHERE is_active = true");
        sqlx::query_as::<_, SmtpConfig>(&query)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<SmtpConfig>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM smtp_configs ORDER BY name");
        sqlx::query_as::<_, SmtpConfig>(&query).fetch_all(pool).await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateSmtpConfig,
    ) -> Result<Option<SmtpConfig>, sqlx::Error> {
        let query = format!(
            "UPDATE smtp_configs SET
                name = COALESCE($2, name),
                host = COALESCE($3, host),
                port = COALESCE($4, port),
                username = COALESCE($5, username),
                password_encrypted = COALESCE($6, password_encrypted),
                from_address = COALESCE($7, from_address),
                from_name = COALESCE($8, from_name),
                use_starttls = COALESCE($9, use_starttls)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SmtpConfig>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.host)
            .bind(input.port)
            .bind(&input.username)
            .bind(&input.password_encrypted)
            .bind(&input.from_address)
            .bind(&input.from_name)
            .bind(input.use_starttls)
            .fetch_optional(pool)
            .await
    }

    /// Make `id` the only active configuration.
    ///
    /// Returns `None` if the row does not exist; the previous active row is
    /// left untouched in that case.
    pub async fn activate(pool: &PgPool, id: DbId) -> Result<Option<SmtpConfig>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM smtp_configs WHERE id = $1)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if !exists {
            return Ok(None);
        }
        sqlx::query("UPDATE smtp_configs SET is_active = false WHERE is_active = true AND id <> $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let query = format!(
            "UPDATE smtp_configs SET is_active = true WHERE id = $1 RETURNING {COLUMNS}"
        );
        let config = sqlx::query_as::<_, SmtpConfig>(&query)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(Some(config))
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM smtp_configs WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
