//! Repository for the `user_sessions` table.
//!
//! One row per issued refresh token. Rows are only ever revoked, never
//! reactivated; the cleanup job deletes them once revoked or expired.

use medialab_core::types::DbId;
use sqlx::PgPool;

use crate::models::session::{CreateSession, UserSession};

const COLUMNS: &str = "id, user_id, refresh_token_hash, expires_at, is_revoked, \
                       user_agent, ip_address, created_at, updated_at";

/// Session still usable for a refresh.
const ACTIVE: &str = "is_revoked = false AND expires_at > NOW()";

pub struct SessionRepo;

impl SessionRepo {
    /// Record a newly issued refresh token.
    pub async fn create(pool: &PgPool, input: &CreateSession) -> Result<UserSession, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_sessions
                (user_id, refresh_token_hash, expires_at, user_agent, ip_address)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserSession>(&query)
            .bind(input.user_id)
            .bind(&input.refresh_token_hash)
            .bind(input.expires_at)
            .bind(&input.user_agent)
            .bind(&input.ip_address)
            .fetch_one(pool)
            .await
    }

    /// Consume the active session holding `hash`.
    ///
    /// The session is revoked and returned in a single statement, so two
    /// concurrent refreshes with the same token cannot both succeed. Returns
    /// `None` for unknown, expired or already consumed tokens.
    pub async fn rotate(pool: &PgPool, hash: &str) -> Result<Option<UserSession>, sqlx::Error> {
        let query = format!(
            "UPDATE user_sessions SET is_revoked = true
             WHERE refresh_token_hash = $1 AND {ACTIVE}
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserSession>(&query)
            .bind(hash)
            .fetch_optional(pool)
            .await
    }

    /// Number of sessions the user can still refresh from.
    pub async fn count_active_for_user(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM user_sessions WHERE user_id = $1 AND {ACTIVE}");
        sqlx::query_scalar(&query)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Revoke every active session of a user (logout, password change,
    /// deactivation). Returns how many were revoked.
    pub async fn revoke_all_for_user(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_sessions SET is_revoked = true
             WHERE user_id = $1 AND is_revoked = false",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete sessions that can no longer be used.
    pub async fn cleanup_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let query = format!("DELETE FROM user_sessions WHERE NOT ({ACTIVE})");
        let result = sqlx::query(&query).execute(pool).await?;
        Ok(result.rows_affected())
    }
}
