//! Repository for the `token_blacklist` table.

use medialab_core::types::{DbId, Timestamp};
use sqlx::PgPool;

/// Durable record of revoked access tokens. The fast path lives in the
/// token store; this table survives a cache flush.
pub struct TokenBlacklistRepo;

impl TokenBlacklistRepo {
    /// Record a revoked `jti`. Re-revoking the same token is a no-op.
    pub async fn insert(
        pool: &PgPool,
        jti: &str,
        user_id: Option<DbId>,
        expires_at: Timestamp,
        reason: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO token_blacklist (jti, user_id, expires_at, reason)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (jti) DO NOTHING",
        )
        .bind(jti)
        .bind(user_id)
        .bind(expires_at)
        .bind(reason)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Whether `jti` is recorded and not yet expired.
    pub async fn contains(pool: &PgPool, jti: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM token_blacklist WHERE jti = $1 AND expires_at > NOW())",
        )
        .bind(jti)
        .fetch_one(pool)
        .await
    }

    /// Delete rows whose token has expired anyway.
    pub async fn cleanup_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM token_blacklist WHERE expires_at < NOW()")
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
