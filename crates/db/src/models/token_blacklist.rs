//! Durable record of revoked access tokens.

use medialab_core::types::{DbId, Timestamp};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct BlacklistedToken {
    pub id: DbId,
    pub jti: String,
    pub user_id: Option<DbId>,
    pub expires_at: Timestamp,
    pub reason: Option<String>,
    pub created_at: Timestamp,
}
