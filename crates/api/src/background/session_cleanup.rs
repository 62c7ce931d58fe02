//! Periodic purge of expired credentials.
//!
//! Removes expired or revoked refresh sessions, blacklist rows whose access
//! token has expired anyway, and used or expired password reset tokens.

use std::time::Duration;

use medialab_db::repositories::{PasswordResetRepo, SessionRepo, TokenBlacklistRepo};
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// How often the cleanup job runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

/// Rows removed by one cleanup pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanupStats {
    pub sessions: u64,
    pub blacklist: u64,
    pub reset_tokens: u64,
}

impl CleanupStats {
    pub fn total(&self) -> u64 {
        self.sessions + self.blacklist + self.reset_tokens
    }
}

/// Run one cleanup pass.
pub async fn cleanup_once(pool: &PgPool) -> Result<CleanupStats, sqlx::Error> {
    Ok(CleanupStats {
        sessions: SessionRepo::cleanup_expired(pool).await?,
        blacklist: TokenBlacklistRepo::cleanup_expired(pool).await?,
        reset_tokens: PasswordResetRepo::cleanup_expired(pool).await?,
    })
}

/// Run the cleanup loop until `cancel` is triggered.
pub async fn run(pool: PgPool, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = CLEANUP_INTERVAL.as_secs(),
        "Session cleanup job started"
    );

    let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Session cleanup job stopping");
                break;
            }
            _ = interval.tick() => {
                match cleanup_once(&pool).await {
                    Ok(stats) if stats.total() > 0 => {
                        tracing::info!(
                            sessions = stats.sessions,
                            blacklist = stats.blacklist,
                            reset_tokens = stats.reset_tokens,
                            "Session cleanup: purged expired rows"
                        );
                    }
                    Ok(_) => tracing::debug!("Session cleanup: nothing to purge"),
                    Err(e) => {
                        tracing::error!(error = %e, "Session cleanup failed");
                    }
                }
            }
        }
    }
}
