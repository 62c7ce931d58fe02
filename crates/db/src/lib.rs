//! Persistence layer: connection pool, migrations, row models, and the
//! repository structs that hold every SQL statement the backend runs.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub mod models;
pub mod repositories;

/// Shared pool type used across the workspace.
pub type DbPool = PgPool;

/// Pool sizing and connection settings.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    /// Connections kept for steady-state load.
    pub pool_size: u32,
    /// Extra connections allowed above `pool_size` under burst.
    pub max_overflow: u32,
    /// Seconds to wait for a free connection before failing.
    pub acquire_timeout_secs: u64,
}

impl DbConfig {
    /// Configuration with default sizing (10 + 20 overflow, 30 s timeout).
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            pool_size: 10,
            max_overflow: 20,
            acquire_timeout_secs: 30,
        }
    }

    /// Upper bound on open connections.
    pub fn max_connections(&self) -> u32 {
        self.pool_size + self.max_overflow
    }
}

/// Open a connection pool sized from `config`.
pub async fn create_pool(config: &DbConfig) -> Result<DbPool, sqlx::Error> {
    tracing::debug!(
        max_connections = config.max_connections(),
        acquire_timeout_secs = config.acquire_timeout_secs,
        "Opening database pool"
    );
    PgPoolOptions::new()
        .max_connections(config.max_connections())
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&config.url)
        .await
}

/// Verify the database answers a trivial query.
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_connections_adds_overflow() {
        let config = DbConfig::new("postgres://localhost/medialab");
        assert_eq!(config.max_connections(), 30);
    }
}
