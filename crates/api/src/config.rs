use medialab_db::DbConfig;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the database URL and JWT secret have defaults suitable
/// for local development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Graceful shutdown timeout in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Connection pool settings.
    pub database: DbConfig,
    /// Redis URL for the token store. `None` selects the in-memory store.
    pub redis_url: Option<String>,
    /// JWT token configuration (secret, expiry durations, optional JWE key).
    pub jwt: JwtConfig,
    /// Secret used to encrypt stored SMTP passwords.
    pub secret_encryption_key: String,
    /// Whether auth cookies carry the `Secure` attribute.
    pub cookie_secure: bool,
    /// Base URL of the web client, used for links in emails.
    pub frontend_url: String,
    /// Rate limits for login attempts and the API as a whole.
    pub rate_limits: RateLimitConfig,
}

/// Fixed-window rate limit settings.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub login_limit: u64,
    pub login_window_secs: u64,
    pub api_limit: u64,
    pub api_window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            login_limit: 10,
            login_window_secs: 300,
            api_limit: 300,
            api_window_secs: 60,
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{name} has an invalid value: {raw}")),
        Err(_) => default,
    }
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                    |
    /// |--------------------------|----------------------------|
    /// | `HOST`                   | `0.0.0.0`                  |
    /// | `PORT`                   | `8000`                     |
    /// | `DATABASE_URL`           | **required**               |
    /// | `DB_POOL_SIZE`           | `10`                       |
    /// | `DB_MAX_OVERFLOW`        | `20`                       |
    /// | `DB_POOL_TIMEOUT_SECS`   | `30`                       |
    /// | `REDIS_URL`              | unset (in-memory store)    |
    /// | `CORS_ORIGINS`           | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`  | `30`                       |
    /// | `SECRET_ENCRYPTION_KEY`  | value of `JWT_SECRET`      |
    /// | `COOKIE_SECURE`          | `false`                    |
    /// | `FRONTEND_URL`           | `http://localhost:5173`    |
    /// | `LOGIN_RATE_LIMIT`       | `10`                       |
    /// | `LOGIN_RATE_WINDOW_SECS` | `300`                      |
    /// | `API_RATE_LIMIT`         | `300`                      |
    /// | `API_RATE_WINDOW_SECS`   | `60`                       |
    ///
    /// JWT variables are documented on [`JwtConfig::from_env`].
    ///
    /// # Panics
    ///
    /// Panics on a missing required variable or an unparsable value.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = env_or("PORT", 8000);

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let defaults = DbConfig::new(database_url);
        let database = DbConfig {
            pool_size: env_or("DB_POOL_SIZE", defaults.pool_size),
            max_overflow: env_or("DB_MAX_OVERFLOW", defaults.max_overflow),
            acquire_timeout_secs: env_or("DB_POOL_TIMEOUT_SECS", defaults.acquire_timeout_secs),
            ..defaults
        };

        let jwt = JwtConfig::from_env();
        let secret_encryption_key =
            optional_env("SECRET_ENCRYPTION_KEY").unwrap_or_else(|| jwt.secret.clone());

        let rate_defaults = RateLimitConfig::default();
        let rate_limits = RateLimitConfig {
            login_limit: env_or("LOGIN_RATE_LIMIT", rate_defaults.login_limit),
            login_window_secs: env_or("LOGIN_RATE_WINDOW_SECS", rate_defaults.login_window_secs),
            api_limit: env_or("API_RATE_LIMIT", rate_defaults.api_limit),
            api_window_secs: env_or("API_RATE_WINDOW_SECS", rate_defaults.api_window_secs),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30),
            shutdown_timeout_secs: env_or("SHUTDOWN_TIMEOUT_SECS", 30),
            database,
            redis_url: optional_env("REDIS_URL"),
            jwt,
            secret_encryption_key,
            cookie_secure: env_or("COOKIE_SECURE", false),
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".into())
                .trim_end_matches('/')
                .to_string(),
            rate_limits,
        }
    }
}
