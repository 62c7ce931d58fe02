//! SMTP configuration model and DTOs.

use medialab_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from `smtp_configs`. The password is stored encrypted and is
/// never serialized; use [`SmtpConfigResponse`] for API output.
#[derive(Debug, Clone, FromRow)]
pub struct SmtpConfig {
    pub id: DbId,
    pub name: String,
    pub host: String,
    pub port: i32,
    pub username: Option<String>,
    pub password_encrypted: Option<String>,
    pub from_address: String,
    pub from_name: Option<String>,
    pub use_starttls: bool,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Serialize)]
pub struct SmtpConfigResponse {
    pub id: DbId,
    pub name: String,
    pub host: String,
    pub port: i32,
    pub username: Option<String>,
    pub has_password: bool,
    pub from_address: String,
    pub from_name: Option<String>,
    pub use_starttls: bool,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<SmtpConfig> for SmtpConfigResponse {
    fn from(c: SmtpConfig) -> Self {
        Self {
            id: c.id,
            name: c.name,
            host: c.host,
            port: c.port,
            username: c.username,
            has_password: c.password_encrypted.is_some(),
            from_address: c.from_address,
            from_name: c.from_name,
            use_starttls: c.use_starttls,
            is_active: c.is_active,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Insert DTO. `password_encrypted` is already sealed by the caller.
#[derive(Debug, Clone)]
pub struct CreateSmtpConfig {
    pub name: String,
    pub host: String,
    pub port: i32,
    pub username: Option<String>,
    pub password_encrypted: Option<String>,
    pub from_address: String,
    pub from_name: Option<String>,
    pub use_starttls: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateSmtpConfig {
    pub name: Option<String>,
    pub host: Option<String>,
    pub port: Option<i32>,
    pub username: Option<String>,
    pub password_encrypted: Option<String>,
    pub from_address: Option<String>,
    pub from_name: Option<String>,
    pub use_starttls: Option<bool>,
}
