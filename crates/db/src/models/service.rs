//! Service entity model and DTOs.

use medialab_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `services` table: something a department offers and
/// users can raise requests against.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Service {
    pub id: DbId,
    pub department_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateService {
    pub department_id: DbId,
    pub name: String,
    pub description: Option<String>,
    /// Defaults to `true`.
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateService {
    pub department_id: Option<DbId>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

/// List filters for `GET /services`.
#[derive(Debug, Default, Deserialize)]
pub struct ServiceFilter {
    pub department_id: Option<DbId>,
    pub is_active: Option<bool>,
}
