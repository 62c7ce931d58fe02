//! Department entity model and DTOs.

use medialab_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `departments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Department {
    pub id: DbId,
    pub area_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub head_user_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDepartment {
    pub area_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub head_user_id: Option<DbId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDepartment {
    pub area_id: Option<DbId>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub head_user_id: Option<DbId>,
}
