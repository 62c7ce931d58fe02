//! Content entry model and DTOs.

use medialab_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `contents` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Content {
    pub id: DbId,
    pub title: String,
    pub slug: String,
    pub body: Option<String>,
    pub kind: String,
    pub status: String,
    pub author_id: Option<DbId>,
    pub area_id: Option<DbId>,
    pub published_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert DTO. The slug is resolved by the caller (explicit or derived from the title).
#[derive(Debug, Clone)]
pub struct CreateContent {
    pub title: String,
    pub slug: String,
    pub body: Option<String>,
    pub kind: String,
    pub author_id: Option<DbId>,
    pub area_id: Option<DbId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateContent {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub body: Option<String>,
    pub kind: Option<String>,
    pub area_id: Option<DbId>,
}

/// List filters for `GET /content`.
#[derive(Debug, Default, Deserialize)]
pub struct ContentFilter {
    pub status: Option<String>,
    pub kind: Option<String>,
    pub area_id: Option<DbId>,
    pub author_id: Option<DbId>,
}
