//! Video and photo items attached to a content entry.

use medialab_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Video
// ---------------------------------------------------------------------------

/// A row from the `videos` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Video {
    pub id: DbId,
    pub content_id: DbId,
    pub title: String,
    pub url: String,
    pub provider: String,
    pub duration_secs: Option<i32>,
    pub thumbnail_url: Option<String>,
    pub sort_order: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert DTO. `provider` is detected from the URL by the caller.
#[derive(Debug, Clone)]
pub struct CreateVideo {
    pub content_id: DbId,
    pub title: String,
    pub url: String,
    pub provider: String,
    pub duration_secs: Option<i32>,
    pub thumbnail_url: Option<String>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateVideo {
    pub title: Option<String>,
    pub url: Option<String>,
    #[serde(skip)]
    pub provider: Option<String>,
    pub duration_secs: Option<i32>,
    pub thumbnail_url: Option<String>,
    pub sort_order: Option<i32>,
}

// ---------------------------------------------------------------------------
// Photo
// ---------------------------------------------------------------------------

/// A row from the `photos` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Photo {
    pub id: DbId,
    pub content_id: DbId,
    pub url: String,
    pub caption: Option<String>,
    pub sort_order: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePhoto {
    #[serde(default)]
    pub content_id: DbId,
    pub url: String,
    pub caption: Option<String>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePhoto {
    pub url: Option<String>,
    pub caption: Option<String>,
    pub sort_order: Option<i32>,
}
