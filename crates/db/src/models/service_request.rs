//! Service request entity model and DTOs.

use chrono::NaiveDate;
use medialab_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `service_requests` table.
///
/// `status` and `priority` hold the string forms of
/// [`medialab_core::service_request::RequestStatus`] and
/// [`medialab_core::service_request::RequestPriority`].
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ServiceRequest {
    pub id: DbId,
    pub service_id: DbId,
    pub requester_id: DbId,
    pub assignee_id: Option<DbId>,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    pub due_date: Option<NaiveDate>,
    pub resolution_note: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert DTO. `requester_id` comes from the authenticated user.
#[derive(Debug, Clone)]
pub struct CreateServiceRequest {
    pub service_id: DbId,
    pub requester_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub priority: String,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateServiceRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<NaiveDate>,
}

/// List filters for `GET /requests`.
#[derive(Debug, Default, Deserialize)]
pub struct ServiceRequestFilter {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub service_id: Option<DbId>,
    pub requester_id: Option<DbId>,
    pub assignee_id: Option<DbId>,
    /// Matches requests the user raised or is assigned to. Set by the
    /// server, never read from the query string.
    #[serde(skip)]
    pub participant_id: Option<DbId>,
}
