//! Read-only access to the audit trail.

use axum::extract::{Query, State};
use axum::Json;
use medialab_db::models::audit::{AuditLog, AuditQuery};
use medialab_db::repositories::AuditLogRepo;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAuditRead;
use crate::query::PaginationParams;
use crate::response::PageResponse;
use crate::state::AppState;

/// GET /api/v1/audit-logs
///
/// Filters: `user_id`, `action_type`, `entity_type`, `entity_id`, `from`, `to`.
pub async fn list(
    RequireAuditRead(_user): RequireAuditRead,
    State(state): State<AppState>,
    Query(params): Query<AuditQuery>,
) -> AppResult<Json<PageResponse<AuditLog>>> {
    let (limit, offset) = PaginationParams {
        limit: params.limit,
        offset: params.offset,
    }
    .resolve();

    let entries = AuditLogRepo::query(&state.pool, &params, limit, offset).await?;
    let total = AuditLogRepo::count(&state.pool, &params).await?;
    Ok(Json(PageResponse::new(entries, limit, offset).with_total(total)))
}
