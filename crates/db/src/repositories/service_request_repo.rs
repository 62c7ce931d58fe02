//! Repository for the `service_requests` table.

use medialab_core::types::DbId;
use sqlx::PgPool;

use crate::models::service_request::{
    CreateServiceRequest, ServiceRequest, ServiceRequestFilter, UpdateServiceRequest,
};

const COLUMNS: &str = "id, service_id, requester_id, assignee_id, title, description, status, \
                       priority, due_date, resolution_note, created_at, updated_at";

/// WHERE clause shared by [`ServiceRequestRepo::list`] and [`ServiceRequestRepo::count`].
const LIST_FILTER: &str = "\
    deleted_at IS NULL \
    AND ($1::TEXT IS NULL OR status = $1) \
    AND ($2::TEXT IS NULL OR priority = $2) \
    AND ($3::BIGINT IS NULL OR service_id = $3) \
    AND ($4::BIGINT IS NULL OR requester_id = $4) \
    AND ($5::BIGINT IS NULL OR assignee_id = $5) \
    AND ($6::BIGINT IS NULL OR requester_id = $6 OR assignee_id = $6)";

/// Provides CRUD and workflow operations for service requests.
pub struct ServiceRequestRepo;

impl ServiceRequestRepo {
    /// Insert a new request in `pending` status.
    pub async fn create(
        pool: &PgPool,
        input: &CreateServiceRequest,
    ) -> Result<ServiceRequest, sqlx::Error> {
        let query = format!(
            "INSERT INTO service_requests (service_id, requester_id, title, description, priority, due_date)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ServiceRequest>(&query)
            .bind(input.service_id)
            .bind(input.requester_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.priority)
            .bind(input.due_date)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ServiceRequest>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM service_requests WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, ServiceRequest>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List requests matching `filter`, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &ServiceRequestFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ServiceRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM service_requests WHERE {LIST_FILTER}
             ORDER BY created_at DESC, id DESC
             LIMIT $7 OFFSET $8"
        );
        sqlx::query_as::<_, ServiceRequest>(&query)
            .bind(&filter.status)
            .bind(&filter.priority)
            .bind(filter.service_id)
            .bind(filter.requester_id)
            .bind(filter.assignee_id)
            .bind(filter.participant_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool, filter: &ServiceRequestFilter) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM service_requests WHERE {LIST_FILTER}");
        sqlx::query_scalar(&query)
            .bind(&filter.status)
            .bind(&filter.priority)
            .bind(filter.service_id)
            .bind(filter.requester_id)
            .bind(filter.assignee_id)
            .bind(filter.participant_id)
            .fetch_one(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateServiceRequest,
    ) -> Result<Option<ServiceRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE service_requests SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                priority = COALESCE($4, priority),
                due_date = COALESCE($5, due_date)
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ServiceRequest>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.priority)
            .bind(input.due_date)
            .fetch_optional(pool)
            .await
    }

    /// Move a request from `expected` to `status`.
    ///
    /// The `expected` guard makes concurrent transitions safe: returns `None`
    /// if the row is missing or its status changed in the meantime.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        expected: &str,
        status: &str,
        resolution_note: Option<&str>,
    ) -> Result<Option<ServiceRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE service_requests SET
                status = $3,
                resolution_note = COALESCE($4, resolution_note)
             WHERE id = $1 AND status = $2 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ServiceRequest>(&query)
            .bind(id)
            .bind(expected)
            .bind(status)
            .bind(resolution_note)
            .fetch_optional(pool)
            .await
    }

    /// Assign (or with `None`, unassign) a request.
    pub async fn assign(
        pool: &PgPool,
        id: DbId,
        assignee_id: Option<DbId>,
    ) -> Result<Option<ServiceRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE service_requests SET assignee_id = $2
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ServiceRequest>(&query)
            .bind(id)
            .bind(assignee_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE service_requests SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
