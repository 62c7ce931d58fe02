//! Handlers for the `/smtp` resource: outgoing mail configurations.
//!
//! Passwords are sealed with `SECRET_ENCRYPTION_KEY` before storage and are
//! never returned; responses only say whether one is set.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use medialab_core::crypto::encrypt_secret;
use medialab_core::types::DbId;
use medialab_db::models::smtp::{CreateSmtpConfig, SmtpConfigResponse, UpdateSmtpConfig};
use medialab_db::repositories::SmtpConfigRepo;
use medialab_events::{event_types, EmailConfig, EmailDelivery, EmailTemplate, PlatformEvent};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireSmtpManage;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::validation;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSmtpBody {
    #[validate(custom(function = "validation::name"), length(max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub host: String,
    #[validate(range(min = 1, max = 65535))]
    pub port: i32,
    pub username: Option<String>,
    pub password: Option<String>,
    #[validate(custom(function = "validation::email"))]
    pub from_address: String,
    pub from_name: Option<String>,
    #[serde(default = "default_starttls")]
    pub use_starttls: bool,
}

fn default_starttls() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSmtpBody {
    #[validate(custom(function = "validation::name"), length(max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub host: Option<String>,
    #[validate(range(min = 1, max = 65535))]
    pub port: Option<i32>,
    pub username: Option<String>,
    /// Replaces the stored password when present.
    pub password: Option<String>,
    #[validate(custom(function = "validation::email"))]
    pub from_address: Option<String>,
    pub from_name: Option<String>,
    pub use_starttls: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SmtpTestBody {
    #[validate(custom(function = "validation::email"))]
    pub to: String,
    /// Configuration to test; defaults to the one mail is sent with.
    pub config_id: Option<DbId>,
}

#[derive(Debug, Serialize)]
pub struct SmtpTestResult {
    pub sent: bool,
    pub host: String,
}

fn seal(state: &AppState, password: Option<String>) -> AppResult<Option<String>> {
    password
        .filter(|p| !p.is_empty())
        .map(|p| encrypt_secret(&state.config.secret_encryption_key, &p))
        .transpose()
        .map_err(|e| AppError::InternalError(format!("Failed to encrypt SMTP password: {e}")))
}

fn publish_changed(state: &AppState, actor: DbId, id: DbId, action: &str) {
    state.event_bus.publish(
        PlatformEvent::new(event_types::SMTP_CONFIG_CHANGED)
            .with_source("smtp_config", id)
            .with_actor(actor)
            .with_payload(serde_json::json!({ "action": action })),
    );
}

/// GET /api/v1/smtp
pub async fn list(
    RequireSmtpManage(_user): RequireSmtpManage,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<SmtpConfigResponse>>>> {
    let configs = SmtpConfigRepo::list(&state.pool).await?;
    Ok(Json(DataResponse {
        data: configs.into_iter().map(SmtpConfigResponse::from).collect(),
    }))
}

/// POST /api/v1/smtp
///
/// New configurations start inactive; use `/smtp/{id}/activate`.
pub async fn create(
    RequireSmtpManage(user): RequireSmtpManage,
    State(state): State<AppState>,
    Json(input): Json<CreateSmtpBody>,
) -> AppResult<(StatusCode, Json<DataResponse<SmtpConfigResponse>>)> {
    input.validate()?;
    let password_encrypted = seal(&state, input.password)?;

    let config = SmtpConfigRepo::create(
        &state.pool,
        &CreateSmtpConfig {
            name: input.name.trim().to_string(),
            host: input.host.trim().to_string(),
            port: input.port,
            username: input.username,
            password_encrypted,
            from_address: input.from_address,
            from_name: input.from_name,
            use_starttls: input.use_starttls,
        },
    )
    .await?;

    publish_changed(&state, user.user_id, config.id, "created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: config.into() })))
}

/// GET /api/v1/smtp/{id}
pub async fn get_by_id(
    RequireSmtpManage(_user): RequireSmtpManage,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<SmtpConfigResponse>>> {
    let config = SmtpConfigRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("SmtpConfig", id))?;
    Ok(Json(DataResponse { data: config.into() }))
}

/// PUT /api/v1/smtp/{id}
pub async fn update(
    RequireSmtpManage(user): RequireSmtpManage,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateSmtpBody>,
) -> AppResult<Json<DataResponse<SmtpConfigResponse>>> {
    input.validate()?;
    let patch = UpdateSmtpConfig {
        name: input.name.map(|n| n.trim().to_string()),
        host: input.host.map(|h| h.trim().to_string()),
        port: input.port,
        username: input.username,
        password_encrypted: seal(&state, input.password)?,
        from_address: input.from_address,
        from_name: input.from_name,
        use_starttls: input.use_starttls,
    };
    let config = SmtpConfigRepo::update(&state.pool, id, &patch)
        .await?
        .ok_or(AppError::not_found("SmtpConfig", id))?;

    publish_changed(&state, user.user_id, id, "updated");
    Ok(Json(DataResponse { data: config.into() }))
}

/// DELETE /api/v1/smtp/{id}
pub async fn delete(
    RequireSmtpManage(user): RequireSmtpManage,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !SmtpConfigRepo::delete(&state.pool, id).await? {
        return Err(AppError::not_found("SmtpConfig", id));
    }
    publish_changed(&state, user.user_id, id, "deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/smtp/{id}/activate
///
/// Deactivates whichever configuration was active before.
pub async fn activate(
    RequireSmtpManage(user): RequireSmtpManage,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<SmtpConfigResponse>>> {
    let config = SmtpConfigRepo::activate(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("SmtpConfig", id))?;
    publish_changed(&state, user.user_id, id, "activated");
    tracing::info!(smtp_config_id = id, "SMTP configuration activated");
    Ok(Json(DataResponse { data: config.into() }))
}

/// POST /api/v1/smtp/test
///
/// Sends a test message synchronously so the caller sees SMTP errors.
pub async fn send_test(
    RequireSmtpManage(_user): RequireSmtpManage,
    State(state): State<AppState>,
    Json(input): Json<SmtpTestBody>,
) -> AppResult<Json<DataResponse<SmtpTestResult>>> {
    input.validate()?;
    let secret = &state.config.secret_encryption_key;

    let (config, config_name) = match input.config_id {
        Some(id) => {
            let row = SmtpConfigRepo::find_by_id(&state.pool, id)
                .await?
                .ok_or(AppError::not_found("SmtpConfig", id))?;
            let config = EmailConfig::from_row(&row, secret)
                .map_err(|e| AppError::BadRequest(format!("SMTP configuration unusable: {e}")))?;
            (config, row.name)
        }
        None => {
            let config = EmailConfig::resolve(&state.pool, secret)
                .await
                .ok_or_else(|| AppError::BadRequest("No SMTP configuration available".into()))?;
            (config, "default".to_string())
        }
    };

    let vars = HashMap::from([("config_name", config_name)]);
    let email = EmailTemplate::SmtpTest.render(&vars);
    let delivery = EmailDelivery::new(config);
    delivery
        .send(&input.to, &email)
        .await
        .map_err(|e| AppError::BadRequest(format!("SMTP test failed: {e}")))?;

    Ok(Json(DataResponse {
        data: SmtpTestResult {
            sent: true,
            host: delivery.config().smtp_host.clone(),
        },
    }))
}
