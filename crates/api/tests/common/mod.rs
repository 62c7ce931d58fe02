//! Shared harness for the API integration tests.
//!
//! Every test builds the production router through
//! [`build_app_router`](medialab_api::router::build_app_router) on top of a
//! throwaway database from `#[sqlx::test]` and an in-memory token store.
//! `Router` is cheap to clone, so tests clone one app per request and the
//! token store (revocations, rate-limit counters) is shared between them.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use medialab_api::auth::jwt::JwtConfig;
use medialab_api::auth::password::hash_password;
use medialab_api::auth::token_store::MemoryTokenStore;
use medialab_api::config::{RateLimitConfig, ServerConfig};
use medialab_api::router::build_app_router;
use medialab_api::state::AppState;
use medialab_api::ws::WsManager;
use medialab_db::models::user::{CreateUser, User};
use medialab_db::repositories::{RoleRepo, UserRepo};
use medialab_db::DbConfig;
use medialab_events::EventBus;

pub const TEST_PASSWORD: &str = "test_password_123";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        database: DbConfig::new("postgres://unused"),
        redis_url: None,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hs256".to_string(),
            access_token_expiry_mins: 30,
            refresh_token_expiry_days: 7,
            jwe_key: None,
        },
        secret_encryption_key: "test-encryption-secret".to_string(),
        cookie_secure: false,
        frontend_url: "http://localhost:5173".to_string(),
        rate_limits: RateLimitConfig::default(),
    }
}

/// Build the application state used by [`build_test_app_with`].
pub fn test_state(pool: PgPool, config: ServerConfig) -> AppState {
    AppState {
        pool,
        config: Arc::new(config),
        ws_manager: Arc::new(WsManager::new()),
        event_bus: Arc::new(EventBus::default()),
        token_store: Arc::new(MemoryTokenStore::new()),
    }
}

/// Full router with the default test configuration.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, test_config())
}

pub fn build_test_app_with(pool: PgPool, config: ServerConfig) -> Router {
    let state = test_state(pool, config.clone());
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Insert a user with one of the seeded roles (`admin`, `coordinator`,
/// `member`) and [`TEST_PASSWORD`].
pub async fn create_user(pool: &PgPool, username: &str, role: &str) -> User {
    let role = RoleRepo::find_by_name(pool, role)
        .await
        .expect("role lookup should succeed")
        .expect("seeded role should exist");
    let input = CreateUser {
        username: username.to_string(),
        email: format!("{username}@test.com"),
        password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
        full_name: None,
        role_id: role.id,
        department_id: None,
    };
    UserRepo::create(pool, &input)
        .await
        .expect("user creation should succeed")
}

/// Log in through the API and return the access token.
pub async fn login(app: &Router, username: &str) -> String {
    let body = serde_json::json!({ "username": username, "password": TEST_PASSWORD });
    let response = post_json(app.clone(), "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK, "login for {username} failed");
    let json = body_json(response).await;
    json["access_token"]
        .as_str()
        .expect("login response must carry access_token")
        .to_string()
}

/// Create a user with `role` and return their access token.
pub async fn user_token(pool: &PgPool, app: &Router, username: &str, role: &str) -> (User, String) {
    let user = create_user(pool, username, role).await;
    let token = login(app, username).await;
    (user, token)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

fn request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: Router, req: Request<Body>) -> Response<Body> {
    app.oneshot(req).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, request(Method::GET, uri, None, None)).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, request(Method::GET, uri, Some(token), None)).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, request(Method::POST, uri, None, Some(body))).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, request(Method::POST, uri, Some(token), Some(body))).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, request(Method::PUT, uri, Some(token), Some(body))).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, request(Method::DELETE, uri, Some(token), None)).await
}

/// Collect the response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be valid JSON")
}
