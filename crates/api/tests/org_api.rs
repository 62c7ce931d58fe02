//! Users, roles and the area/department/service tree over HTTP.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, delete_auth, get_auth, post_json, post_json_auth, put_json_auth, user_token,
};
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_creates_user_and_duplicate_conflicts(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_admin, token) = user_token(&pool, &app, "admin1", "admin").await;

    let body = json!({
        "username": "newbie",
        "email": "newbie@test.com",
        "password": "first_pass_123",
        "role": "member",
    });
    let response = post_json_auth(app.clone(), "/api/v1/users", body.clone(), &token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["username"], "newbie");
    assert_eq!(json["data"]["role"], "member");
    assert!(json["data"].get("password_hash").is_none());

    let response = post_json_auth(app.clone(), "/api/v1/users", body, &token).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // The new account can log in.
    let login = json!({ "username": "newbie", "password": "first_pass_123" });
    let response = post_json(app, "/api/v1/auth/login", login).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn user_creation_validates_password(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_admin, token) = user_token(&pool, &app, "admin1", "admin").await;

    let body = json!({ "username": "weak", "email": "weak@test.com", "password": "short" });
    let response = post_json_auth(app, "/api/v1/users", body, &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn member_cannot_manage_users(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_member, token) = user_token(&pool, &app, "member1", "member").await;

    let response = get_auth(app.clone(), "/api/v1/users", &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = json!({ "username": "x1", "email": "x1@test.com", "password": "pass_word_12" });
    let response = post_json_auth(app, "/api/v1/users", body, &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn coordinator_reads_but_cannot_write_users(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_coord, token) = user_token(&pool, &app, "coord", "coordinator").await;

    let response = get_auth(app.clone(), "/api/v1/users", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["data"].as_array().unwrap().len() >= 1);

    let response = post_json_auth(app, "/api/v1/users/1/deactivate", json!({}), &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deactivation_blocks_login_and_self_deactivation_is_refused(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (admin, token) = user_token(&pool, &app, "admin1", "admin").await;
    let target = common::create_user(&pool, "target", "member").await;

    let uri = format!("/api/v1/users/{}/deactivate", target.id);
    let response = post_json_auth(app.clone(), &uri, json!({}), &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let login = json!({ "username": "target", "password": common::TEST_PASSWORD });
    let response = post_json(app.clone(), "/api/v1/auth/login", login.clone()).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let uri = format!("/api/v1/users/{}/activate", target.id);
    let response = post_json_auth(app.clone(), &uri, json!({}), &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = post_json(app.clone(), "/api/v1/auth/login", login).await;
    assert_eq!(response.status(), StatusCode::OK);

    let uri = format!("/api/v1/users/{}/deactivate", admin.id);
    let response = post_json_auth(app, &uri, json!({}), &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deleted_user_disappears(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_admin, token) = user_token(&pool, &app, "admin1", "admin").await;
    let target = common::create_user(&pool, "gone", "member").await;

    let uri = format!("/api/v1/users/{}", target.id);
    let response = delete_auth(app.clone(), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(app.clone(), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = put_json_auth(app, &uri, json!({ "full_name": "Ghost" }), &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_password_reset_replaces_password(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_admin, token) = user_token(&pool, &app, "admin1", "admin").await;
    let target = common::create_user(&pool, "forgot", "member").await;

    let uri = format!("/api/v1/users/{}/reset-password", target.id);
    let body = json!({ "new_password": "fresh_pass_777" });
    let response = post_json_auth(app.clone(), &uri, body, &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let login = json!({ "username": "forgot", "password": "fresh_pass_777" });
    let response = post_json(app, "/api/v1/auth/login", login).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn custom_role_permissions_round_trip(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_admin, token) = user_token(&pool, &app, "admin1", "admin").await;

    let response = post_json_auth(
        app.clone(),
        "/api/v1/roles",
        json!({ "name": "Editor", "description": "Writes content" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let role = body_json(response).await;
    assert_eq!(role["data"]["name"], "editor");
    let role_id = role["data"]["id"].as_i64().unwrap();

    let uri = format!("/api/v1/roles/{role_id}/permissions");
    let body = json!({ "permissions": ["content.write", "org.read", "content.write"] });
    let response = put_json_auth(app.clone(), &uri, body, &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(get_auth(app.clone(), &uri, &token).await).await;
    assert_eq!(json["data"], json!(["content.write", "org.read"]));

    let body = json!({ "permissions": ["Not A Code"] });
    let response = put_json_auth(app, &uri, body, &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn builtin_roles_are_protected(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (admin, token) = user_token(&pool, &app, "admin1", "admin").await;

    let uri = format!("/api/v1/roles/{}", admin.role_id);
    let response = delete_auth(app.clone(), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = put_json_auth(app.clone(), &uri, json!({ "name": "root" }), &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json_auth(app, "/api/v1/roles", json!({ "name": "admin" }), &token).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn permission_catalogue_lists_seeded_codes(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_admin, token) = user_token(&pool, &app, "admin1", "admin").await;

    let json = body_json(get_auth(app, "/api/v1/permissions", &token).await).await;
    let codes: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["code"].as_str().unwrap())
        .collect();
    assert!(codes.contains(&"audit.read"));
    assert!(codes.contains(&"requests.manage"));
}

// ---------------------------------------------------------------------------
// Areas / departments / services
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn org_tree_crud_and_guarded_deletes(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_coord, token) = user_token(&pool, &app, "coord", "coordinator").await;

    let area = body_json(
        post_json_auth(app.clone(), "/api/v1/areas", json!({ "name": "Production" }), &token).await,
    )
    .await;
    let area_id = area["data"]["id"].as_i64().unwrap();

    let response =
        post_json_auth(app.clone(), "/api/v1/areas", json!({ "name": "Production" }), &token).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = post_json_auth(
        app.clone(),
        "/api/v1/departments",
        json!({ "area_id": area_id, "name": "Video" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let dept_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = post_json_auth(
        app.clone(),
        "/api/v1/departments",
        json!({ "area_id": 999_999, "name": "Orphan" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json_auth(
        app.clone(),
        "/api/v1/services",
        json!({ "department_id": dept_id, "name": "Event coverage" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(
        get_auth(app.clone(), &format!("/api/v1/areas/{area_id}/departments"), &token).await,
    )
    .await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    let json = body_json(
        get_auth(app.clone(), &format!("/api/v1/departments/{dept_id}/services"), &token).await,
    )
    .await;
    assert_eq!(json["data"][0]["name"], "Event coverage");

    // Parents with live children cannot be removed.
    let response = delete_auth(app.clone(), &format!("/api/v1/areas/{area_id}"), &token).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let response =
        delete_auth(app.clone(), &format!("/api/v1/departments/{dept_id}"), &token).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = get_auth(app, "/api/v1/areas/999999", &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn member_reads_org_but_cannot_write(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_member, token) = user_token(&pool, &app, "member1", "member").await;

    let response = get_auth(app.clone(), "/api/v1/areas", &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_json_auth(app, "/api/v1/areas", json!({ "name": "Nope" }), &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
