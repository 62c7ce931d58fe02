//! HTTP-level tests for login, refresh, logout, lockout and the password
//! endpoints.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, create_user, get, get_auth, login, post_json, post_json_auth, put_json_auth,
    TEST_PASSWORD,
};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_returns_tokens_and_user(pool: PgPool) {
    let user = create_user(&pool, "loginuser", "admin").await;
    let app = common::build_test_app(pool);

    let body = serde_json::json!({ "username": "loginuser", "password": TEST_PASSWORD });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies: Vec<_> = response.headers().get_all("set-cookie").iter().collect();
    assert!(!cookies.is_empty(), "login must set auth cookies");

    let json = body_json(response).await;
    assert!(json["access_token"].is_string());
    assert!(json["refresh_token"].is_string());
    assert_eq!(json["token_type"], "Bearer");
    assert_eq!(json["user"]["id"], user.id);
    assert_eq!(json["user"]["role"], "admin");
    assert!(json["user"]["permissions"]
        .as_array()
        .unwrap()
        .contains(&serde_json::json!("*")));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_accepts_email(pool: PgPool) {
    create_user(&pool, "byemail", "member").await;
    let app = common::build_test_app(pool);

    let body = serde_json::json!({ "username": "byemail@test.com", "password": TEST_PASSWORD });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_rejects_bad_credentials(pool: PgPool) {
    create_user(&pool, "wrongpw", "member").await;
    let app = common::build_test_app(pool);

    let body = serde_json::json!({ "username": "wrongpw", "password": "incorrect_password1" });
    let response = post_json(app.clone(), "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");

    let body = serde_json::json!({ "username": "ghost", "password": "whatever123" });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn account_locks_after_repeated_failures(pool: PgPool) {
    create_user(&pool, "locked", "member").await;
    let app = common::build_test_app(pool);

    for _ in 0..5 {
        let body = serde_json::json!({ "username": "locked", "password": "nope_nope_1" });
        let response = post_json(app.clone(), "/api/v1/auth/login", body).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // Correct password is refused while the lock holds.
    let body = serde_json::json!({ "username": "locked", "password": TEST_PASSWORD });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_rate_limit_returns_429(pool: PgPool) {
    create_user(&pool, "hammer", "member").await;
    let mut config = common::test_config();
    config.rate_limits.login_limit = 2;
    let app = common::build_test_app_with(pool, config);

    let body = serde_json::json!({ "username": "hammer", "password": TEST_PASSWORD });
    for _ in 0..2 {
        let response = post_json(app.clone(), "/api/v1/auth/login", body.clone()).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("retry-after"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deactivated_user_cannot_login(pool: PgPool) {
    let user = create_user(&pool, "inactive", "member").await;
    medialab_db::repositories::UserRepo::set_active(&pool, user.id, false)
        .await
        .unwrap();
    let app = common::build_test_app(pool);

    let body = serde_json::json!({ "username": "inactive", "password": TEST_PASSWORD });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn refresh_rotates_token(pool: PgPool) {
    create_user(&pool, "refresher", "member").await;
    let app = common::build_test_app(pool);

    let body = serde_json::json!({ "username": "refresher", "password": TEST_PASSWORD });
    let login_json = body_json(post_json(app.clone(), "/api/v1/auth/login", body).await).await;
    let refresh_token = login_json["refresh_token"].as_str().unwrap().to_string();

    let body = serde_json::json!({ "refresh_token": refresh_token });
    let response = post_json(app.clone(), "/api/v1/auth/refresh", body.clone()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_ne!(json["refresh_token"].as_str().unwrap(), refresh_token);

    // The old refresh token was consumed.
    let response = post_json(app, "/api/v1/auth/refresh", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn refresh_records_the_current_client(pool: PgPool) {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    create_user(&pool, "roamer", "member").await;
    let app = common::build_test_app(pool.clone());

    let body = serde_json::json!({ "username": "roamer", "password": TEST_PASSWORD });
    let login_json = body_json(post_json(app.clone(), "/api/v1/auth/login", body).await).await;
    let body = serde_json::json!({ "refresh_token": login_json["refresh_token"] });

    let request = Request::post("/api/v1/auth/refresh")
        .header("content-type", "application/json")
        .header("user-agent", "medialab-mobile/2.1")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let agents: Vec<Option<String>> =
        sqlx::query_scalar("SELECT user_agent FROM user_sessions WHERE is_revoked = false")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(agents, vec![Some("medialab-mobile/2.1".to_string())]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn refresh_with_garbage_token_is_unauthorized(pool: PgPool) {
    let app = common::build_test_app(pool);
    let body = serde_json::json!({ "refresh_token": "not-a-real-token" });
    let response = post_json(app, "/api/v1/auth/refresh", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn logout_revokes_access_token(pool: PgPool) {
    create_user(&pool, "logoutuser", "member").await;
    let app = common::build_test_app(pool);
    let token = login(&app, "logoutuser").await;

    let response = get_auth(app.clone(), "/api/v1/auth/me", &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response =
        post_json_auth(app.clone(), "/api/v1/auth/logout", serde_json::json!({}), &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(app, "/api/v1/auth/me", &token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn me_requires_auth_and_lists_permissions(pool: PgPool) {
    create_user(&pool, "coord", "coordinator").await;
    let app = common::build_test_app(pool);

    let response = get(app.clone(), "/api/v1/auth/me").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let token = login(&app, "coord").await;
    let json = body_json(get_auth(app, "/api/v1/auth/me", &token).await).await;
    assert_eq!(json["username"], "coord");
    assert_eq!(json["role"], "coordinator");
    let perms = json["permissions"].as_array().unwrap();
    assert!(perms.contains(&serde_json::json!("requests.manage")));
    assert!(!perms.contains(&serde_json::json!("smtp.manage")));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_me_changes_profile(pool: PgPool) {
    create_user(&pool, "profile", "member").await;
    let app = common::build_test_app(pool);
    let token = login(&app, "profile").await;

    let body = serde_json::json!({ "full_name": "Pat Example" });
    let response = put_json_auth(app, "/api/v1/auth/me", body, &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["full_name"], "Pat Example");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn change_password_requires_current_password(pool: PgPool) {
    create_user(&pool, "changer", "member").await;
    let app = common::build_test_app(pool);
    let token = login(&app, "changer").await;

    let body = serde_json::json!({
        "current_password": "wrong_password_1",
        "new_password": "brand_new_pass_42",
    });
    let response =
        post_json_auth(app.clone(), "/api/v1/auth/change-password", body, &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = serde_json::json!({
        "current_password": TEST_PASSWORD,
        "new_password": "brand_new_pass_42",
    });
    let response =
        post_json_auth(app.clone(), "/api/v1/auth/change-password", body, &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let body = serde_json::json!({ "username": "changer", "password": "brand_new_pass_42" });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn forgot_password_always_accepts(pool: PgPool) {
    create_user(&pool, "forgetful", "member").await;
    let app = common::build_test_app(pool);

    for email in ["forgetful@test.com", "nobody@test.com"] {
        let body = serde_json::json!({ "email": email });
        let response = post_json(app.clone(), "/api/v1/auth/forgot-password", body).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn reset_password_rejects_unknown_token(pool: PgPool) {
    let app = common::build_test_app(pool);
    let body = serde_json::json!({ "token": "bogus", "new_password": "another_pass_99" });
    let response = post_json(app, "/api/v1/auth/reset-password", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
