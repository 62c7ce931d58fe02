//! Content entries, their media, and publication visibility.

mod common;

use axum::http::StatusCode;
use common::{body_json, delete_auth, get, get_auth, post_json_auth, put_json_auth, user_token};
use medialab_api::router::build_app_router;
use medialab_events::event_types;
use serde_json::json;
use sqlx::PgPool;

async fn create_entry(
    app: &axum::Router,
    token: &str,
    body: serde_json::Value,
) -> serde_json::Value {
    let response = post_json_auth(app.clone(), "/api/v1/content", body, token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn slugs_are_derived_and_deduplicated(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_coord, token) = user_token(&pool, &app, "coord", "coordinator").await;

    let body = json!({ "title": "Behind the Scenes!", "kind": "article" });
    let first = create_entry(&app, &token, body).await;
    assert_eq!(first["slug"], "behind-the-scenes");
    assert_eq!(first["status"], "draft");

    let body = json!({ "title": "Behind the scenes", "kind": "article" });
    let second = create_entry(&app, &token, body).await;
    assert_eq!(second["slug"], "behind-the-scenes-2");

    // An explicit slug that is taken is a conflict, not silently renamed.
    let body = json!({ "title": "Other", "slug": "behind-the-scenes", "kind": "video" });
    let response = post_json_auth(app.clone(), "/api/v1/content", body, &token).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = json!({ "title": "Bad kind", "kind": "podcast" });
    let response = post_json_auth(app, "/api/v1/content", body, &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn drafts_are_hidden_until_published(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_coord, writer) = user_token(&pool, &app, "coord", "coordinator").await;
    let (_member, reader) = user_token(&pool, &app, "member1", "member").await;

    let entry = create_entry(&app, &writer, json!({ "title": "Launch", "kind": "gallery" })).await;
    let id = entry["id"].as_i64().unwrap();
    let by_id = format!("/api/v1/content/{id}");
    let by_slug = "/api/v1/content/slug/launch";

    assert_eq!(get(app.clone(), &by_id).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(get_auth(app.clone(), by_slug, &reader).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(get_auth(app.clone(), &by_id, &writer).await.status(), StatusCode::OK);

    let json = body_json(get(app.clone(), "/api/v1/content").await).await;
    assert!(json["data"].as_array().unwrap().is_empty());
    let json = body_json(get_auth(app.clone(), "/api/v1/content", &writer).await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    let response =
        post_json_auth(app.clone(), &format!("{by_id}/publish"), json!({}), &writer).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "published");
    assert!(json["data"]["published_at"].is_string());

    assert_eq!(get(app.clone(), &by_id).await.status(), StatusCode::OK);
    let json = body_json(get(app.clone(), by_slug).await).await;
    assert_eq!(json["data"]["id"], id);

    let response =
        post_json_auth(app.clone(), &format!("{by_id}/archive"), json!({}), &writer).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(get(app, &by_id).await.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn publishing_emits_event_once(pool: PgPool) {
    let config = common::test_config();
    let state = common::test_state(pool.clone(), config.clone());
    let mut events = state.event_bus.subscribe();
    let app = build_app_router(state, &config);
    let (_coord, token) = user_token(&pool, &app, "coord", "coordinator").await;

    let entry = create_entry(&app, &token, json!({ "title": "News", "kind": "article" })).await;
    let uri = format!("/api/v1/content/{}/publish", entry["id"]);
    for _ in 0..2 {
        let response = post_json_auth(app.clone(), &uri, json!({}), &token).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let mut published = 0;
    while let Ok(event) = events.try_recv() {
        if event.event_type == event_types::CONTENT_PUBLISHED {
            assert_eq!(event.payload["slug"], "news");
            published += 1;
        }
    }
    assert_eq!(published, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn members_cannot_write_content(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_member, token) = user_token(&pool, &app, "member1", "member").await;

    let body = json!({ "title": "Mine", "kind": "article" });
    let response = post_json_auth(app.clone(), "/api/v1/content", body, &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = json!({ "title": "Anon", "kind": "article" });
    let response = post_json_auth(app, "/api/v1/content", body, "garbage").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn videos_detect_provider_and_photos_attach(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_coord, token) = user_token(&pool, &app, "coord", "coordinator").await;

    let entry = create_entry(&app, &token, json!({ "title": "Reel", "kind": "video" })).await;
    let id = entry["id"].as_i64().unwrap();

    let videos_uri = format!("/api/v1/content/{id}/videos");
    let body = json!({ "title": "Trailer", "url": "https://www.youtube.com/watch?v=abc123" });
    let response = post_json_auth(app.clone(), &videos_uri, body, &token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let video = body_json(response).await["data"].clone();
    assert_eq!(video["provider"], "youtube");

    let body = json!({ "url": "https://vimeo.com/123456" });
    let uri = format!("/api/v1/videos/{}", video["id"]);
    let response = put_json_auth(app.clone(), &uri, body, &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["provider"], "vimeo");

    let body = json!({ "title": "Bad", "url": "ftp://example.com/file" });
    let response = post_json_auth(app.clone(), &videos_uri, body, &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let photos_uri = format!("/api/v1/content/{id}/photos");
    let body = json!({ "url": "https://cdn.example.com/a.jpg", "caption": "Set" });
    let response = post_json_auth(app.clone(), &photos_uri, body, &token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let photo_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let json = body_json(get_auth(app.clone(), &photos_uri, &token).await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    // Media of a draft are hidden from the public too.
    assert_eq!(get(app.clone(), &videos_uri).await.status(), StatusCode::NOT_FOUND);

    let response = delete_auth(app.clone(), &format!("/api/v1/photos/{photo_id}"), &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = delete_auth(app, &format!("/api/v1/photos/{photo_id}"), &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
