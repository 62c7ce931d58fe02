//! Integration tests for repository CRUD operations.
//!
//! Exercises the repository layer against a real database:
//! - Organization hierarchy (area -> department -> service)
//! - Unique constraint and foreign key violations
//! - Service request status and assignment updates
//! - Projects, tasks, content and media
//! - Role permission grants and SMTP activation

use medialab_db::models::area::{CreateArea, UpdateArea};
use medialab_db::models::content::CreateContent;
use medialab_db::models::department::CreateDepartment;
use medialab_db::models::media::{CreatePhoto, CreateVideo};
use medialab_db::models::notification::CreateNotification;
use medialab_db::models::project::CreateProject;
use medialab_db::models::service::CreateService;
use medialab_db::models::service_request::CreateServiceRequest;
use medialab_db::models::session::CreateSession;
use medialab_db::models::smtp::CreateSmtpConfig;
use medialab_db::models::task::CreateTask;
use medialab_db::models::user::{CreateUser, UserFilter};
use medialab_db::repositories::{
    AreaRepo, ContentRepo, DepartmentRepo, NotificationRepo, PhotoRepo, ProjectRepo, RoleRepo,
    ServiceRepo, ServiceRequestRepo, SessionRepo, SmtpConfigRepo, TaskRepo, UserRepo, VideoRepo,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn role_id(pool: &PgPool, name: &str) -> i64 {
    RoleRepo::find_by_name(pool, name).await.unwrap().unwrap().id
}

async fn new_user(pool: &PgPool, username: &str) -> i64 {
    let member = role_id(pool, "member").await;
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "$argon2id$placeholder".to_string(),
            full_name: None,
            role_id: member,
            department_id: None,
        },
    )
    .await
    .unwrap()
    .id
}

fn new_area(name: &str) -> CreateArea {
    CreateArea {
        name: name.to_string(),
        description: None,
    }
}

async fn new_service(pool: &PgPool) -> i64 {
    let area = AreaRepo::create(pool, &new_area("Production")).await.unwrap();
    let dept = DepartmentRepo::create(
        pool,
        &CreateDepartment {
            area_id: area.id,
            name: "Video".to_string(),
            description: None,
            head_user_id: None,
        },
    )
    .await
    .unwrap();
    ServiceRepo::create(
        pool,
        &CreateService {
            department_id: dept.id,
            name: "Event coverage".to_string(),
            description: None,
            is_active: None,
        },
    )
    .await
    .unwrap()
    .id
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

// ---------------------------------------------------------------------------
// Test: Seed data
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_seeded_roles_have_permissions(pool: PgPool) {
    medialab_db::health_check(&pool).await.unwrap();

    let admin = RoleRepo::permission_codes_by_name(&pool, "admin").await.unwrap();
    assert_eq!(admin, vec!["*".to_string()]);

    let coordinator = RoleRepo::permission_codes_by_name(&pool, "coordinator")
        .await
        .unwrap();
    assert!(coordinator.contains(&"requests.manage".to_string()));
    assert!(!coordinator.contains(&"smtp.manage".to_string()));
}

// ---------------------------------------------------------------------------
// Test: Users
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_user_create_resolves_role_name(pool: PgPool) {
    let id = new_user(&pool, "alice").await;
    let user = UserRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(user.role, "member");
    assert!(user.is_active);
    assert_eq!(user.failed_login_count, 0);

    let by_email = UserRepo::find_by_email(&pool, "ALICE@example.com").await.unwrap();
    assert_eq!(by_email.map(|u| u.id), Some(id));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_username_rejected(pool: PgPool) {
    new_user(&pool, "bob").await;
    let member = role_id(&pool, "member").await;
    let err = UserRepo::create(
        &pool,
        &CreateUser {
            username: "bob".to_string(),
            email: "other@example.com".to_string(),
            password_hash: "x".to_string(),
            full_name: None,
            role_id: member,
            department_id: None,
        },
    )
    .await
    .unwrap_err();
    assert!(is_unique_violation(&err));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_failed_login_counter_and_reset(pool: PgPool) {
    let id = new_user(&pool, "carol").await;
    assert_eq!(UserRepo::increment_failed_login(&pool, id).await.unwrap(), 1);
    assert_eq!(UserRepo::increment_failed_login(&pool, id).await.unwrap(), 2);

    UserRepo::record_successful_login(&pool, id).await.unwrap();
    let user = UserRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(user.failed_login_count, 0);
    assert!(user.last_login_at.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_user_list_search(pool: PgPool) {
    new_user(&pool, "dana").await;
    new_user(&pool, "erin").await;
    let filter = UserFilter {
        search: Some("dan".to_string()),
        ..Default::default()
    };
    let users = UserRepo::list(&pool, &filter, 25, 0).await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].username, "dana");
}

// ---------------------------------------------------------------------------
// Test: Organization
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_area_unique_name(pool: PgPool) {
    AreaRepo::create(&pool, &new_area("Communications")).await.unwrap();
    let err = AreaRepo::create(&pool, &new_area("Communications"))
        .await
        .unwrap_err();
    assert!(is_unique_violation(&err));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_area_update_is_partial(pool: PgPool) {
    let area = AreaRepo::create(
        &pool,
        &CreateArea {
            name: "Design".to_string(),
            description: Some("Visual work".to_string()),
        },
    )
    .await
    .unwrap();

    let updated = AreaRepo::update(
        &pool,
        area.id,
        &UpdateArea {
            name: Some("Design Studio".to_string()),
            description: None,
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(updated.name, "Design Studio");
    assert_eq!(updated.description.as_deref(), Some("Visual work"));
    assert!(updated.updated_at >= area.updated_at);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_department_requires_existing_area(pool: PgPool) {
    let err = DepartmentRepo::create(
        &pool,
        &CreateDepartment {
            area_id: 999_999,
            name: "Ghost".to_string(),
            description: None,
            head_user_id: None,
        },
    )
    .await
    .unwrap_err();
    assert!(
        matches!(&err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23503")),
        "expected FK violation, got {err:?}"
    );
}

// ---------------------------------------------------------------------------
// Test: Service requests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_request_status_guard(pool: PgPool) {
    let service_id = new_service(&pool).await;
    let requester = new_user(&pool, "frank").await;
    let request = ServiceRequestRepo::create(
        &pool,
        &CreateServiceRequest {
            service_id,
            requester_id: requester,
            title: "Cover the graduation".to_string(),
            description: None,
            priority: "high".to_string(),
            due_date: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(request.status, "pending");

    let approved = ServiceRequestRepo::set_status(&pool, request.id, "pending", "approved", None)
        .await
        .unwrap();
    assert_eq!(approved.map(|r| r.status), Some("approved".to_string()));

    // Stale expected status: no row changes.
    let stale = ServiceRequestRepo::set_status(&pool, request.id, "pending", "rejected", None)
        .await
        .unwrap();
    assert!(stale.is_none());

    let assignee = new_user(&pool, "gina").await;
    let assigned = ServiceRequestRepo::assign(&pool, request.id, Some(assignee))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(assigned.assignee_id, Some(assignee));
}

// ---------------------------------------------------------------------------
// Test: Projects and tasks
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_task_completion_timestamp(pool: PgPool) {
    let project = ProjectRepo::create(
        &pool,
        &CreateProject {
            name: "Spring campaign".to_string(),
            description: None,
            request_id: None,
            lead_id: None,
            status: None,
            start_date: None,
            end_date: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(project.status, "planning");

    let task = TaskRepo::create(
        &pool,
        &CreateTask {
            project_id: project.id,
            assignee_id: None,
            title: "Storyboard".to_string(),
            description: None,
            status: None,
            due_date: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(task.status, "todo");
    assert!(task.completed_at.is_none());

    let done = TaskRepo::set_status(&pool, task.id, "done").await.unwrap().unwrap();
    assert!(done.completed_at.is_some());

    let reopened = TaskRepo::set_status(&pool, task.id, "review").await.unwrap().unwrap();
    assert!(reopened.completed_at.is_none());

    let tasks = TaskRepo::list_by_project(&pool, project.id, None).await.unwrap();
    assert_eq!(tasks.len(), 1);
}

// ---------------------------------------------------------------------------
// Test: Content and media
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_content_publish_and_media_ordering(pool: PgPool) {
    let content = ContentRepo::create(
        &pool,
        &CreateContent {
            title: "Open day".to_string(),
            slug: "open-day".to_string(),
            body: None,
            kind: "gallery".to_string(),
            author_id: None,
            area_id: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(content.status, "draft");
    assert!(ContentRepo::slug_exists(&pool, "open-day").await.unwrap());

    let published = ContentRepo::publish(&pool, content.id).await.unwrap().unwrap();
    assert_eq!(published.status, "published");
    let first_published_at = published.published_at;
    assert!(first_published_at.is_some());

    let again = ContentRepo::publish(&pool, content.id).await.unwrap().unwrap();
    assert_eq!(again.published_at, first_published_at);

    for url in ["https://cdn.example.com/a.jpg", "https://cdn.example.com/b.jpg"] {
        PhotoRepo::create(
            &pool,
            &CreatePhoto {
                content_id: content.id,
                url: url.to_string(),
                caption: None,
                sort_order: None,
            },
        )
        .await
        .unwrap();
    }
    let photos = PhotoRepo::list_by_content(&pool, content.id).await.unwrap();
    assert_eq!(photos.iter().map(|p| p.sort_order).collect::<Vec<_>>(), vec![0, 1]);

    let video = VideoRepo::create(
        &pool,
        &CreateVideo {
            content_id: content.id,
            title: "Highlights".to_string(),
            url: "https://youtu.be/abc".to_string(),
            provider: "youtube".to_string(),
            duration_secs: Some(90),
            thumbnail_url: None,
            sort_order: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(video.sort_order, 0);
}

// ---------------------------------------------------------------------------
// Test: Notifications
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_notification_read_flow(pool: PgPool) {
    let user = new_user(&pool, "hank").await;
    for title in ["One", "Two"] {
        NotificationRepo::create(
            &pool,
            &CreateNotification {
                user_id: user,
                kind: "request.created".to_string(),
                title: title.to_string(),
                body: None,
                link: None,
            },
        )
        .await
        .unwrap();
    }
    assert_eq!(NotificationRepo::unread_count(&pool, user).await.unwrap(), 2);
    assert_eq!(NotificationRepo::mark_all_read(&pool, user).await.unwrap(), 2);
    assert_eq!(NotificationRepo::unread_count(&pool, user).await.unwrap(), 0);
}

// ---------------------------------------------------------------------------
// Test: SMTP activation
// ---------------------------------------------------------------------------

fn new_smtp(name: &str) -> CreateSmtpConfig {
    CreateSmtpConfig {
        name: name.to_string(),
        host: "smtp.example.com".to_string(),
        port: 587,
        username: None,
        password_encrypted: None,
        from_address: "noreply@example.com".to_string(),
        from_name: None,
        use_starttls: true,
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_smtp_single_active_config(pool: PgPool) {
    let a = SmtpConfigRepo::create(&pool, &new_smtp("primary")).await.unwrap();
    let b = SmtpConfigRepo::create(&pool, &new_smtp("backup")).await.unwrap();
    assert!(!a.is_active);

    SmtpConfigRepo::activate(&pool, a.id).await.unwrap().unwrap();
    SmtpConfigRepo::activate(&pool, b.id).await.unwrap().unwrap();

    let active = SmtpConfigRepo::find_active(&pool).await.unwrap().unwrap();
    assert_eq!(active.id, b.id);
    assert!(!SmtpConfigRepo::find_by_id(&pool, a.id).await.unwrap().unwrap().is_active);

    assert!(SmtpConfigRepo::activate(&pool, 999_999).await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Test: Sessions
// ---------------------------------------------------------------------------

fn new_session(user_id: i64, hash: &str, expires_in: chrono::Duration) -> CreateSession {
    CreateSession {
        user_id,
        refresh_token_hash: hash.to_string(),
        expires_at: chrono::Utc::now() + expires_in,
        user_agent: Some("test-agent".to_string()),
        ip_address: None,
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_session_rotation_consumes_once(pool: PgPool) {
    let user = new_user(&pool, "sessions").await;
    let week = chrono::Duration::days(7);
    SessionRepo::create(&pool, &new_session(user, "hash-a", week)).await.unwrap();
    SessionRepo::create(&pool, &new_session(user, "hash-b", week)).await.unwrap();
    SessionRepo::create(&pool, &new_session(user, "hash-old", -week)).await.unwrap();
    assert_eq!(SessionRepo::count_active_for_user(&pool, user).await.unwrap(), 2);

    let rotated = SessionRepo::rotate(&pool, "hash-a").await.unwrap().unwrap();
    assert_eq!(rotated.user_id, user);
    assert!(rotated.is_revoked);
    assert_eq!(rotated.user_agent.as_deref(), Some("test-agent"));
    assert!(SessionRepo::rotate(&pool, "hash-a").await.unwrap().is_none());
    assert!(SessionRepo::rotate(&pool, "hash-old").await.unwrap().is_none());
    assert!(SessionRepo::rotate(&pool, "unknown").await.unwrap().is_none());
    assert_eq!(SessionRepo::count_active_for_user(&pool, user).await.unwrap(), 1);

    // Revoked and expired rows go, the live one stays.
    assert_eq!(SessionRepo::cleanup_expired(&pool).await.unwrap(), 2);
    assert_eq!(SessionRepo::revoke_all_for_user(&pool, user).await.unwrap(), 1);
    assert_eq!(SessionRepo::count_active_for_user(&pool, user).await.unwrap(), 0);
}
