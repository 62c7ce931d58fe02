pub mod auth;
pub mod content;
pub mod health;
pub mod notifications;
pub mod org;
pub mod projects;
pub mod requests;
pub mod roles;
pub mod smtp;
pub mod users;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                               WebSocket (token via ?token= or cookie)
///
/// /auth/login                       login (public)
/// /auth/refresh                     refresh (public)
/// /auth/logout                      logout
/// /auth/forgot-password             request reset email (public)
/// /auth/reset-password              consume reset token (public)
/// /auth/change-password             change own password
/// /auth/me                          get, update own profile
///
/// /users                            list, create
/// /users/{id}                       get, update, delete
/// /users/{id}/activate              activate (POST)
/// /users/{id}/deactivate            deactivate (POST)
/// /users/{id}/reset-password        admin password reset (POST)
///
/// /roles                            list, create
/// /roles/{id}                       get, update, delete
/// /roles/{id}/permissions           get, replace
/// /permissions                      permission catalogue
///
/// /areas                            list, create
/// /areas/{id}                       get, update, delete
/// /areas/{id}/departments           list departments
/// /departments                      list (?area_id), create
/// /departments/{id}                 get, update, delete
/// /departments/{id}/services        list services
/// /services                         list, create
/// /services/{id}                    get, update, delete
///
/// /requests                         list, create
/// /requests/{id}                    get, update, delete
/// /requests/{id}/status             change status (POST)
/// /requests/{id}/assign             assign (POST)
///
/// /projects                         list, create
/// /projects/{id}                    get, update, delete
/// /projects/{id}/tasks              list (?status), create
/// /tasks/{id}                       get, update, delete
/// /tasks/{id}/status                change status (POST)
///
/// /content                          list, create
/// /content/slug/{slug}              get by slug
/// /content/{id}                     get, update, delete
/// /content/{id}/publish             publish (POST)
/// /content/{id}/archive             archive (POST)
/// /content/{id}/videos              list, create
/// /content/{id}/photos              list, create
/// /videos/{id}                      update, delete
/// /photos/{id}                      update, delete
///
/// /notifications                    list (?unread_only, limit, offset)
/// /notifications/unread-count       unread count
/// /notifications/read-all           mark all read (POST)
/// /notifications/{id}/read          mark read (POST)
/// /notifications/{id}               delete
///
/// /smtp                             list, create
/// /smtp/test                        send test email (POST)
/// /smtp/{id}                        get, update, delete
/// /smtp/{id}/activate               activate (POST)
///
/// /audit-logs                       query audit trail
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_handler))
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/roles", roles::router())
        .route("/permissions", get(handlers::roles::list_permissions))
        .nest("/areas", org::areas_router())
        .nest("/departments", org::departments_router())
        .nest("/services", org::services_router())
        .nest("/requests", requests::router())
        .nest("/projects", projects::router())
        .nest("/tasks", projects::tasks_router())
        .nest("/content", content::router())
        .nest("/videos", content::videos_router())
        .nest("/photos", content::photos_router())
        .nest("/notifications", notifications::router())
        .nest("/smtp", smtp::router())
        .route("/audit-logs", get(handlers::audit::list))
}
