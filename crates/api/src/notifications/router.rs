//! Event-to-notification routing engine.
//!
//! Handlers publish events with the payload keys listed below; the router
//! reads them to build notifications.
//!
//! | Event | Payload | Audience | Email |
//! |---|---|---|---|
//! | `request.created` | `title`, `department_id` | active admins and coordinators, plus a live push to `department:{id}` | - |
//! | `request.status_changed` | `title`, `requester_id`, `status`, `note` | requester | request status |
//! | `request.assigned` | `title`, `assignee_id` | assignee | - |
//! | `task.assigned` | `title`, `assignee_id`, `project_id`, `project_name` | assignee | task assigned |
//! | `content.published` | `title`, `slug` | `global` room | - |
//! | `user.created` | `username` | the new user | welcome |
//!
//! The actor never notifies themselves.

use std::sync::Arc;

use medialab_core::channels::{department_room, user_room, ROOM_GLOBAL};
use medialab_core::roles::{ROLE_ADMIN, ROLE_COORDINATOR};
use medialab_core::types::DbId;
use medialab_db::models::notification::CreateNotification;
use medialab_db::models::user::User;
use medialab_db::repositories::{NotificationRepo, UserRepo};
use medialab_db::DbPool;
use medialab_events::{event_types, EmailTemplate, PlatformEvent};
use tokio::sync::broadcast;

use crate::notifications::mail;
use crate::ws::protocol::ServerMessage;
use crate::ws::WsManager;

/// Who receives a routed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    Users(Vec<DbId>),
    Roles(&'static [&'static str]),
    /// Pushed to the `global` room only, without stored notifications.
    Global,
}

/// What to deliver for one event.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub audience: Audience,
    pub kind: String,
    pub title: String,
    pub body: Option<String>,
    /// Path within the frontend, e.g. `/requests/4`.
    pub link: Option<String>,
    pub email: Option<EmailTemplate>,
    /// Template variables shared by every recipient; `name` is added per user.
    pub vars: Vec<(&'static str, String)>,
    /// Room that also receives a live copy, without stored notifications.
    pub room: Option<String>,
}

/// Build the delivery plan for `event`, or `None` if it notifies nobody.
pub fn plan(event: &PlatformEvent, frontend_url: &str) -> Option<Delivery> {
    let title = event.payload_str("title").unwrap_or_default().to_string();
    let source_id = event.source_entity_id;

    let delivery = match event.event_type.as_str() {
        event_types::REQUEST_CREATED => Delivery {
            audience: Audience::Roles(&[ROLE_ADMIN, ROLE_COORDINATOR]),
            kind: event.event_type.clone(),
            title: format!("New request: {title}"),
            body: None,
            link: source_id.map(|id| format!("/requests/{id}")),
            email: None,
            vars: vec![],
            room: event.payload_id("department_id").map(department_room),
        },
        event_types::REQUEST_STATUS_CHANGED => {
            let requester = event.payload_id("requester_id")?;
            let status = event.payload_str("status").unwrap_or_default().to_string();
            let note = event.payload_str("note").unwrap_or_default().to_string();
            let link = source_id.map(|id| format!("/requests/{id}"));
            Delivery {
                audience: Audience::Users(vec![requester]),
                kind: event.event_type.clone(),
                title: format!("Request \"{title}\" is now {status}"),
                body: (!note.is_empty()).then(|| note.clone()),
                email: Some(EmailTemplate::RequestStatus),
                vars: vec![
                    ("request_title", title.clone()),
                    ("status", status),
                    ("note", note),
                    ("request_url", absolute(frontend_url, link.as_deref())),
                ],
                link,
                room: None,
            }
        }
        event_types::REQUEST_ASSIGNED => Delivery {
            audience: Audience::Users(vec![event.payload_id("assignee_id")?]),
            kind: event.event_type.clone(),
            title: format!("Request assigned to you: {title}"),
            body: None,
            link: source_id.map(|id| format!("/requests/{id}")),
            email: None,
            vars: vec![],
            room: None,
        },
        event_types::TASK_ASSIGNED => {
            let assignee = event.payload_id("assignee_id")?;
            let project_name = event
                .payload_str("project_name")
                .unwrap_or_default()
                .to_string();
            let link = event
                .payload_id("project_id")
                .map(|id| format!("/projects/{id}"));
            Delivery {
                audience: Audience::Users(vec![assignee]),
                kind: event.event_type.clone(),
                title: format!("New task: {title}"),
                body: (!project_name.is_empty()).then(|| format!("Project: {project_name}")),
                email: Some(EmailTemplate::TaskAssigned),
                vars: vec![
                    ("task_title", title.clone()),
                    ("project_name", project_name),
                    ("task_url", absolute(frontend_url, link.as_deref())),
                ],
                link,
                room: None,
            }
        }
        event_types::CONTENT_PUBLISHED => Delivery {
            audience: Audience::Global,
            kind: event.event_type.clone(),
            title: format!("Published: {title}"),
            body: None,
            link: event.payload_str("slug").map(|slug| format!("/content/{slug}")),
            email: None,
            vars: vec![],
            room: None,
        },
        event_types::USER_CREATED => Delivery {
            audience: Audience::Users(vec![source_id?]),
            kind: event.event_type.clone(),
            title: "Welcome to Media Lab".to_string(),
            body: None,
            link: None,
            email: Some(EmailTemplate::Welcome),
            vars: vec![
                (
                    "username",
                    event.payload_str("username").unwrap_or_default().to_string(),
                ),
                ("login_url", format!("{frontend_url}/login")),
            ],
            room: None,
        },
        _ => return None,
    };
    Some(delivery)
}

fn absolute(frontend_url: &str, link: Option<&str>) -> String {
    format!("{frontend_url}{}", link.unwrap_or_default())
}

/// Routes platform events to user notifications.
pub struct NotificationRouter {
    pool: DbPool,
    ws_manager: Arc<WsManager>,
    secret: String,
    frontend_url: String,
}

impl NotificationRouter {
    pub fn new(
        pool: DbPool,
        ws_manager: Arc<WsManager>,
        secret: impl Into<String>,
        frontend_url: impl Into<String>,
    ) -> Self {
        Self {
            pool,
            ws_manager,
            secret: secret.into(),
            frontend_url: frontend_url.into(),
        }
    }

    /// Run the main routing loop.
    ///
    /// The loop exits when the channel is closed (i.e. the
    /// [`EventBus`](medialab_events::EventBus) is dropped).
    pub async fn run(self, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = self.route_event(&event).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            "Failed to route event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    /// Route a single event to every affected user.
    pub async fn route_event(&self, event: &PlatformEvent) -> Result<(), sqlx::Error> {
        let Some(delivery) = plan(event, &self.frontend_url) else {
            return Ok(());
        };

        if let Some(room) = delivery.room.as_deref() {
            self.push_live(room, &delivery, event).await;
        }

        let recipients = match &delivery.audience {
            Audience::Global => {
                self.push_live(ROOM_GLOBAL, &delivery, event).await;
                return Ok(());
            }
            Audience::Users(ids) => {
                let mut users = Vec::with_capacity(ids.len());
                for id in ids {
                    if let Some(user) = UserRepo::find_by_id(&self.pool, *id).await? {
                        users.push(user);
                    }
                }
                users
            }
            Audience::Roles(roles) => {
                let mut users = Vec::new();
                for role in roles.iter() {
                    users.extend(UserRepo::list_active_by_role(&self.pool, role).await?);
                }
                users
            }
        };

        for user in recipients
            .iter()
            .filter(|u| event.actor_user_id != Some(u.id))
        {
            self.deliver(user, &delivery).await?;
        }
        Ok(())
    }

    /// Push an unstored notification to every connection in `room`.
    async fn push_live(&self, room: &str, delivery: &Delivery, event: &PlatformEvent) {
        let message = ServerMessage::Notification(serde_json::json!({
            "kind": delivery.kind,
            "title": delivery.title,
            "body": delivery.body,
            "link": delivery.link,
            "created_at": event.timestamp,
        }));
        let sent = self
            .ws_manager
            .broadcast_to_room(room, message.to_message())
            .await;
        tracing::debug!(sent, room, event_type = %event.event_type, "Broadcast notification");
    }

    /// Store the notification, push it to the user's room, and email it.
    async fn deliver(&self, user: &User, delivery: &Delivery) -> Result<(), sqlx::Error> {
        let notification = NotificationRepo::create(
            &self.pool,
            &CreateNotification {
                user_id: user.id,
                kind: delivery.kind.clone(),
                title: delivery.title.clone(),
                body: delivery.body.clone(),
                link: delivery.link.clone(),
            },
        )
        .await?;

        let payload = serde_json::to_value(&notification).unwrap_or_default();
        self.ws_manager
            .broadcast_to_room(
                &user_room(user.id),
                ServerMessage::Notification(payload).to_message(),
            )
            .await;

        if let Some(template) = delivery.email {
            let mut vars: std::collections::HashMap<&str, String> =
                delivery.vars.iter().cloned().collect();
            vars.insert("name", user.display_name());
            mail::spawn_send(
                self.pool.clone(),
                self.secret.clone(),
                user.email.clone(),
                template.render(&vars),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const FRONTEND: &str = "https://lab.example.com";

    #[test]
    fn status_change_targets_requester_with_email() {
        let event = PlatformEvent::new(event_types::REQUEST_STATUS_CHANGED)
            .with_source("service_request", 12)
            .with_actor(1)
            .with_payload(json!({
                "title": "Camera rental",
                "requester_id": 7,
                "status": "approved",
                "note": "",
            }));
        let delivery = plan(&event, FRONTEND).unwrap();
        assert_eq!(delivery.audience, Audience::Users(vec![7]));
        assert_eq!(delivery.email, Some(EmailTemplate::RequestStatus));
        assert_eq!(delivery.link.as_deref(), Some("/requests/12"));
        assert_eq!(delivery.body, None);
        assert!(delivery
            .vars
            .contains(&("request_url", format!("{FRONTEND}/requests/12"))));
    }

    #[test]
    fn status_change_without_requester_is_dropped() {
        let event = PlatformEvent::new(event_types::REQUEST_STATUS_CHANGED)
            .with_payload(json!({"title": "x"}));
        assert!(plan(&event, FRONTEND).is_none());
    }

    #[test]
    fn new_requests_go_to_managers() {
        let event = PlatformEvent::new(event_types::REQUEST_CREATED)
            .with_source("service_request", 3)
            .with_payload(json!({"title": "Edit reel"}));
        let delivery = plan(&event, FRONTEND).unwrap();
        assert_eq!(
            delivery.audience,
            Audience::Roles(&[ROLE_ADMIN, ROLE_COORDINATOR])
        );
        assert_eq!(delivery.title, "New request: Edit reel");
        assert_eq!(delivery.room, None);
    }

    #[test]
    fn new_requests_reach_the_owning_department() {
        let event = PlatformEvent::new(event_types::REQUEST_CREATED)
            .with_source("service_request", 3)
            .with_payload(json!({"title": "Edit reel", "department_id": 4}));
        let delivery = plan(&event, FRONTEND).unwrap();
        assert_eq!(delivery.room.as_deref(), Some("department:4"));
    }

    #[test]
    fn task_assignment_links_project() {
        let event = PlatformEvent::new(event_types::TASK_ASSIGNED)
            .with_source("task", 5)
            .with_payload(json!({
                "title": "Color grade",
                "assignee_id": 9,
                "project_id": 2,
                "project_name": "Spring show",
            }));
        let delivery = plan(&event, FRONTEND).unwrap();
        assert_eq!(delivery.audience, Audience::Users(vec![9]));
        assert_eq!(delivery.link.as_deref(), Some("/projects/2"));
        assert_eq!(delivery.body.as_deref(), Some("Project: Spring show"));
    }

    #[test]
    fn published_content_is_global() {
        let event = PlatformEvent::new(event_types::CONTENT_PUBLISHED)
            .with_payload(json!({"title": "Gallery", "slug": "gallery"}));
        let delivery = plan(&event, FRONTEND).unwrap();
        assert_eq!(delivery.audience, Audience::Global);
        assert_eq!(delivery.link.as_deref(), Some("/content/gallery"));
    }

    #[test]
    fn user_created_sends_welcome() {
        let event = PlatformEvent::new(event_types::USER_CREATED)
            .with_source("user", 21)
            .with_payload(json!({"username": "ana"}));
        let delivery = plan(&event, FRONTEND).unwrap();
        assert_eq!(delivery.audience, Audience::Users(vec![21]));
        assert_eq!(delivery.email, Some(EmailTemplate::Welcome));
        assert!(delivery
            .vars
            .contains(&("login_url", format!("{FRONTEND}/login"))));
    }

    #[test]
    fn unrelated_events_are_ignored() {
        let event = PlatformEvent::new(event_types::USER_LOGGED_IN);
        assert!(plan(&event, FRONTEND).is_none());
    }
}
