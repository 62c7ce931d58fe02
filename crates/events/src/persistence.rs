//! Audit trail persistence service.
//!
//! [`AuditPersistence`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! broadcast channel and appends every received [`PlatformEvent`] to the
//! `audit_logs` table with sensitive payload fields redacted. It runs as a
//! long-lived background task and stops when the bus sender is dropped.

use medialab_core::audit::{action_for_event, redact_sensitive_fields};
use medialab_db::models::audit::{AuditLog, CreateAuditLog};
use medialab_db::repositories::AuditLogRepo;
use medialab_db::DbPool;
use tokio::sync::broadcast;

use crate::bus::PlatformEvent;

/// Background service that writes platform events to the audit log.
pub struct AuditPersistence;

impl AuditPersistence {
    /// Run the persistence loop until the channel closes.
    pub async fn run(pool: DbPool, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = Self::persist(&pool, &event).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            "Failed to persist audit entry"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Audit persistence lagged, some events were not recorded"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, audit persistence shutting down");
                    break;
                }
            }
        }
    }

    /// Map an event to its audit row.
    pub fn to_entry(event: &PlatformEvent) -> CreateAuditLog {
        let mut details = redact_sensitive_fields(&event.payload);
        if let serde_json::Value::Object(map) = &mut details {
            map.insert(
                "event_type".to_string(),
                serde_json::Value::String(event.event_type.clone()),
            );
        }
        CreateAuditLog {
            user_id: event.actor_user_id,
            action_type: action_for_event(&event.event_type).to_string(),
            entity_type: event.source_entity_type.clone(),
            entity_id: event.source_entity_id,
            details_json: Some(details),
            ip_address: event.ip_address.clone(),
        }
    }

    /// Write a single event to `audit_logs`.
    pub async fn persist(pool: &DbPool, event: &PlatformEvent) -> Result<AuditLog, sqlx::Error> {
        AuditLogRepo::insert(pool, &Self::to_entry(event)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::event_types;

    #[test]
    fn entry_redacts_and_maps_action() {
        let event = PlatformEvent::new(event_types::PASSWORD_CHANGED)
            .with_source("user", 3)
            .with_actor(3)
            .with_ip(Some("10.0.0.1".to_string()))
            .with_payload(serde_json::json!({"new_password": "s3cret!", "username": "ann"}));

        let entry = AuditPersistence::to_entry(&event);
        assert_eq!(entry.action_type, "password_change");
        assert_eq!(entry.entity_type.as_deref(), Some("user"));
        assert_eq!(entry.entity_id, Some(3));
        assert_eq!(entry.ip_address.as_deref(), Some("10.0.0.1"));

        let details = entry.details_json.unwrap();
        assert_eq!(details["new_password"], "[REDACTED]");
        assert_eq!(details["username"], "ann");
        assert_eq!(details["event_type"], "auth.password_changed");
    }
}
