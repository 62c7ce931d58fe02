//! Media-lab event bus, audit persistence, and email delivery.
//!
//! - [`EventBus`] -- in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`] -- the canonical domain event envelope.
//! - [`AuditPersistence`] -- background service that writes every event to
//!   the `audit_logs` table.
//! - [`templates`] -- transactional email templates.
//! - [`delivery`] -- SMTP email delivery.

pub mod bus;
pub mod delivery;
pub mod persistence;
pub mod templates;

pub use bus::{event_types, EventBus, PlatformEvent};
pub use delivery::email::{EmailConfig, EmailDelivery, EmailError};
pub use persistence::AuditPersistence;
pub use templates::{EmailTemplate, RenderedEmail};
