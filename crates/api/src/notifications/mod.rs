//! Notification routing infrastructure.
//!
//! The [`NotificationRouter`] subscribes to the event bus and turns domain
//! events into in-app notifications, WebSocket pushes and emails.
//! [`mail`] holds the shared SMTP send helpers.

pub mod mail;
pub mod router;

pub use router::NotificationRouter;
