//! Media-lab API server library.
//!
//! Exposes config, state, error handling, routes and the WebSocket layer so
//! the binary and the integration tests share one router.

pub mod auth;
pub mod background;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod notifications;
pub mod query;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
pub mod validation;
pub mod ws;
