//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches

pub mod area;
pub mod audit;
pub mod content;
pub mod department;
pub mod media;
pub mod notification;
pub mod password_reset;
pub mod project;
pub mod role;
pub mod service;
pub mod service_request;
pub mod session;
pub mod smtp;
pub mod task;
pub mod token_blacklist;
pub mod user;
