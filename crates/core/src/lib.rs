//! Domain constants, validation rules, and small pure helpers shared by the
//! repository, event, and API layers. Nothing in this crate performs I/O.

pub mod audit;
pub mod channels;
pub mod content;
pub mod crypto;
pub mod error;
pub mod hashing;
pub mod pagination;
pub mod permissions;
pub mod project;
pub mod roles;
pub mod service_request;
pub mod types;
pub mod validation;
