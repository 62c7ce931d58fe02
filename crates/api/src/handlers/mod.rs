pub mod areas;
pub mod audit;
pub mod auth;
pub mod content;
pub mod departments;
pub mod media;
pub mod notifications;
pub mod projects;
pub mod requests;
pub mod roles;
pub mod services;
pub mod smtp;
pub mod tasks;
pub mod users;
