//! Adapters exposing `medialab_core::validation` rules as `validator` custom
//! functions, for use in `#[validate(custom(function = ...))]` attributes on
//! request DTOs.

use std::borrow::Cow;

use medialab_core::{content, project, validation};
use validator::ValidationError;

fn adapt(code: &'static str, result: Result<(), String>) -> Result<(), ValidationError> {
    result.map_err(|msg| ValidationError::new(code).with_message(Cow::Owned(msg)))
}

pub fn username(value: &str) -> Result<(), ValidationError> {
    adapt("username", validation::validate_username(value))
}

pub fn password(value: &str) -> Result<(), ValidationError> {
    adapt("password", validation::validate_password_strength(value))
}

pub fn email(value: &str) -> Result<(), ValidationError> {
    adapt("email", validation::validate_email(value))
}

pub fn name(value: &str) -> Result<(), ValidationError> {
    adapt("name", validation::validate_name("Name", value))
}

pub fn title(value: &str) -> Result<(), ValidationError> {
    adapt("title", validation::validate_name("Title", value))
}

pub fn slug(value: &str) -> Result<(), ValidationError> {
    adapt("slug", validation::validate_slug(value))
}

pub fn http_url(value: &str) -> Result<(), ValidationError> {
    adapt("url", validation::validate_http_url(value))
}

pub fn content_kind(value: &str) -> Result<(), ValidationError> {
    adapt("kind", content::validate_kind(value))
}

pub fn project_status(value: &str) -> Result<(), ValidationError> {
    adapt("status", project::validate_project_status(value))
}

pub fn task_status(value: &str) -> Result<(), ValidationError> {
    adapt("status", project::validate_task_status(value))
}
