//! Input validation helpers shared by the API layer.
//!
//! Every validator returns `Err(String)` with a human-readable message so the
//! caller can wrap it in `CoreError::Validation`.

use std::sync::LazyLock;

use regex::Regex;

/// Minimum username length.
pub const USERNAME_MIN_LEN: usize = 3;

/// Maximum username length.
pub const USERNAME_MAX_LEN: usize = 50;

/// Minimum password length.
pub const PASSWORD_MIN_LEN: usize = 8;

/// Maximum length of names (areas, departments, services, roles, titles).
pub const NAME_MAX_LEN: usize = 200;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("valid regex"));

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex")
});

static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid regex"));

/// Validate a username: 3-50 characters of letters, digits, `_`, `.`, `-`.
pub fn validate_username(username: &str) -> Result<(), String> {
    let len = username.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        return Err(format!(
            "Username must be between {USERNAME_MIN_LEN} and {USERNAME_MAX_LEN} characters"
        ));
    }
    if !USERNAME_RE.is_match(username) {
        return Err(
            "Username may only contain letters, digits, '_', '.' and '-'".to_string(),
        );
    }
    Ok(())
}

/// Validate the basic shape of an email address.
pub fn validate_email(email: &str) -> Result<(), String> {
    if EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(format!("'{email}' is not a valid email address"))
    }
}

/// Validate password strength: minimum length plus at least one letter and
/// one digit.
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err(format!(
            "Password must be at least {PASSWORD_MIN_LEN} characters long"
        ));
    }
    let has_letter = password.chars().any(|c| c.is_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        return Err("Password must contain at least one letter and one digit".to_string());
    }
    Ok(())
}

/// Validate a display name: non-blank and at most [`NAME_MAX_LEN`] characters.
///
/// `field` is used in the error message (e.g. `"Area name"`).
pub fn validate_name(field: &str, value: &str) -> Result<(), String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{field} must not be empty"));
    }
    if trimmed.chars().count() > NAME_MAX_LEN {
        return Err(format!("{field} must be at most {NAME_MAX_LEN} characters"));
    }
    Ok(())
}

/// Validate a URL slug (`lowercase-words-and-digits`).
pub fn validate_slug(slug: &str) -> Result<(), String> {
    if SLUG_RE.is_match(slug) {
        Ok(())
    } else {
        Err(format!(
            "'{slug}' is not a valid slug (lowercase letters, digits and single dashes)"
        ))
    }
}

/// Validate that a URL uses the http or https scheme and has a host part.
pub fn validate_http_url(url: &str) -> Result<(), String> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or_else(|| format!("'{url}' must start with http:// or https://"))?;
    let host = rest.split(['/', '?', '#']).next().unwrap_or("");
    if host.is_empty() {
        return Err(format!("'{url}' has no host"));
    }
    Ok(())
}
