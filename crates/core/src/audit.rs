//! Audit logging constants and redaction of sensitive details.

/// Known action types for audit log entries.
pub mod action_types {
    pub const LOGIN: &str = "login";
    pub const LOGIN_FAILED: &str = "login_failed";
    pub const LOGOUT: &str = "logout";
    pub const PASSWORD_CHANGE: &str = "password_change";
    pub const PASSWORD_RESET: &str = "password_reset";
    pub const ENTITY_CREATE: &str = "entity_create";
    pub const ENTITY_UPDATE: &str = "entity_update";
    pub const ENTITY_DELETE: &str = "entity_delete";
    pub const STATUS_CHANGE: &str = "status_change";
    pub const CONFIG_CHANGE: &str = "config_change";
    pub const SYSTEM: &str = "system";
}

/// Fields that are redacted from audit details before storage.
pub const SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "token",
    "secret",
    "api_key",
    "authorization",
    "credential",
];

/// Redact sensitive fields from a JSON value, recursively.
///
/// Any object key containing one of [`SENSITIVE_FIELDS`] (case-insensitive)
/// has its value replaced with `"[REDACTED]"`.
pub fn redact_sensitive_fields(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut redacted = serde_json::Map::new();
            for (key, val) in map {
                let lower_key = key.to_lowercase();
                if SENSITIVE_FIELDS.iter().any(|f| lower_key.contains(f)) {
                    redacted.insert(
                        key.clone(),
                        serde_json::Value::String("[REDACTED]".to_string()),
                    );
                } else {
                    redacted.insert(key.clone(), redact_sensitive_fields(val));
                }
            }
            serde_json::Value::Object(redacted)
        }
        serde_json::Value::Array(arr) => {
            serde_json::Value::Array(arr.iter().map(redact_sensitive_fields).collect())
        }
        other => other.clone(),
    }
}

/// Map a dot-separated event type to the audit action recorded for it.
///
/// `user.created` → `entity_create`, `request.status_changed` →
/// `status_change`, and so on. Unknown suffixes are recorded as-is.
pub fn action_for_event(event_type: &str) -> &str {
    let verb = event_type.rsplit('.').next().unwrap_or(event_type);
    match verb {
        "created" => action_types::ENTITY_CREATE,
        "updated" | "assigned" | "published" | "archived" | "activated" => {
            action_types::ENTITY_UPDATE
        }
        "deleted" | "deactivated" => action_types::ENTITY_DELETE,
        "status_changed" => action_types::STATUS_CHANGE,
        "logged_in" => action_types::LOGIN,
        "login_failed" => action_types::LOGIN_FAILED,
        "logged_out" => action_types::LOGOUT,
        "password_changed" => action_types::PASSWORD_CHANGE,
        "password_reset" => action_types::PASSWORD_RESET,
        "config_changed" => action_types::CONFIG_CHANGE,
        _ => verb,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn redacts_nested_sensitive_keys() {
        let input = json!({
            "username": "jdoe",
            "password": "hunter22",
            "smtp": { "host": "mail", "smtp_password": "x" },
            "items": [{ "refresh_token": "abc", "ok": 1 }]
        });
        let out = redact_sensitive_fields(&input);
        assert_eq!(out["username"], "jdoe");
        assert_eq!(out["password"], "[REDACTED]");
        assert_eq!(out["smtp"]["host"], "mail");
        assert_eq!(out["smtp"]["smtp_password"], "[REDACTED]");
        assert_eq!(out["items"][0]["refresh_token"], "[REDACTED]");
        assert_eq!(out["items"][0]["ok"], 1);
    }

    #[test]
    fn redaction_is_case_insensitive() {
        let out = redact_sensitive_fields(&json!({ "Authorization": "Bearer x" }));
        assert_eq!(out["Authorization"], "[REDACTED]");
    }

    #[test]
    fn scalars_pass_through() {
        assert_eq!(redact_sensitive_fields(&json!(5)), json!(5));
    }

    #[test]
    fn event_actions() {
        assert_eq!(action_for_event("user.created"), action_types::ENTITY_CREATE);
        assert_eq!(action_for_event("request.status_changed"), action_types::STATUS_CHANGE);
        assert_eq!(action_for_event("auth.logged_in"), action_types::LOGIN);
        assert_eq!(action_for_event("area.deleted"), action_types::ENTITY_DELETE);
        assert_eq!(action_for_event("smtp.tested"), "tested");
    }
}
