//! Permission codes and the matching rule used by the RBAC layer.
//!
//! Codes are `resource.action` strings stored in the `permissions` table and
//! attached to roles through `role_permissions`. A granted code may also be a
//! wildcard: `resource.*` covers every action on a resource and `*` covers
//! everything.

pub const USERS_READ: &str = "users.read";
pub const USERS_WRITE: &str = "users.write";
pub const ROLES_READ: &str = "roles.read";
pub const ROLES_WRITE: &str = "roles.write";
pub const ORG_READ: &str = "org.read";
pub const ORG_WRITE: &str = "org.write";
pub const REQUESTS_READ: &str = "requests.read";
pub const REQUESTS_MANAGE: &str = "requests.manage";
pub const PROJECTS_READ: &str = "projects.read";
pub const PROJECTS_WRITE: &str = "projects.write";
pub const CONTENT_WRITE: &str = "content.write";
pub const SMTP_MANAGE: &str = "smtp.manage";
pub const AUDIT_READ: &str = "audit.read";

/// Grants every permission.
pub const WILDCARD: &str = "*";

/// Every concrete permission code known to the system.
pub const ALL_PERMISSIONS: &[&str] = &[
    USERS_READ,
    USERS_WRITE,
    ROLES_READ,
    ROLES_WRITE,
    ORG_READ,
    ORG_WRITE,
    REQUESTS_READ,
    REQUESTS_MANAGE,
    PROJECTS_READ,
    PROJECTS_WRITE,
    CONTENT_WRITE,
    SMTP_MANAGE,
    AUDIT_READ,
];

/// Check whether a single granted code covers the required one.
fn grant_covers(granted: &str, required: &str) -> bool {
    if granted == WILDCARD || granted == required {
        return true;
    }
    match granted.strip_suffix(".*") {
        Some(resource) => required
            .split_once('.')
            .is_some_and(|(req_resource, _)| req_resource == resource),
        None => false,
    }
}

/// Return `true` when any of the `granted` codes covers `required`.
pub fn has_permission<S: AsRef<str>>(granted: &[S], required: &str) -> bool {
    granted.iter().any(|g| grant_covers(g.as_ref(), required))
}

/// Validate a permission code supplied by a client.
///
/// Accepts known concrete codes, `resource.*` for a known resource, and `*`.
pub fn validate_permission_code(code: &str) -> Result<(), String> {
    if code == WILDCARD || ALL_PERMISSIONS.contains(&code) {
        return Ok(());
    }
    if let Some(resource) = code.strip_suffix(".*") {
        let known = ALL_PERMISSIONS
            .iter()
            .any(|p| p.split_once('.').is_some_and(|(r, _)| r == resource));
        if known {
            return Ok(());
        }
    }
    Err(format!("Unknown permission code '{code}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_code_matches() {
        assert!(has_permission(&["users.read"], USERS_READ));
        assert!(!has_permission(&["users.read"], USERS_WRITE));
    }

    #[test]
    fn resource_wildcard_matches_same_resource_only() {
        let granted = vec!["org.*".to_string()];
        assert!(has_permission(&granted, ORG_READ));
        assert!(has_permission(&granted, ORG_WRITE));
        assert!(!has_permission(&granted, USERS_READ));
    }

    #[test]
    fn resource_wildcard_does_not_match_prefix_collisions() {
        // "org.*" must not grant "organisation.read".
        assert!(!has_permission(&["org.*"], "organisation.read"));
    }

    #[test]
    fn global_wildcard_matches_everything() {
        for code in ALL_PERMISSIONS {
            assert!(has_permission(&[WILDCARD], code));
        }
    }

    #[test]
    fn empty_grants_match_nothing() {
        let granted: Vec<String> = Vec::new();
        assert!(!has_permission(&granted, CONTENT_WRITE));
    }

    #[test]
    fn validate_known_and_wildcard_codes() {
        assert!(validate_permission_code(SMTP_MANAGE).is_ok());
        assert!(validate_permission_code("content.*").is_ok());
        assert!(validate_permission_code("*").is_ok());
    }

    #[test]
    fn validate_rejects_unknown_codes() {
        assert!(validate_permission_code("bogus.read").is_err());
        assert!(validate_permission_code("bogus.*").is_err());
        assert!(validate_permission_code("").is_err());
    }
}
