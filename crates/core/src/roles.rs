//! Well-known role name constants.
//!
//! These must match the seed data in `20260301000002_create_roles_permissions.sql`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_COORDINATOR: &str = "coordinator";
pub const ROLE_MEMBER: &str = "member";

/// Roles that ship with the system and cannot be deleted or renamed.
pub const BUILTIN_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_COORDINATOR, ROLE_MEMBER];

/// Whether `name` is one of the seeded roles.
pub fn is_builtin_role(name: &str) -> bool {
    BUILTIN_ROLES.contains(&name)
}
