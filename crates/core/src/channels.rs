//! WebSocket room naming.
//!
//! Rooms are plain strings so they can be logged and sent over the wire
//! unchanged. Authenticated connections join [`ROOM_GLOBAL`], their own
//! [`user_room`] and their [`role_room`] automatically.

use crate::types::DbId;

/// Room every authenticated connection belongs to.
pub const ROOM_GLOBAL: &str = "global";

/// Maximum room name length accepted from clients.
pub const ROOM_MAX_LEN: usize = 100;

/// Personal room for a single user.
pub fn user_room(user_id: DbId) -> String {
    format!("user:{user_id}")
}

/// Room shared by every user holding `role`.
pub fn role_room(role: &str) -> String {
    format!("role:{role}")
}

/// Room shared by every member of a department.
pub fn department_room(department_id: DbId) -> String {
    format!("department:{department_id}")
}

/// Extract the user id from a `user:{id}` room name.
pub fn parse_user_room(room: &str) -> Option<DbId> {
    room.strip_prefix("user:")?.parse().ok()
}

/// Validate a room name supplied by a client.
///
/// Accepts `global`, `user:{id}`, `department:{id}`, `role:{name}` and
/// free-form `topic:{name}` rooms made of alphanumerics, `_` and `-`.
pub fn is_valid_room(room: &str) -> bool {
    if room.is_empty() || room.len() > ROOM_MAX_LEN {
        return false;
    }
    if room == ROOM_GLOBAL {
        return true;
    }
    let Some((prefix, rest)) = room.split_once(':') else {
        return false;
    };
    if rest.is_empty() {
        return false;
    }
    match prefix {
        "user" | "department" => rest.parse::<DbId>().is_ok_and(|id| id > 0),
        "role" | "topic" => rest
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_builders() {
        assert_eq!(user_room(7), "user:7");
        assert_eq!(role_room("admin"), "role:admin");
        assert_eq!(department_room(3), "department:3");
    }

    #[test]
    fn parse_user_room_extracts_id() {
        assert_eq!(parse_user_room("user:42"), Some(42));
        assert_eq!(parse_user_room("user:abc"), None);
        assert_eq!(parse_user_room("role:admin"), None);
    }

    #[test]
    fn valid_rooms() {
        assert!(is_valid_room("global"));
        assert!(is_valid_room("user:1"));
        assert!(is_valid_room("department:12"));
        assert!(is_valid_room("role:coordinator"));
        assert!(is_valid_room("topic:spring-gallery"));
    }

    #[test]
    fn invalid_rooms() {
        assert!(!is_valid_room(""));
        assert!(!is_valid_room("user:"));
        assert!(!is_valid_room("user:-1"));
        assert!(!is_valid_room("topic:has space"));
        assert!(!is_valid_room("lobby"));
        assert!(!is_valid_room("unknown:1"));
        assert!(!is_valid_room(&format!("topic:{}", "a".repeat(120))));
    }
}
