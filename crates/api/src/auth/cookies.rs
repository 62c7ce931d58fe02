//! `access_token` / `refresh_token` cookie helpers.

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Refresh cookies are only sent to the auth endpoints.
const REFRESH_COOKIE_PATH: &str = "/api/v1/auth";

/// Read a cookie value from the request headers.
pub fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| k.trim() == name)
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn build_cookie(name: &str, value: &str, path: &str, max_age_secs: i64, secure: bool) -> String {
    let secure_attr = if secure { "; Secure" } else { "" };
    format!(
        "{name}={value}; HttpOnly{secure_attr}; Path={path}; Max-Age={}; SameSite=Lax",
        max_age_secs.max(0)
    )
}

fn append(headers: &mut HeaderMap, cookie: String) {
    // Token values are base64url / uuid text, always a valid header value.
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        headers.append(SET_COOKIE, value);
    }
}

/// `Set-Cookie` headers carrying both tokens.
pub fn auth_cookies(
    access_token: &str,
    access_max_age_secs: i64,
    refresh_token: &str,
    refresh_max_age_secs: i64,
    secure: bool,
) -> HeaderMap {
    let mut headers = HeaderMap::new();
    append(
        &mut headers,
        build_cookie(ACCESS_COOKIE, access_token, "/", access_max_age_secs, secure),
    );
    append(
        &mut headers,
        build_cookie(
            REFRESH_COOKIE,
            refresh_token,
            REFRESH_COOKIE_PATH,
            refresh_max_age_secs,
            secure,
        ),
    );
    headers
}

/// `Set-Cookie` headers that expire both tokens.
pub fn clear_auth_cookies(secure: bool) -> HeaderMap {
    let mut headers = HeaderMap::new();
    append(&mut headers, build_cookie(ACCESS_COOKIE, "", "/", 0, secure));
    append(
        &mut headers,
        build_cookie(REFRESH_COOKIE, "", REFRESH_COOKIE_PATH, 0, secure),
    );
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; access_token=abc.def; other=1"),
        );
        assert_eq!(get_cookie(&headers, ACCESS_COOKIE).as_deref(), Some("abc.def"));
        assert_eq!(get_cookie(&headers, REFRESH_COOKIE), None);
    }

    #[test]
    fn empty_cookie_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("access_token="));
        assert_eq!(get_cookie(&headers, ACCESS_COOKIE), None);
    }

    #[test]
    fn auth_cookies_are_http_only() {
        let headers = auth_cookies("a", 1800, "r", 604800, true);
        let values: Vec<&str> = headers
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(values.len(), 2);
        assert!(values[0].starts_with("access_token=a; HttpOnly; Secure; Path=/;"));
        assert!(values[1].contains("Path=/api/v1/auth"));
        assert!(values[1].contains("Max-Age=604800"));
    }

    #[test]
    fn cleared_cookies_expire_immediately() {
        let headers = clear_auth_cookies(false);
        for value in headers.get_all(SET_COOKIE) {
            let value = value.to_str().unwrap();
            assert!(value.contains("Max-Age=0"));
            assert!(!value.contains("Secure"));
        }
    }
}
