//! Fixed-window rate limiting backed by the [`TokenStore`](crate::auth::token_store::TokenStore).
//!
//! Two limiters exist: a global per-IP limit applied to every `/api/v1`
//! request, and a per-IP-and-username limit checked by the login handler.

use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::{ConnectInfo, FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use medialab_core::error::CoreError;

use crate::auth::token_store::RateDecision;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

/// Best-effort client address: first `X-Forwarded-For` hop, then
/// `X-Real-IP`, then the socket peer address.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded
        .or(real_ip)
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
}

/// Extractor for the caller's address as resolved by [`client_ip`].
#[derive(Debug, Clone)]
pub struct ClientIp(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(ClientIp(client_ip(&parts.headers, peer)))
    }
}

fn decision_to_result(decision: RateDecision) -> AppResult<u64> {
    match decision {
        RateDecision::Allowed { remaining } => Ok(remaining),
        RateDecision::Limited { retry_after_secs } => {
            Err(AppError::Core(CoreError::RateLimited { retry_after_secs }))
        }
    }
}

/// Global per-IP limiter, installed with `axum::middleware::from_fn_with_state`.
pub async fn api_rate_limit(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    req: Request,
    next: Next,
) -> Response {
    let limits = state.config.rate_limits;
    let key = format!("api:{}", ip.as_deref().unwrap_or("unknown"));
    let decision = state
        .token_store
        .hit(&key, limits.api_limit, Duration::from_secs(limits.api_window_secs))
        .await;

    match decision_to_result(decision) {
        Ok(remaining) => {
            let mut response = next.run(req).await;
            response
                .headers_mut()
                .insert(RATE_LIMIT_REMAINING, HeaderValue::from(remaining));
            response
        }
        Err(err) => {
            tracing::warn!(ip = ?ip, "API rate limit exceeded");
            err.into_response()
        }
    }
}

/// Count a login attempt for `ip` + `username`; 429 once over the limit.
pub async fn check_login_rate(state: &AppState, ip: Option<&str>, username: &str) -> AppResult<()> {
    let limits = state.config.rate_limits;
    let key = format!(
        "login:{}:{}",
        ip.unwrap_or("unknown"),
        username.to_lowercase()
    );
    let decision = state
        .token_store
        .hit(
            &key,
            limits.login_limit,
            Duration::from_secs(limits.login_window_secs),
        )
        .await;
    decision_to_result(decision).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwarded_for_takes_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers, None).as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn falls_back_to_peer_address() {
        let peer: SocketAddr = "192.0.2.4:5555".parse().unwrap();
        assert_eq!(
            client_ip(&HeaderMap::new(), Some(peer)).as_deref(),
            Some("192.0.2.4")
        );
        assert_eq!(client_ip(&HeaderMap::new(), None), None);
    }

    #[test]
    fn limited_decision_maps_to_rate_limited_error() {
        let err = decision_to_result(RateDecision::Limited {
            retry_after_secs: 12,
        })
        .unwrap_err();
        assert!(matches!(
            err,
            AppError::Core(CoreError::RateLimited { retry_after_secs: 12 })
        ));
    }
}
