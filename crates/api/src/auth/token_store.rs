//! Short-lived auth state: revoked access-token ids and rate-limit counters.
//!
//! [`RedisTokenStore`] is used when `REDIS_URL` is configured; otherwise the
//! process-local [`MemoryTokenStore`] is used. Redis failures never reject a
//! request: a token is then treated as not revoked and a counter as under
//! its limit, and the failure is logged at `warn`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::Mutex;

const REVOKED_PREFIX: &str = "medialab:revoked:";
const RATE_PREFIX: &str = "medialab:rate:";

/// Outcome of counting one hit against a fixed-window limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u64 },
    Limited { retry_after_secs: u64 },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Mark `jti` revoked for `ttl`.
    async fn revoke(&self, jti: &str, ttl: Duration);

    /// Whether `jti` has been revoked and the revocation has not expired.
    async fn is_revoked(&self, jti: &str) -> bool;

    /// Count one hit on `key` within a fixed window of `window`.
    async fn hit(&self, key: &str, limit: u64, window: Duration) -> RateDecision;
}

// ---------------------------------------------------------------------------
// Redis
// ---------------------------------------------------------------------------

/// Unwrap a Redis result, substituting the permissive `fallback` on error.
fn or_allow<T>(result: Result<T, redis::RedisError>, fallback: T, operation: &str) -> T {
    result.unwrap_or_else(|e| {
        tracing::warn!(error = %e, operation, "Redis unavailable, allowing request");
        fallback
    })
}

pub struct RedisTokenStore {
    conn: ConnectionManager,
}

impl RedisTokenStore {
    /// Connect to Redis. The connection manager reconnects on its own after
    /// this initial connection succeeds.
    pub async fn connect(redis_url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    async fn try_hit(
        &self,
        key: &str,
        limit: u64,
        window: Duration,
    ) -> Result<RateDecision, redis::RedisError> {
        let redis_key = format!("{RATE_PREFIX}{key}");
        let mut conn = self.conn.clone();

        let count: u64 = conn.incr(&redis_key, 1).await?;
        if count == 1 {
            conn.expire::<_, ()>(&redis_key, window.as_secs().max(1) as i64)
                .await?;
        }

        if count <= limit {
            return Ok(RateDecision::Allowed {
                remaining: limit - count,
            });
        }
        let ttl: i64 = conn.ttl(&redis_key).await?;
        Ok(RateDecision::Limited {
            retry_after_secs: u64::try_from(ttl).unwrap_or(0).max(1),
        })
    }
}

#[async_trait]
impl TokenStore for RedisTokenStore {
    async fn revoke(&self, jti: &str, ttl: Duration) {
        let mut conn = self.conn.clone();
        let key = format!("{REVOKED_PREFIX}{jti}");
        if let Err(e) = conn
            .set_ex::<_, _, ()>(&key, 1, ttl.as_secs().max(1))
            .await
        {
            tracing::warn!(error = %e, jti, "Failed to record revoked token in Redis");
        }
    }

    async fn is_revoked(&self, jti: &str) -> bool {
        let mut conn = self.conn.clone();
        let key = format!("{REVOKED_PREFIX}{jti}");
        or_allow(conn.exists::<_, bool>(&key).await, false, "revocation check")
    }

    async fn hit(&self, key: &str, limit: u64, window: Duration) -> RateDecision {
        or_allow(
            self.try_hit(key, limit, window).await,
            RateDecision::Allowed { remaining: limit },
            "rate limit check",
        )
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MemoryState {
    revoked: HashMap<String, Instant>,
    /// key -> (window start, window length, hits)
    windows: HashMap<String, (Instant, Duration, u64)>,
}

/// Process-local store for single-instance deployments and tests.
#[derive(Default)]
pub struct MemoryTokenStore {
    state: Mutex<MemoryState>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn revoke(&self, jti: &str, ttl: Duration) {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        state.revoked.retain(|_, until| *until > now);
        state.revoked.insert(jti.to_string(), now + ttl);
    }

    async fn is_revoked(&self, jti: &str) -> bool {
        let state = self.state.lock().await;
        state
            .revoked
            .get(jti)
            .is_some_and(|until| *until > Instant::now())
    }

    async fn hit(&self, key: &str, limit: u64, window: Duration) -> RateDecision {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        state
            .windows
            .retain(|_, (started, length, _)| now < *started + *length);

        let entry = state
            .windows
            .entry(key.to_string())
            .or_insert((now, window, 0));
        entry.2 += 1;
        let (started, length, count) = *entry;

        if count <= limit {
            RateDecision::Allowed {
                remaining: limit - count,
            }
        } else {
            let left = (started + length).saturating_duration_since(now);
            RateDecision::Limited {
                retry_after_secs: left.as_secs().max(1),
            }
        }
    }
}
