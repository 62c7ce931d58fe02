//! Fire-and-forget email sending for request handlers.

use medialab_db::DbPool;
use medialab_events::{EmailConfig, EmailDelivery, RenderedEmail};

/// Resolve the SMTP configuration and send `email` to `to`.
///
/// Returns `false` when no configuration is available or sending fails;
/// both cases are logged.
pub async fn send(pool: &DbPool, secret: &str, to: &str, email: &RenderedEmail) -> bool {
    let Some(config) = EmailConfig::resolve(pool, secret).await else {
        tracing::debug!(to, subject = %email.subject, "No SMTP configuration, email skipped");
        return false;
    };
    match EmailDelivery::new(config).send(to, email).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = %e, to, subject = %email.subject, "Failed to send email");
            false
        }
    }
}

/// Send in a background task so the caller never waits on SMTP.
pub fn spawn_send(pool: DbPool, secret: String, to: String, email: RenderedEmail) {
    tokio::spawn(async move {
        send(&pool, &secret, &to, &email).await;
    });
}
