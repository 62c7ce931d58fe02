//! Email delivery via SMTP.
//!
//! [`EmailDelivery`] wraps the `lettre` async SMTP transport to send rendered
//! [`RenderedEmail`]s as multipart plain-text + HTML messages. Its
//! [`EmailConfig`] comes from the active `smtp_configs` row when one exists,
//! otherwise from `SMTP_*` environment variables.

use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use medialab_core::crypto::{decrypt_secret, CryptoError};
use medialab_db::models::smtp::SmtpConfig;
use medialab_db::repositories::SmtpConfigRepo;
use medialab_db::DbPool;

use crate::templates::RenderedEmail;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),

    /// The stored SMTP password could not be decrypted.
    #[error("SMTP password decryption failed: {0}")]
    Secret(#[from] CryptoError),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@medialab.local";

/// Configuration for the SMTP email delivery service.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (defaults to 587).
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    /// Display name for the "From" header.
    pub from_name: Option<String>,
    /// Optional SMTP username.
    pub smtp_user: Option<String>,
    /// Optional SMTP password (plaintext, decrypted).
    pub smtp_password: Option<String>,
    /// Upgrade the connection with STARTTLS. Plain SMTP otherwise.
    pub use_starttls: bool,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set, signalling that email
    /// delivery is not configured and should be skipped.
    ///
    /// | Variable        | Required | Default                    |
    /// |-----------------|----------|----------------------------|
    /// | `SMTP_HOST`     | yes      | -                          |
    /// | `SMTP_PORT`     | no       | `587`                      |
    /// | `SMTP_FROM`     | no       | `noreply@medialab.local`   |
    /// | `SMTP_USER`     | no       | -                          |
    /// | `SMTP_PASSWORD` | no       | -                          |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            from_name: None,
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
            use_starttls: true,
        })
    }

    /// Build from a stored row, decrypting its password with `secret`.
    pub fn from_row(row: &SmtpConfig, secret: &str) -> Result<Self, EmailError> {
        let smtp_password = row
            .password_encrypted
            .as_deref()
            .map(|sealed| decrypt_secret(secret, sealed))
            .transpose()?;
        Ok(Self {
            smtp_host: row.host.clone(),
            smtp_port: u16::try_from(row.port).unwrap_or(DEFAULT_SMTP_PORT),
            from_address: row.from_address.clone(),
            from_name: row.from_name.clone(),
            smtp_user: row.username.clone(),
            smtp_password,
            use_starttls: row.use_starttls,
        })
    }

    /// Resolve the configuration to send with: the active row, else env.
    ///
    /// Database and decryption errors are logged and fall through to the
    /// environment fallback.
    pub async fn resolve(pool: &DbPool, secret: &str) -> Option<Self> {
        match SmtpConfigRepo::find_active(pool).await {
            Ok(Some(row)) => match Self::from_row(&row, secret) {
                Ok(config) => return Some(config),
                Err(e) => {
                    tracing::warn!(error = %e, smtp_config_id = row.id, "Active SMTP config unusable");
                }
            },
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Failed to load active SMTP config"),
        }
        Self::from_env()
    }

    fn from_mailbox(&self) -> Result<Mailbox, EmailError> {
        Ok(Mailbox::new(self.from_name.clone(), self.from_address.parse()?))
    }
}

// ---------------------------------------------------------------------------
// EmailDelivery
// ---------------------------------------------------------------------------

/// Sends rendered emails via SMTP.
pub struct EmailDelivery {
    config: EmailConfig,
}

impl EmailDelivery {
    /// Create a new email delivery service with the given configuration.
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EmailConfig {
        &self.config
    }

    /// Assemble the MIME message without sending it.
    pub fn build_message(
        &self,
        to_email: &str,
        email: &RenderedEmail,
    ) -> Result<Message, EmailError> {
        Message::builder()
            .from(self.config.from_mailbox()?)
            .to(Mailbox::new(None, to_email.parse()?))
            .subject(email.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                email.text.clone(),
                email.html.clone(),
            ))
            .map_err(|e| EmailError::Build(e.to_string()))
    }

    /// Send `email` to `to_email`.
    pub async fn send(&self, to_email: &str, email: &RenderedEmail) -> Result<(), EmailError> {
        let message = self.build_message(to_email, email)?;

        let mut transport_builder = if self.config.use_starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.config.smtp_host)
        }
        .port(self.config.smtp_port);

        if let (Some(user), Some(pass)) = (&self.config.smtp_user, &self.config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let mailer = transport_builder.build();
        mailer.send(message).await?;

        tracing::info!(to = to_email, subject = %email.subject, "Email sent");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use medialab_core::crypto::encrypt_secret;

    fn row(password_encrypted: Option<String>) -> SmtpConfig {
        SmtpConfig {
            id: 1,
            name: "primary".to_string(),
            host: "smtp.example.com".to_string(),
            port: 2525,
            username: Some("mailer".to_string()),
            password_encrypted,
            from_address: "lab@example.com".to_string(),
            from_name: Some("Media Lab".to_string()),
            use_starttls: false,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn rendered() -> RenderedEmail {
        RenderedEmail {
            subject: "Hello".to_string(),
            text: "plain".to_string(),
            html: "<p>html</p>".to_string(),
        }
    }

    #[test]
    fn from_row_decrypts_password() {
        let sealed = encrypt_secret("key", "pw").unwrap();
        let config = EmailConfig::from_row(&row(Some(sealed)), "key").unwrap();
        assert_eq!(config.smtp_port, 2525);
        assert_eq!(config.smtp_password.as_deref(), Some("pw"));
        assert!(!config.use_starttls);
    }

    #[test]
    fn from_row_with_wrong_key_fails() {
        let sealed = encrypt_secret("key", "pw").unwrap();
        assert!(matches!(
            EmailConfig::from_row(&row(Some(sealed)), "other"),
            Err(EmailError::Secret(_))
        ));
    }

    #[test]
    fn build_message_sets_headers() {
        let config = EmailConfig::from_row(&row(None), "key").unwrap();
        let delivery = EmailDelivery::new(config);
        let message = delivery.build_message("ana@example.com", &rendered()).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Hello"));
        assert!(raw.contains("ana@example.com"));
        assert!(raw.contains("multipart/alternative"));
    }

    #[test]
    fn build_message_rejects_bad_recipient() {
        let delivery = EmailDelivery::new(EmailConfig::from_row(&row(None), "key").unwrap());
        assert!(matches!(
            delivery.build_message("not-an-email", &rendered()),
            Err(EmailError::Address(_))
        ));
    }

    #[test]
    fn email_error_display_build() {
        let err = EmailError::Build("missing body".to_string());
        assert_eq!(err.to_string(), "Email build error: missing body");
    }
}
