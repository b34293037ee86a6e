//! Email delivery via SMTP.
//!
//! [`EmailNotifier`] wraps the `lettre` async SMTP transport: STARTTLS on the
//! configured port, login with the sender address and password. A new
//! connection is opened per message; alerts are rare.

use std::fmt;

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde::{Deserialize, Serialize, Serializer};

use super::Notifier;
use crate::error::NotifyError;

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

const DEFAULT_SMTP_SERVER: &str = "smtp.gmail.com";

/// The `[email]` settings section.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EmailConfig {
    /// Send real emails. When false alerts are only logged.
    pub enabled: bool,
    pub smtp_server: String,
    pub smtp_port: u16,
    /// Sender address, also used as the SMTP login.
    pub from: String,
    /// SMTP password (for Gmail, an app password).
    #[serde(serialize_with = "redact")]
    pub password: String,
    pub to: Vec<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            smtp_server: DEFAULT_SMTP_SERVER.to_string(),
            smtp_port: DEFAULT_SMTP_PORT,
            from: String::new(),
            password: String::new(),
            to: Vec::new(),
        }
    }
}

impl EmailConfig {
    /// Names of the required fields that are empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        self.missing_fields_for(&self.to)
    }

    /// Like [`missing_fields`](Self::missing_fields), checking `recipients`
    /// in place of the configured `to` list.
    pub fn missing_fields_for(&self, recipients: &[String]) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.from.trim().is_empty() {
            missing.push("from");
        }
        if self.password.is_empty() {
            missing.push("password");
        }
        if recipients.iter().all(|r| r.trim().is_empty()) {
            missing.push("to");
        }
        missing
    }
}

impl fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailConfig")
            .field("enabled", &self.enabled)
            .field("smtp_server", &self.smtp_server)
            .field("smtp_port", &self.smtp_port)
            .field("from", &self.from)
            .field("password", &"<redacted>")
            .field("to", &self.to)
            .finish()
    }
}

fn redact<S: Serializer>(password: &str, serializer: S) -> Result<S::Ok, S::Error> {
    if password.is_empty() {
        serializer.serialize_str("")
    } else {
        serializer.serialize_str("********")
    }
}

/// Sends alerts as plain-text emails.
#[derive(Debug, Clone)]
pub struct EmailNotifier {
    config: EmailConfig,
}

impl EmailNotifier {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EmailConfig {
        &self.config
    }

    fn build_message(
        &self,
        subject: &str,
        body: &str,
        recipients: &[String],
    ) -> Result<Message, NotifyError> {
        let missing = self.config.missing_fields_for(recipients);
        if !missing.is_empty() {
            return Err(NotifyError::ConfigIncomplete(format!(
                "missing {}",
                missing.join(", ")
            )));
        }

        let from: Mailbox = self.config.from.trim().parse()?;
        let mut builder = Message::builder()
            .from(from)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN);
        for recipient in recipients.iter().map(|r| r.trim()).filter(|r| !r.is_empty()) {
            builder = builder.to(recipient.parse()?);
        }

        builder
            .body(body.to_string())
            .map_err(|e| NotifyError::ConfigIncomplete(e.to_string()))
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn send(
        &self,
        subject: &str,
        body: &str,
        recipients: &[String],
    ) -> Result<(), NotifyError> {
        let email = self.build_message(subject, body, recipients)?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_server)?
            .port(self.config.smtp_port)
            .credentials(Credentials::new(
                self.config.from.trim().to_string(),
                self.config.password.clone(),
            ))
            .build();

        mailer.send(email).await?;

        tracing::info!(
            subject,
            server = %self.config.smtp_server,
            recipients = recipients.len(),
            "Email notification sent"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "email"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_config() -> EmailConfig {
        EmailConfig {
            from: "monitor@example.com".to_string(),
            password: "app-password".to_string(),
            to: vec!["owner@example.com".to_string()],
            ..EmailConfig::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = EmailConfig::default();
        assert!(config.enabled);
        assert_eq!(config.smtp_server, "smtp.gmail.com");
        assert_eq!(config.smtp_port, 587);
        assert_eq!(config.missing_fields(), vec!["from", "password", "to"]);
    }

    #[test]
    fn test_complete_config_has_no_missing_fields() {
        assert!(complete_config().missing_fields().is_empty());
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", complete_config());
        assert!(!rendered.contains("app-password"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_serialize_redacts_password() {
        let json = serde_json::to_value(complete_config()).unwrap();
        assert_eq!(json["password"], "********");
        assert_eq!(json["from"], "monitor@example.com");
    }

    #[test]
    fn test_build_message_multiple_recipients() {
        let notifier = EmailNotifier::new(complete_config());
        let recipients = vec!["a@example.com".to_string(), "b@example.com".to_string()];
        let message = notifier.build_message("Subject", "Body", &recipients).unwrap();

        let to = message.headers().get_raw("To").unwrap();
        assert!(to.contains("a@example.com"));
        assert!(to.contains("b@example.com"));
    }

    #[tokio::test]
    async fn test_send_without_credentials_is_config_incomplete() {
        let notifier = EmailNotifier::new(EmailConfig::default());
        let err = notifier
            .send("Subject", "Body", &["owner@example.com".to_string()])
            .await
            .unwrap_err();

        match err {
            NotifyError::ConfigIncomplete(msg) => {
                assert!(msg.contains("from"));
                assert!(msg.contains("password"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_fields_for_checks_given_recipients() {
        let config = complete_config();
        assert_eq!(config.missing_fields_for(&[]), vec!["to"]);
        assert_eq!(config.missing_fields_for(&["  ".to_string()]), vec!["to"]);

        let no_password = EmailConfig {
            password: String::new(),
            to: Vec::new(),
            ..complete_config()
        };
        assert_eq!(
            no_password.missing_fields_for(&["a@example.com".to_string()]),
            vec!["password"]
        );
    }

    #[tokio::test]
    async fn test_send_without_recipients_is_config_incomplete() {
        let notifier = EmailNotifier::new(complete_config());
        let err = notifier.send("Subject", "Body", &[]).await.unwrap_err();
        match err {
            NotifyError::ConfigIncomplete(msg) => assert_eq!(msg, "missing to"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_send_with_bad_address_is_config_incomplete() {
        let notifier = EmailNotifier::new(complete_config());
        let err = notifier
            .send("Subject", "Body", &["not-an-email".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::ConfigIncomplete(_)));
    }
}
