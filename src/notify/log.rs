use async_trait::async_trait;

use super::Notifier;
use crate::error::NotifyError;

/// Notifier used when email is switched off: the alert goes to the log.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(
        &self,
        subject: &str,
        body: &str,
        recipients: &[String],
    ) -> Result<(), NotifyError> {
        tracing::info!(
            subject,
            recipients = recipients.len(),
            "Email notifications disabled, skipping email"
        );
        tracing::debug!(body, "Suppressed notification body");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
