//! Notification delivery.
//!
//! The monitor hands every alert to a [`Notifier`]. Two implementations are
//! provided:
//!
//! - [`EmailNotifier`]: SMTP with STARTTLS and login credentials
//! - [`LogNotifier`]: writes the alert to the log only, used when email
//!   notifications are disabled
//!
//! [`message`] builds the subject and body text for each alert kind.

mod email;
mod log;
pub mod message;

pub use email::{EmailConfig, EmailNotifier};
pub use log::LogNotifier;
pub use message::{AlertMessage, MessageContext};

use async_trait::async_trait;

use crate::error::NotifyError;

/// Something that can deliver a message to a list of recipients.
///
/// Sends may block on the network; the monitor bounds each call with its
/// configured send timeout.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message.
    async fn send(
        &self,
        subject: &str,
        body: &str,
        recipients: &[String],
    ) -> Result<(), NotifyError>;

    /// Short name for log lines ("email", "log", ...).
    fn name(&self) -> &'static str;
}

#[async_trait]
impl<N: Notifier + ?Sized> Notifier for Box<N> {
    async fn send(
        &self,
        subject: &str,
        body: &str,
        recipients: &[String],
    ) -> Result<(), NotifyError> {
        (**self).send(subject, body, recipients).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

#[async_trait]
impl<N: Notifier + ?Sized> Notifier for std::sync::Arc<N> {
    async fn send(
        &self,
        subject: &str,
        body: &str,
        recipients: &[String],
    ) -> Result<(), NotifyError> {
        (**self).send(subject, body, recipients).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
